//! # Synchronization Primitives
//!
//! The kernel's only synchronization primitive: a scoped region that is
//! indivisible with respect to the interrupt context. There are no locks.
//! Interrupt-shared fields are atomics; the critical section is used
//! exactly twice per main-loop iteration, around the millisecond snapshot
//! and around the button grab-and-clear.
//!
//! On Cortex-M the implementation comes from `cortex-m`'s
//! `critical-section-single-core` feature (PRIMASK save, `cpsid i`,
//! restore). Host test builds link the `critical-section` `std` impl.

/// Execute a closure with interrupts masked.
///
/// Keep the closure to a handful of loads and stores: while it runs the
/// infrared receiver is not serviced, and a missed service call can
/// corrupt a frame in flight.
///
/// # Usage
/// ```ignore
/// let now = sync::critical_section(|_cs| millis.load(Ordering::Relaxed));
/// ```
#[inline]
pub fn critical_section<F, R>(f: F) -> R
where
    F: FnOnce(critical_section::CriticalSection<'_>) -> R,
{
    critical_section::with(f)
}
