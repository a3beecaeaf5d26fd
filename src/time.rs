//! # Time Base
//!
//! Turns the fixed-period hardware tick into a monotonic millisecond
//! counter, and hands the main loop a torn-read-free snapshot of it.
//!
//! ```text
//!  interrupt context                    main context
//!  ─────────────────                    ────────────
//!  TickAccumulator::accumulate(256)
//!    └─► crossed 1000 µs? ──► Clock::advance()
//!                                       Clock::snapshot()  (once per loop)
//! ```
//!
//! The accumulator subtracts exactly one millisecond each time the
//! threshold is crossed, so the sub-millisecond remainder carries over
//! and integer truncation never drifts the clock.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::config::MICROS_PER_MILLI;
use crate::sync;

/// Milliseconds since boot. Wraps after ~49.7 days.
pub type Millis = u32;

/// Returns `true` once `now` has reached or passed `deadline`, treating
/// both as points on a wrapping `u32` circle.
#[inline]
pub fn has_reached(now: Millis, deadline: Millis) -> bool {
    (now.wrapping_sub(deadline) as i32) >= 0
}

/// Millisecond counter shared between the tick interrupt (sole writer)
/// and the main loop (reader).
pub struct Clock {
    millis: AtomicU32,
}

impl Clock {
    pub const fn new() -> Self {
        Self {
            millis: AtomicU32::new(0),
        }
    }

    /// Advance by one millisecond. Interrupt context only.
    ///
    /// Returns the new counter value.
    #[inline]
    pub fn advance(&self) -> Millis {
        let next = self.millis.load(Ordering::Relaxed).wrapping_add(1);
        self.millis.store(next, Ordering::Release);
        next
    }

    /// Copy the counter for use during one main-loop iteration.
    ///
    /// The read happens inside a critical section so that a platform whose
    /// counter is wider than its native word still gets an untorn value.
    pub fn snapshot(&self) -> Millis {
        sync::critical_section(|_cs| self.millis.load(Ordering::Acquire))
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

/// Microseconds elapsed since the last millisecond boundary.
/// Owned by the interrupt context; never shared.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickAccumulator {
    step_us: u32,
}

impl TickAccumulator {
    pub const fn new() -> Self {
        Self { step_us: 0 }
    }

    /// Add `elapsed_us` and report whether a millisecond boundary was crossed.
    ///
    /// `elapsed_us` must be below one millisecond; the remainder stays
    /// bounded by `MICROS_PER_MILLI`.
    #[inline]
    pub fn accumulate(&mut self, elapsed_us: u32) -> bool {
        self.step_us += elapsed_us;
        if self.step_us >= MICROS_PER_MILLI {
            self.step_us -= MICROS_PER_MILLI;
            true
        } else {
            false
        }
    }

    /// Current sub-millisecond remainder.
    #[inline]
    pub fn remainder_us(&self) -> u32 {
        self.step_us
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
