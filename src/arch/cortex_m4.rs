//! # Cortex-M4 Port Layer
//!
//! SysTick as the kernel tick source and the blocking low-power wait used
//! as the sleep primitive.
//!
//! ## Sleep
//!
//! While asleep the SysTick interrupt is masked, so the millisecond clock
//! stops and only an external interrupt (the button's EXTI line) can end
//! the wait. The button driver calls [`clear_wake`] before arming that
//! line and the wake interrupt handler calls [`signal_wake`]; any other
//! interrupt that slips through sends the core straight back to `wfi`.

use cortex_m::peripheral::syst::SystClkSource;

use crate::config::{IR_SERVICE_PERIOD_US, SYSTEM_CLOCK_HZ};
use crate::power::WakeLatch;

/// SysTick Control and Status Register.
const SYST_CSR: *mut u32 = 0xE000_E010 as *mut u32;
/// CSR.TICKINT: SysTick exception request enable.
const SYST_CSR_TICKINT: u32 = 1 << 1;

static WAKE: WakeLatch = WakeLatch::new();

// ---------------------------------------------------------------------------
// SysTick configuration
// ---------------------------------------------------------------------------

/// SysTick reload value for one receiver service period.
pub const fn systick_reload() -> u32 {
    SYSTEM_CLOCK_HZ / 1_000_000 * IR_SERVICE_PERIOD_US - 1
}

/// Configure SysTick to fire every `IR_SERVICE_PERIOD_US` from the core clock.
///
/// Each interrupt runs `SysTick`, which must call
/// [`TickContext::on_interrupt`](crate::kernel::TickContext::on_interrupt).
pub fn configure_systick(syst: &mut cortex_m::peripheral::SYST) {
    syst.set_reload(systick_reload());
    syst.clear_current();
    syst.set_clock_source(SystClkSource::Core);
    syst.enable_counter();
    syst.enable_interrupt();
}

#[inline]
fn set_tick_interrupt(enabled: bool) {
    unsafe {
        let csr = core::ptr::read_volatile(SYST_CSR);
        let csr = if enabled {
            csr | SYST_CSR_TICKINT
        } else {
            csr & !SYST_CSR_TICKINT
        };
        core::ptr::write_volatile(SYST_CSR, csr);
    }
}

// ---------------------------------------------------------------------------
// Low-power wait
// ---------------------------------------------------------------------------

/// Drop any stale wake edge. Call before arming the wake interrupt.
#[inline]
pub fn clear_wake() {
    WAKE.clear();
}

/// Record that the wake source fired. Call from the wake interrupt handler.
#[inline]
pub fn signal_wake() {
    WAKE.signal();
}

/// Halt until [`signal_wake`] has been called since the last
/// [`clear_wake`]. The tick stays masked for the whole wait and is
/// restored before returning.
pub fn sleep_until_wake() {
    set_tick_interrupt(false);

    while !WAKE.take() {
        cortex_m::asm::dsb();
        cortex_m::asm::wfi();
    }

    set_tick_interrupt(true);
}

/// Wait for the next interrupt of any kind.
#[inline]
pub fn idle() {
    cortex_m::asm::wfi();
}
