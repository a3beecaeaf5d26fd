//! # Power / Sleep Scheduler
//!
//! ```text
//!   ┌──────────┐  sleep timer expired   ┌──────────┐
//!   │  Active  │ ─────────────────────► │  Asleep  │
//!   └──────────┘                        └──────────┘
//!        ▲          button edge              │
//!        └───────────────────────────────────┘
//! ```
//!
//! Entering sleep turns the pixels and the infrared transceivers off and
//! leaves the button edge interrupt as the only wake source, so a frame
//! arriving on a face cannot wake the tile. The whole transition is one
//! blocking call from the main loop; nothing else runs until it returns.
//!
//! The wake edge is recorded in a [`WakeLatch`]. The button driver clears
//! it before arming the edge interrupt, so an edge that lands between
//! arming and the low-power wait still ends the wait.

use core::sync::atomic::{AtomicBool, Ordering};

use log::info;

use crate::hal::{ButtonDriver, IrDriver, PixelDriver, Platform};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    /// Main loop running, drivers enabled.
    Active,
    /// Halted in the platform's low-power primitive.
    Asleep,
}

/// One-shot flag raised by the wake interrupt and consumed by the
/// low-power wait.
#[derive(Debug)]
pub struct WakeLatch {
    pending: AtomicBool,
}

impl WakeLatch {
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
        }
    }

    /// Forget any earlier edge. Call before the wake interrupt is armed,
    /// never after.
    pub fn clear(&self) {
        self.pending.store(false, Ordering::Release);
    }

    /// Interrupt context.
    pub fn signal(&self) {
        self.pending.store(true, Ordering::Release);
    }

    /// Consume the edge, if one arrived since the last clear or take.
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }
}

impl Default for WakeLatch {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks the power state and the one-shot wake indicator.
#[derive(Debug)]
pub struct SleepScheduler {
    state: PowerState,
    woke: bool,
}

impl SleepScheduler {
    pub const fn new() -> Self {
        Self {
            state: PowerState::Active,
            woke: false,
        }
    }

    pub fn state(&self) -> PowerState {
        self.state
    }

    /// Consume the wake indicator. Returns `true` on the first call after
    /// a wake and `false` thereafter.
    pub fn take_woke(&mut self) -> bool {
        core::mem::take(&mut self.woke)
    }

    /// Power down, block until woken, power back up.
    pub fn sleep<P: Platform + ?Sized>(&mut self, platform: &mut P) {
        info!("power: going to sleep");
        self.state = PowerState::Asleep;

        platform.pixels().disable();
        platform.ir().disable();
        platform.button().wake_interrupt_on();

        platform.power_sleep();

        platform.button().wake_interrupt_off();
        platform.ir().enable();
        platform.pixels().enable();

        self.state = PowerState::Active;
        self.woke = true;
        info!("power: awake");
    }
}

impl Default for SleepScheduler {
    fn default() -> Self {
        Self::new()
    }
}
