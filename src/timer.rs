//! # Countdown Timers
//!
//! A [`Timer`] stores an absolute deadline on the millisecond clock.
//! Arming may happen from the tick interrupt; expiry is only ever checked
//! by the main loop against its per-iteration clock snapshot.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::time::{has_reached, Millis};

/// Single countdown timer. Always either running toward a future deadline
/// or expired; a freshly constructed timer is expired.
pub struct Timer {
    expires_at: AtomicU32,
}

impl Timer {
    pub const fn new() -> Self {
        Self {
            expires_at: AtomicU32::new(0),
        }
    }

    /// Arm the timer to expire `duration` milliseconds after `now`.
    #[inline]
    pub fn set(&self, now: Millis, duration: u32) {
        self.expires_at
            .store(now.wrapping_add(duration), Ordering::Release);
    }

    #[inline]
    pub fn is_expired(&self, now: Millis) -> bool {
        has_reached(now, self.expires_at.load(Ordering::Acquire))
    }

    /// Milliseconds left before expiry, or 0 if already expired.
    pub fn remaining(&self, now: Millis) -> u32 {
        let deadline = self.expires_at.load(Ordering::Acquire);
        if has_reached(now, deadline) {
            0
        } else {
            deadline.wrapping_sub(now)
        }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

/// The inactivity timer that decides when the tile goes to sleep.
pub struct SleepTimer {
    timer: Timer,
    timeout_ms: u32,
}

impl SleepTimer {
    pub const fn new(timeout_ms: u32) -> Self {
        Self {
            timer: Timer::new(),
            timeout_ms,
        }
    }

    /// Restart the inactivity countdown from `now`.
    ///
    /// Called once at startup, after every wake, and from the tick interrupt
    /// whenever the button reports activity. Never blocks.
    #[inline]
    pub fn postpone(&self, now: Millis) {
        self.timer.set(now, self.timeout_ms);
    }

    #[inline]
    pub fn is_expired(&self, now: Millis) -> bool {
        self.timer.is_expired(now)
    }

    pub fn remaining(&self, now: Millis) -> u32 {
        self.timer.remaining(now)
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
