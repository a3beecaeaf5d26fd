//! # Button State Bridge
//!
//! Gesture detection runs in the tick interrupt at 1 ms resolution and
//! publishes into a [`ButtonBridge`]; the main loop takes one cleared copy
//! per iteration via [`ButtonBridge::grab_and_clear`].
//!
//! ## Ownership
//!
//! | Field | Written by | Cleared by |
//! |-------|------------|------------|
//! | `flags` | interrupt (set only) | main loop, only the bits it read |
//! | `click_count` | interrupt (increment only, wraps mod 256) | never |
//! | `down` | interrupt | never |
//!
//! The per-press bookkeeping (hold time, clicks in the current sequence)
//! lives in [`ButtonTracker`], which only the interrupt context touches.

use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use bitflags::bitflags;

use crate::config::{BUTTON_CLICK_TIMEOUT_MS, BUTTON_LONG_PRESS_MS};
use crate::sync;

bitflags! {
    /// One-shot button events. Each is observed by the main loop at most once.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ButtonFlags: u8 {
        /// The button went down.
        const PRESSED        = 1 << 0;
        /// The button came up.
        const RELEASED       = 1 << 1;
        /// A click sequence of exactly one click closed.
        const SINGLE_CLICKED = 1 << 2;
        /// A click sequence of exactly two clicks closed.
        const DOUBLE_CLICKED = 1 << 3;
        /// A click sequence of three or more clicks closed.
        const MULTI_CLICKED  = 1 << 4;
        /// The button has been held for `BUTTON_LONG_PRESS_MS`.
        const LONG_PRESSED   = 1 << 5;
    }
}

/// Main-loop copy of the button state, as handed to the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonState {
    /// Events since the previous grab.
    pub flags: ButtonFlags,
    /// Total completed clicks since boot, modulo 256.
    pub click_count: u8,
    /// Whether the button is held right now.
    pub down: bool,
}

/// Interrupt-to-main handoff cell for button state.
pub struct ButtonBridge {
    flags: AtomicU8,
    click_count: AtomicU8,
    down: AtomicBool,
}

impl ButtonBridge {
    pub const fn new() -> Self {
        Self {
            flags: AtomicU8::new(0),
            click_count: AtomicU8::new(0),
            down: AtomicBool::new(false),
        }
    }

    /// Raise event flags. Interrupt context.
    #[inline]
    pub fn raise(&self, flags: ButtonFlags) {
        self.flags.fetch_or(flags.bits(), Ordering::Release);
    }

    /// Count one completed click. Wraps at 256. Interrupt context.
    #[inline]
    pub fn count_click(&self) {
        self.click_count.fetch_add(1, Ordering::Release);
    }

    /// Publish the instantaneous held state. Interrupt context.
    #[inline]
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::Release);
    }

    /// Copy the whole record and clear the flags that were copied.
    ///
    /// Only the bits present in the copy are cleared, so a flag raised
    /// after the read is delivered by the next grab instead of being lost.
    pub fn grab_and_clear(&self) -> ButtonState {
        self.grab_and_clear_with(|| {})
    }

    /// [`grab_and_clear`](Self::grab_and_clear) with a hook run between the
    /// read and the clear.
    pub(crate) fn grab_and_clear_with<F: FnOnce()>(&self, between: F) -> ButtonState {
        sync::critical_section(|_cs| {
            let flags = self.flags.load(Ordering::Acquire);
            let state = ButtonState {
                flags: ButtonFlags::from_bits_truncate(flags),
                click_count: self.click_count.load(Ordering::Acquire),
                down: self.down.load(Ordering::Acquire),
            };
            between();
            self.flags.fetch_and(!flags, Ordering::AcqRel);
            state
        })
    }
}

impl Default for ButtonBridge {
    fn default() -> Self {
        Self::new()
    }
}

/// Interrupt-private gesture tracker, stepped once per millisecond.
#[derive(Debug, Clone, Copy, Default)]
pub struct ButtonTracker {
    down: bool,
    held_ms: u16,
    long_press_fired: bool,
    pending_clicks: u8,
    quiet_ms: u16,
}

impl ButtonTracker {
    pub const fn new() -> Self {
        Self {
            down: false,
            held_ms: 0,
            long_press_fired: false,
            pending_clicks: 0,
            quiet_ms: 0,
        }
    }

    /// Feed the debounced button level for this millisecond.
    ///
    /// Publishes any resulting events into `bridge` and returns `true` if
    /// at least one event was raised (the caller re-arms the sleep timer).
    pub fn on_millisecond(&mut self, pressed: bool, bridge: &ButtonBridge) -> bool {
        let mut events = ButtonFlags::empty();

        if pressed != self.down {
            self.down = pressed;
            bridge.set_down(pressed);

            if pressed {
                events |= ButtonFlags::PRESSED;
                self.held_ms = 0;
                self.long_press_fired = false;
            } else {
                events |= ButtonFlags::RELEASED;
                if !self.long_press_fired {
                    bridge.count_click();
                    self.pending_clicks = self.pending_clicks.saturating_add(1);
                    self.quiet_ms = 0;
                }
            }
        } else if self.down {
            if !self.long_press_fired {
                self.held_ms = self.held_ms.saturating_add(1);
                if self.held_ms >= BUTTON_LONG_PRESS_MS {
                    events |= ButtonFlags::LONG_PRESSED;
                    self.long_press_fired = true;
                    self.pending_clicks = 0;
                }
            }
        } else if self.pending_clicks > 0 {
            self.quiet_ms = self.quiet_ms.saturating_add(1);
            if self.quiet_ms >= BUTTON_CLICK_TIMEOUT_MS {
                events |= match self.pending_clicks {
                    1 => ButtonFlags::SINGLE_CLICKED,
                    2 => ButtonFlags::DOUBLE_CLICKED,
                    _ => ButtonFlags::MULTI_CLICKED,
                };
                self.pending_clicks = 0;
            }
        }

        if events.is_empty() {
            false
        } else {
            bridge.raise(events);
            true
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
