//! # Platform Interface
//!
//! The hardware the kernel drives but does not implement. A board crate
//! (or the firmware binary) supplies these; tests supply recording mocks.
//!
//! Face indices are always in `0..FACE_COUNT`. Drivers may assume the
//! kernel never passes anything else.

use crate::color::PixelColor;

/// Per-face infrared receive slots.
///
/// Each face has one slot. Once a frame is ready the driver must not start
/// completing another frame on that face until [`mark_read`](Self::mark_read)
/// frees the slot.
pub trait IrDriver {
    /// A complete frame is waiting on `face`.
    fn is_frame_ready(&self, face: usize) -> bool;

    /// The complete frame on `face`, header and checksum included. Only
    /// meaningful while [`is_frame_ready`](Self::is_frame_ready) holds.
    fn frame(&self, face: usize) -> &[u8];

    /// Release the slot on `face` for the next frame.
    fn mark_read(&mut self, face: usize);

    fn enable(&mut self);

    /// Power the transceivers down. Frames cannot arrive, and cannot wake
    /// the device, until re-enabled.
    fn disable(&mut self);
}

/// Receiver work that has to run in the timer interrupt, once every
/// `IR_SERVICE_PERIOD_US`.
pub trait IrService {
    /// Sample the transceivers and advance any frame being received.
    /// Bounded work, never blocks.
    fn service(&mut self);
}

pub trait PixelDriver {
    /// Stage `color` for `face`; nothing is visible until `present`.
    fn buffer_color(&mut self, face: usize, color: PixelColor);

    /// Show every staged color. May block until the next refresh window,
    /// which paces the main loop.
    fn present(&mut self);

    fn enable(&mut self);

    fn disable(&mut self);
}

pub trait ButtonDriver {
    /// One-time pull-up / power-up of the button input.
    fn enable_pull_up(&mut self);

    /// Arm the button edge interrupt as a wake source.
    fn wake_interrupt_on(&mut self);

    /// Return the button to its normal sampled mode.
    fn wake_interrupt_off(&mut self);
}

/// The bundle of drivers the main loop owns.
///
/// The debounced button level is sampled by the tick interrupt, not
/// through this trait; see [`TickContext`](crate::kernel::TickContext).
pub trait Platform {
    type Ir: IrDriver;
    type Pixels: PixelDriver;
    type Button: ButtonDriver;

    fn ir(&mut self) -> &mut Self::Ir;

    fn pixels(&mut self) -> &mut Self::Pixels;

    fn button(&mut self) -> &mut Self::Button;

    /// Halt in the low-power state until a wake interrupt fires.
    fn power_sleep(&mut self);
}
