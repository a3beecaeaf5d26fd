//! # Infrared Packet Protocol
//!
//! Validates and routes the frames each face's receiver has completed.
//! Runs in the main loop, once per face per iteration.
//!
//! ## Wire Format
//!
//! ```text
//! ┌────────┬───────────────────┬────────┐
//! │ header │  payload (0..n)   │ CRC-8  │
//! └────────┴───────────────────┴────────┘
//!   0x01 user / 0x02 control     CCITT, init 0xFF, over header+payload
//! ```
//!
//! There is no length prefix; the driver delimits frames.
//!
//! ## Per-face State Machine
//!
//! ```text
//!  Idle ──ready──► Validate ──ok──► Route ──0x01──► exposed to the game
//!   ▲                 │               ├──0x02──► control handler, mark read
//!   │                 │ short / CRC   └──other─► mark read
//!   └──── mark read ◄─┘
//! ```
//!
//! User frames stay in the driver's slot until the game acknowledges them.
//! While they wait they are held by the [`IrRouter`] and not re-validated.

use core::ops::Range;

use log::{debug, trace};
use thiserror::Error;

use crate::config::{FACE_COUNT, IR_CRC_INIT, IR_HEADER_CONTROL, IR_HEADER_USER, IR_MIN_FRAME_LEN};
use crate::hal::IrDriver;
use crate::loopstate::FaceSet;

/// Why a frame was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IrError {
    #[error("frame of {len} bytes is shorter than header plus checksum")]
    TooShort { len: usize },

    #[error("checksum mismatch: computed {expected:#04x}, frame carries {found:#04x}")]
    BadChecksum { expected: u8, found: u8 },

    #[error("unrecognized header byte {0:#04x}")]
    UnknownHeader(u8),

    #[error("frame needs {needed} bytes but the buffer holds {capacity}")]
    BufferTooSmall { needed: usize, capacity: usize },
}

/// A validated frame, borrowed from the receive slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Packet<'a> {
    /// Game data, header and checksum stripped.
    User(&'a [u8]),
    /// Kernel control body, header and checksum stripped.
    Control(&'a [u8]),
}

/// One step of the CCITT CRC-8 (polynomial `x^8 + x^2 + x + 1`).
#[inline]
pub const fn crc8_ccitt_update(crc: u8, byte: u8) -> u8 {
    let mut crc = crc ^ byte;
    let mut bit = 0;
    while bit < 8 {
        crc = if crc & 0x80 != 0 {
            (crc << 1) ^ 0x07
        } else {
            crc << 1
        };
        bit += 1;
    }
    crc
}

/// CRC-8 of `data`, starting from `IR_CRC_INIT`.
pub fn crc8(data: &[u8]) -> u8 {
    data.iter()
        .fold(IR_CRC_INIT, |crc, &byte| crc8_ccitt_update(crc, byte))
}

/// Check length and trailing checksum.
pub fn verify(frame: &[u8]) -> Result<(), IrError> {
    if frame.len() < IR_MIN_FRAME_LEN {
        return Err(IrError::TooShort { len: frame.len() });
    }
    let (body, tail) = frame.split_at(frame.len() - 1);
    let expected = crc8(body);
    let found = tail[0];
    if expected != found {
        return Err(IrError::BadChecksum { expected, found });
    }
    Ok(())
}

/// Validate a frame and classify it by its header byte.
pub fn parse(frame: &[u8]) -> Result<Packet<'_>, IrError> {
    verify(frame)?;
    let body = &frame[1..frame.len() - 1];
    match frame[0] {
        IR_HEADER_USER => Ok(Packet::User(body)),
        IR_HEADER_CONTROL => Ok(Packet::Control(body)),
        other => Err(IrError::UnknownHeader(other)),
    }
}

/// Build a frame from `header` and `payload` into `buf`, appending the
/// checksum. Returns the frame slice.
pub fn encode_frame<'b>(header: u8, payload: &[u8], buf: &'b mut [u8]) -> Result<&'b [u8], IrError> {
    let needed = payload.len() + IR_MIN_FRAME_LEN;
    if buf.len() < needed {
        return Err(IrError::BufferTooSmall {
            needed,
            capacity: buf.len(),
        });
    }
    buf[0] = header;
    buf[1..=payload.len()].copy_from_slice(payload);
    buf[needed - 1] = crc8(&buf[..needed - 1]);
    Ok(&buf[..needed])
}

/// Receiver of kernel control packets.
///
/// The body semantics are up to the implementor. Called in the main loop
/// before the frame's slot is released.
pub trait ControlHandler {
    fn on_control(&mut self, face: usize, body: &[u8]);
}

/// Control handler that drops every packet.
#[derive(Debug, Clone, Copy, Default)]
pub struct IgnoreControl;

impl ControlHandler for IgnoreControl {
    fn on_control(&mut self, _face: usize, _body: &[u8]) {}
}

/// Per-kind frame counters since boot. Wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IrStats {
    pub user: u32,
    pub control: u32,
    pub too_short: u32,
    pub bad_checksum: u32,
    pub unknown_header: u32,
}

impl IrStats {
    pub const fn new() -> Self {
        Self {
            user: 0,
            control: 0,
            too_short: 0,
            bad_checksum: 0,
            unknown_header: 0,
        }
    }

    /// Frames discarded for any reason.
    pub fn discarded(&self) -> u32 {
        self.too_short
            .wrapping_add(self.bad_checksum)
            .wrapping_add(self.unknown_header)
    }

    fn record_error(&mut self, err: &IrError) {
        let counter = match err {
            IrError::TooShort { .. } => &mut self.too_short,
            IrError::BadChecksum { .. } => &mut self.bad_checksum,
            IrError::UnknownHeader(_) => &mut self.unknown_header,
            IrError::BufferTooSmall { .. } => return,
        };
        *counter = counter.wrapping_add(1);
    }
}

/// Validates and routes the frames waiting in the receive slots.
///
/// A user frame is validated and counted once, when it first shows up in
/// its slot. The router then holds the location of its payload until the
/// slot is released, so later iterations re-expose it without checking
/// it again.
#[derive(Debug, Clone)]
pub struct IrRouter {
    stats: IrStats,
    held: [Option<Range<usize>>; FACE_COUNT],
}

impl IrRouter {
    pub const fn new() -> Self {
        const NOT_HELD: Option<Range<usize>> = None;
        Self {
            stats: IrStats::new(),
            held: [NOT_HELD; FACE_COUNT],
        }
    }

    pub fn stats(&self) -> &IrStats {
        &self.stats
    }

    /// Validate and route every face with a new ready frame.
    ///
    /// User frames stay in their slot for the game; every other ready frame
    /// is consumed here and its slot released. Faces with nothing ready are
    /// untouched.
    pub fn process<I, C>(&mut self, ir: &mut I, control: &mut C)
    where
        I: IrDriver + ?Sized,
        C: ControlHandler + ?Sized,
    {
        for face in 0..FACE_COUNT {
            if !ir.is_frame_ready(face) {
                self.held[face] = None;
                continue;
            }
            if self.held[face].is_some() {
                // Still waiting for the game to acknowledge it
                continue;
            }

            match parse(ir.frame(face)) {
                Ok(Packet::User(body)) => {
                    self.stats.user = self.stats.user.wrapping_add(1);
                    self.held[face] = Some(1..1 + body.len());
                }
                Ok(Packet::Control(body)) => {
                    trace!("ir: control packet on face {} ({} bytes)", face, body.len());
                    self.stats.control = self.stats.control.wrapping_add(1);
                    control.on_control(face, body);
                    ir.mark_read(face);
                }
                Err(err) => {
                    debug!("ir: discarding frame on face {}: {}", face, err);
                    self.stats.record_error(&err);
                    ir.mark_read(face);
                }
            }
        }
    }

    /// Faces holding a validated user frame.
    pub fn user_ready(&self) -> FaceSet {
        let mut ready = FaceSet::EMPTY;
        for face in (0..FACE_COUNT).filter(|&face| self.held[face].is_some()) {
            ready.insert(face);
        }
        ready
    }

    /// Game payload of the user frame held on `face`, sliced from `frame`.
    pub fn user_payload<'f>(&self, face: usize, frame: &'f [u8]) -> Option<&'f [u8]> {
        let body = self.held.get(face)?.clone()?;
        frame.get(body)
    }

    /// Free the slot of a held user frame. No-op for any other face.
    pub fn release<I: IrDriver + ?Sized>(&mut self, ir: &mut I, face: usize) {
        if let Some(held) = self.held.get_mut(face) {
            if held.take().is_some() && ir.is_frame_ready(face) {
                ir.mark_read(face);
            }
        }
    }
}

impl Default for IrRouter {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
