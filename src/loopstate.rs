//! # Loop State
//!
//! The two values exchanged with the game once per iteration.
//!
//! - [`LoopInput`] is rebuilt from scratch every iteration: clock snapshot,
//!   button events, validated infrared payloads, wake indicator.
//! - [`LoopOutput`] is owned by the kernel and lent to the game mutably.
//!   Colors persist between iterations; each carries a "changed" marker
//!   that the kernel clears once the color has been sent to the display.

use crate::button::ButtonState;
use crate::color::PixelColor;
use crate::config::FACE_COUNT;
use crate::time::Millis;

/// A set of face indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FaceSet(u8);

impl FaceSet {
    pub const EMPTY: Self = Self(0);

    /// Add `face`. Indices outside `0..FACE_COUNT` are ignored.
    pub fn insert(&mut self, face: usize) {
        if face < FACE_COUNT {
            self.0 |= 1 << face;
        }
    }

    pub fn contains(self, face: usize) -> bool {
        face < FACE_COUNT && self.0 & (1 << face) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Faces in the set, lowest index first.
    pub fn iter(self) -> impl Iterator<Item = usize> {
        (0..FACE_COUNT).filter(move |&face| self.contains(face))
    }
}

/// What a face received this iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IrPayload<'a> {
    /// Game bytes: everything between the header byte and the checksum.
    pub data: &'a [u8],
    /// A validated user frame is waiting on this face.
    pub ready: bool,
}

impl<'a> IrPayload<'a> {
    pub const EMPTY: IrPayload<'static> = IrPayload {
        data: &[],
        ready: false,
    };
}

/// Everything the game may read during one iteration.
#[derive(Debug, Clone, Copy)]
pub struct LoopInput<'a> {
    pub millis: Millis,
    pub buttons: ButtonState,
    pub ir: [IrPayload<'a>; FACE_COUNT],
    /// Set for exactly one iteration after the tile wakes from sleep.
    pub woke: bool,
}

/// Everything the game may change during one iteration.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoopOutput {
    colors: [PixelColor; FACE_COUNT],
    acknowledged: FaceSet,
}

impl LoopOutput {
    pub const fn new() -> Self {
        Self {
            colors: [PixelColor::OFF; FACE_COUNT],
            acknowledged: FaceSet::EMPTY,
        }
    }

    /// Set the color of `face`. Marks the face changed unless it already
    /// shows `color`. A face outside `0..FACE_COUNT` is ignored.
    pub fn set_color(&mut self, face: usize, color: PixelColor) {
        let color = color.without_marker();
        if let Some(slot) = self.colors.get_mut(face) {
            if slot.without_marker() != color {
                *slot = color.with_marker();
            }
        }
    }

    pub fn set_all(&mut self, color: PixelColor) {
        for face in 0..FACE_COUNT {
            self.set_color(face, color);
        }
    }

    /// Current color of `face`, without the change marker.
    pub fn color(&self, face: usize) -> PixelColor {
        self.colors
            .get(face)
            .map_or(PixelColor::OFF, |color| color.without_marker())
    }

    /// Consume the user frame on `face`, freeing the receive slot. A face
    /// outside `0..FACE_COUNT` is ignored.
    ///
    /// A frame that is never acknowledged stays ready and is offered again
    /// on every iteration, blocking further frames on that face.
    pub fn acknowledge(&mut self, face: usize) {
        self.acknowledged.insert(face);
    }

    pub(crate) fn take_acknowledged(&mut self) -> FaceSet {
        core::mem::take(&mut self.acknowledged)
    }

    /// Colors changed since the last call, with their markers cleared.
    pub(crate) fn take_changed(&mut self) -> impl Iterator<Item = (usize, PixelColor)> + '_ {
        self.colors
            .iter_mut()
            .enumerate()
            .filter(|(_, color)| color.is_marked())
            .map(|(face, color)| {
                *color = color.without_marker();
                (face, *color)
            })
    }
}
