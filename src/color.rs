//! # Pixel Colors
//!
//! Colors are 16 bits: three 5-bit channels plus one reserved bit. The
//! game never sees the reserved bit directly; the kernel uses it in the
//! loop output to mark a face whose color changed since it was last sent
//! to the pixel driver.
//!
//! ```text
//!  15  14      10 9       5 4       0
//! ┌───┬──────────┬─────────┬─────────┐
//! │ M │   blue   │  green  │   red   │
//! └───┴──────────┴─────────┴─────────┘
//! ```

const CHANNEL_MASK: u16 = 0x1F;
const GREEN_SHIFT: u16 = 5;
const BLUE_SHIFT: u16 = 10;
const CHANGED_BIT: u16 = 1 << 15;

/// Brightest value of a single channel.
pub const CHANNEL_MAX: u8 = CHANNEL_MASK as u8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelColor(u16);

impl PixelColor {
    pub const OFF: Self = Self::rgb(0, 0, 0);
    pub const RED: Self = Self::rgb(CHANNEL_MAX, 0, 0);
    pub const GREEN: Self = Self::rgb(0, CHANNEL_MAX, 0);
    pub const BLUE: Self = Self::rgb(0, 0, CHANNEL_MAX);
    pub const YELLOW: Self = Self::rgb(CHANNEL_MAX, CHANNEL_MAX, 0);
    pub const CYAN: Self = Self::rgb(0, CHANNEL_MAX, CHANNEL_MAX);
    pub const MAGENTA: Self = Self::rgb(CHANNEL_MAX, 0, CHANNEL_MAX);
    pub const WHITE: Self = Self::rgb(CHANNEL_MAX, CHANNEL_MAX, CHANNEL_MAX);

    /// Build a color from 5-bit channels. Higher bits are discarded.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self(
            (r as u16 & CHANNEL_MASK)
                | ((g as u16 & CHANNEL_MASK) << GREEN_SHIFT)
                | ((b as u16 & CHANNEL_MASK) << BLUE_SHIFT),
        )
    }

    pub const fn red(self) -> u8 {
        (self.0 & CHANNEL_MASK) as u8
    }

    pub const fn green(self) -> u8 {
        ((self.0 >> GREEN_SHIFT) & CHANNEL_MASK) as u8
    }

    pub const fn blue(self) -> u8 {
        ((self.0 >> BLUE_SHIFT) & CHANNEL_MASK) as u8
    }

    pub const fn is_off(self) -> bool {
        self.without_marker().0 == 0
    }

    /// Raw 16-bit encoding, marker included.
    pub const fn to_bits(self) -> u16 {
        self.0
    }

    pub(crate) const fn with_marker(self) -> Self {
        Self(self.0 | CHANGED_BIT)
    }

    pub const fn without_marker(self) -> Self {
        Self(self.0 & !CHANGED_BIT)
    }

    pub const fn is_marked(self) -> bool {
        self.0 & CHANGED_BIT != 0
    }
}
