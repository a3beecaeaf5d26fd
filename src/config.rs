//! # Tile OS Configuration
//!
//! Compile-time constants governing the time base, the button gestures,
//! the infrared framing and the sleep policy. All limits are fixed at
//! compile time; there is no dynamic allocation.

use static_assertions::const_assert;

/// Number of faces on the tile. Each face has one infrared transceiver
/// and one pixel, addressed by index in `0..FACE_COUNT`.
pub const FACE_COUNT: usize = 6;

/// Period of the hardware tick that drives the time base, in microseconds.
pub const TICK_PERIOD_US: u32 = 256;

/// Period of the timer interrupt, which services the infrared receivers
/// on every call. Every critical section in the kernel must stay well
/// below this.
pub const IR_SERVICE_PERIOD_US: u32 = 128;

/// Timer interrupts per hardware tick.
pub const IR_SERVICES_PER_TICK: u32 = TICK_PERIOD_US / IR_SERVICE_PERIOD_US;

pub const MICROS_PER_MILLI: u32 = 1000;

pub const MILLIS_PER_SECOND: u32 = 1000;

/// If no button activity is seen for this long the tile goes to sleep.
pub const SLEEP_TIMEOUT_SECONDS: u32 = 10 * 60;

/// [`SLEEP_TIMEOUT_SECONDS`] expressed in milliseconds.
pub const SLEEP_TIMEOUT_MS: u32 = SLEEP_TIMEOUT_SECONDS * MILLIS_PER_SECOND;

/// Quiet time after a release that closes a click sequence. A press
/// arriving within this window extends the sequence instead.
pub const BUTTON_CLICK_TIMEOUT_MS: u16 = 330;

/// Hold time after which a press counts as a long press.
pub const BUTTON_LONG_PRESS_MS: u16 = 2000;

/// Routing header of a frame carrying game data.
pub const IR_HEADER_USER: u8 = 0x01;

/// Routing header of a frame consumed by the kernel itself.
pub const IR_HEADER_CONTROL: u8 = 0x02;

/// Initial value of the frame CRC-8 (CCITT polynomial).
pub const IR_CRC_INIT: u8 = 0xFF;

/// Header byte plus checksum byte, zero payload bytes.
pub const IR_MIN_FRAME_LEN: usize = 2;

/// System clock frequency in Hz (default for STM32F4 at 16 MHz HSI).
pub const SYSTEM_CLOCK_HZ: u32 = 16_000_000;

/// Display refresh period used by the firmware's pixel driver to pace
/// the main loop.
pub const FRAME_PERIOD_MS: u32 = 16;

// Face sets are stored in a single byte.
const_assert!(FACE_COUNT <= 8);
// The tick is a whole number of service periods.
const_assert!(IR_SERVICE_PERIOD_US <= TICK_PERIOD_US);
const_assert!(TICK_PERIOD_US % IR_SERVICE_PERIOD_US == 0);
// At most one millisecond boundary can be crossed per tick.
const_assert!(TICK_PERIOD_US < MICROS_PER_MILLI);
// The sleep deadline must be reachable by a wrapping u32 comparison.
const_assert!(SLEEP_TIMEOUT_MS < u32::MAX / 2);
const_assert!(BUTTON_CLICK_TIMEOUT_MS < BUTTON_LONG_PRESS_MS);
