//! # Architecture Abstraction Layer
//!
//! Core-level Cortex-M4 support (tick timer, low-power wait) and the
//! STM32F4 peripherals the reference firmware drives. Compiled for the
//! device only; the kernel logic above it builds and tests on the host.

#[cfg(target_os = "none")]
pub mod cortex_m4;

#[cfg(target_os = "none")]
pub mod stm32f4;
