//! # STM32F4 Peripherals
//!
//! The handful of GPIO, EXTI and NVIC operations the reference firmware
//! needs, as raw register accesses (no PAC).

use cortex_m::interrupt::InterruptNumber;
use cortex_m::peripheral::NVIC;

const RCC_AHB1ENR: *mut u32 = 0x4002_3830 as *mut u32;

const EXTI_IMR: *mut u32 = 0x4001_3C00 as *mut u32;
const EXTI_RTSR: *mut u32 = 0x4001_3C08 as *mut u32;
const EXTI_FTSR: *mut u32 = 0x4001_3C0C as *mut u32;
const EXTI_PR: *mut u32 = 0x4001_3C14 as *mut u32;

const GPIO_MODER: usize = 0x00;
const GPIO_IDR: usize = 0x10;
const GPIO_BSRR: usize = 0x18;

/// GPIO ports used by the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Port {
    A,
    D,
}

impl Port {
    const fn base(self) -> usize {
        match self {
            Port::A => 0x4002_0000,
            Port::D => 0x4002_0C00,
        }
    }

    const fn clock_bit(self) -> u32 {
        match self {
            Port::A => 1 << 0,
            Port::D => 1 << 3,
        }
    }

    const fn reg(self, offset: usize) -> *mut u32 {
        (self.base() + offset) as *mut u32
    }
}

/// Device interrupt lines the firmware unmasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Interrupt {
    /// EXTI line 0 (PA0, the user button).
    Exti0 = 6,
}

unsafe impl InterruptNumber for Interrupt {
    #[inline]
    fn number(self) -> u16 {
        self as u16
    }
}

#[inline]
unsafe fn modify(reg: *mut u32, f: impl FnOnce(u32) -> u32) {
    core::ptr::write_volatile(reg, f(core::ptr::read_volatile(reg)));
}

pub fn enable_port_clock(port: Port) {
    unsafe { modify(RCC_AHB1ENR, |v| v | port.clock_bit()) }
}

/// Set `pin` to general-purpose output (`true`) or input (`false`).
pub fn set_output(port: Port, pin: u8, output: bool) {
    let shift = u32::from(pin) * 2;
    unsafe {
        modify(port.reg(GPIO_MODER), |v| {
            let v = v & !(0b11 << shift);
            if output {
                v | (0b01 << shift)
            } else {
                v
            }
        })
    }
}

#[inline]
pub fn read_pin(port: Port, pin: u8) -> bool {
    unsafe { core::ptr::read_volatile(port.reg(GPIO_IDR)) & (1 << pin) != 0 }
}

/// Atomically set the pins in `set` high and those in `reset` low.
#[inline]
pub fn write_pins(port: Port, set: u16, reset: u16) {
    let bsrr = u32::from(set) | (u32::from(reset) << 16);
    unsafe { core::ptr::write_volatile(port.reg(GPIO_BSRR), bsrr) }
}

/// Route both edges of EXTI `line` to its interrupt and unmask it.
pub fn arm_edge_interrupt(line: u8, irq: Interrupt) {
    let bit = 1u32 << line;
    unsafe {
        modify(EXTI_RTSR, |v| v | bit);
        modify(EXTI_FTSR, |v| v | bit);
        core::ptr::write_volatile(EXTI_PR, bit);
        modify(EXTI_IMR, |v| v | bit);
        NVIC::unpend(irq);
        NVIC::unmask(irq);
    }
}

pub fn disarm_edge_interrupt(line: u8, irq: Interrupt) {
    NVIC::mask(irq);
    unsafe { modify(EXTI_IMR, |v| v & !(1u32 << line)) }
}

/// Clear the pending flag of EXTI `line`. Call from its handler.
#[inline]
pub fn clear_edge_pending(line: u8) {
    unsafe { core::ptr::write_volatile(EXTI_PR, 1u32 << line) }
}
