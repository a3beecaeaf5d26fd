//! # Tile OS Reference Firmware
//!
//! Runs the kernel on an STM32F4-Discovery board standing in for a tile:
//!
//! | Tile part | Discovery part |
//! |-----------|----------------|
//! | Button | PA0 user button (active high, external pull-down) |
//! | Faces 0–3 pixels | PD12–PD15 LEDs (on when the color is not off) |
//! | Faces 4–5 pixels | not populated |
//! | IR transceivers | not populated; no frames ever arrive |
//!
//! This file is the composition root: it owns the interrupt handlers,
//! builds the board drivers and hands control to `Kernel::run`. A game
//! that needs the hardware before the kernel does can be composed here
//! instead.
//!
//! ## Demo Game
//!
//! - **Click**: light the next face in the current color.
//! - **Double click**: advance to the next color.
//! - **Multi click**: spin a single lit face around the tile.
//! - **Long press**: all faces off.
//! - **Wake**: flash every face white for half a second.
//! - **User IR frame**: first payload byte picks the color on that face.

#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

#[cfg(not(target_os = "none"))]
fn main() {
    // The firmware only builds for the device; the kernel is exercised on
    // the host through its tests.
}

#[cfg(target_os = "none")]
mod firmware {
    use cortex_m_rt::{entry, exception};
    use panic_halt as _;

    use tilekernel::arch::cortex_m4;
    use tilekernel::arch::stm32f4::{self, Interrupt, Port};
    use tilekernel::button::ButtonFlags;
    use tilekernel::color::PixelColor;
    use tilekernel::config::{FACE_COUNT, FRAME_PERIOD_MS};
    use tilekernel::game::Game;
    use tilekernel::hal::{ButtonDriver, IrDriver, IrService, PixelDriver, Platform};
    use tilekernel::kernel::{Kernel, SharedState, TickContext};
    use tilekernel::loopstate::{LoopInput, LoopOutput};
    use tilekernel::time::{has_reached, Millis};

    const BUTTON_PIN: u8 = 0;
    const BUTTON_EXTI_LINE: u8 = 0;
    const LED_PINS: [u8; 4] = [12, 13, 14, 15];

    static SHARED: SharedState = SharedState::new();

    // -----------------------------------------------------------------------
    // Board drivers
    // -----------------------------------------------------------------------

    struct NoTransceiver;

    impl IrDriver for NoTransceiver {
        fn is_frame_ready(&self, _face: usize) -> bool {
            false
        }
        fn frame(&self, _face: usize) -> &[u8] {
            &[]
        }
        fn mark_read(&mut self, _face: usize) {}
        fn enable(&mut self) {}
        fn disable(&mut self) {}
    }

    impl IrService for NoTransceiver {
        fn service(&mut self) {}
    }

    struct LedPixels {
        staged: [PixelColor; LED_PINS.len()],
        enabled: bool,
        next_frame: Millis,
    }

    impl LedPixels {
        const fn new() -> Self {
            Self {
                staged: [PixelColor::OFF; LED_PINS.len()],
                enabled: false,
                next_frame: 0,
            }
        }

        fn all_leds() -> u16 {
            LED_PINS.iter().fold(0, |mask, &pin| mask | (1 << pin))
        }
    }

    impl PixelDriver for LedPixels {
        fn buffer_color(&mut self, face: usize, color: PixelColor) {
            if let Some(slot) = self.staged.get_mut(face) {
                *slot = color;
            }
        }

        fn present(&mut self) {
            // Pace the main loop to the display refresh
            while !has_reached(SHARED.clock.snapshot(), self.next_frame) {
                cortex_m4::idle();
            }
            self.next_frame = SHARED.clock.snapshot().wrapping_add(FRAME_PERIOD_MS);

            if !self.enabled {
                return;
            }
            let (mut on, mut off) = (0u16, 0u16);
            for (color, &pin) in self.staged.iter().zip(LED_PINS.iter()) {
                if color.is_off() {
                    off |= 1 << pin;
                } else {
                    on |= 1 << pin;
                }
            }
            stm32f4::write_pins(Port::D, on, off);
        }

        fn enable(&mut self) {
            stm32f4::enable_port_clock(Port::D);
            for &pin in LED_PINS.iter() {
                stm32f4::set_output(Port::D, pin, true);
            }
            self.enabled = true;
        }

        fn disable(&mut self) {
            stm32f4::write_pins(Port::D, 0, Self::all_leds());
            self.enabled = false;
        }
    }

    struct UserButton;

    impl ButtonDriver for UserButton {
        fn enable_pull_up(&mut self) {
            // The Discovery board pulls PA0 down externally; just power the port
            stm32f4::enable_port_clock(Port::A);
            stm32f4::set_output(Port::A, BUTTON_PIN, false);
        }

        fn wake_interrupt_on(&mut self) {
            cortex_m4::clear_wake();
            stm32f4::arm_edge_interrupt(BUTTON_EXTI_LINE, Interrupt::Exti0);
        }

        fn wake_interrupt_off(&mut self) {
            stm32f4::disarm_edge_interrupt(BUTTON_EXTI_LINE, Interrupt::Exti0);
        }
    }

    struct Discovery {
        ir: NoTransceiver,
        pixels: LedPixels,
        button: UserButton,
    }

    impl Platform for Discovery {
        type Ir = NoTransceiver;
        type Pixels = LedPixels;
        type Button = UserButton;

        fn ir(&mut self) -> &mut NoTransceiver {
            &mut self.ir
        }

        fn pixels(&mut self) -> &mut LedPixels {
            &mut self.pixels
        }

        fn button(&mut self) -> &mut UserButton {
            &mut self.button
        }

        fn power_sleep(&mut self) {
            cortex_m4::sleep_until_wake();
        }
    }

    // -----------------------------------------------------------------------
    // Demo game
    // -----------------------------------------------------------------------

    const PALETTE: [PixelColor; 6] = [
        PixelColor::RED,
        PixelColor::YELLOW,
        PixelColor::GREEN,
        PixelColor::CYAN,
        PixelColor::BLUE,
        PixelColor::MAGENTA,
    ];
    const SPIN_STEP_MS: u32 = 100;
    const WAKE_FLASH_MS: u32 = 500;

    struct Demo {
        palette_index: usize,
        next_face: usize,
        spinning: bool,
        next_spin: Millis,
        flash_until: Option<Millis>,
    }

    impl Demo {
        const fn new() -> Self {
            Self {
                palette_index: 0,
                next_face: 0,
                spinning: false,
                next_spin: 0,
                flash_until: None,
            }
        }

        fn color(&self) -> PixelColor {
            PALETTE[self.palette_index]
        }
    }

    impl Game for Demo {
        fn setup(&mut self) {
            self.next_face = 0;
        }

        fn loop_step(&mut self, input: &LoopInput<'_>, output: &mut LoopOutput) {
            let flags = input.buttons.flags;

            if input.woke {
                self.flash_until = Some(input.millis.wrapping_add(WAKE_FLASH_MS));
            }
            if let Some(until) = self.flash_until {
                if has_reached(input.millis, until) {
                    self.flash_until = None;
                    output.set_all(PixelColor::OFF);
                } else {
                    output.set_all(PixelColor::WHITE);
                    return;
                }
            }

            if flags.contains(ButtonFlags::LONG_PRESSED) {
                self.spinning = false;
                output.set_all(PixelColor::OFF);
            }
            if flags.contains(ButtonFlags::SINGLE_CLICKED) {
                self.spinning = false;
                output.set_color(self.next_face, self.color());
                self.next_face = (self.next_face + 1) % FACE_COUNT;
            }
            if flags.contains(ButtonFlags::DOUBLE_CLICKED) {
                self.palette_index = (self.palette_index + 1) % PALETTE.len();
            }
            if flags.contains(ButtonFlags::MULTI_CLICKED) {
                self.spinning = true;
                self.next_spin = input.millis;
            }

            if self.spinning && has_reached(input.millis, self.next_spin) {
                self.next_spin = input.millis.wrapping_add(SPIN_STEP_MS);
                output.set_all(PixelColor::OFF);
                output.set_color(self.next_face, self.color());
                self.next_face = (self.next_face + 1) % FACE_COUNT;
            }

            for (face, payload) in input.ir.iter().enumerate() {
                if !payload.ready {
                    continue;
                }
                if let Some(&pick) = payload.data.first() {
                    output.set_color(face, PALETTE[pick as usize % PALETTE.len()]);
                }
                output.acknowledge(face);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Interrupt handlers
    // -----------------------------------------------------------------------

    #[exception]
    fn SysTick() {
        static mut TICK: TickContext = TickContext::new();
        static mut RECEIVER: NoTransceiver = NoTransceiver;

        let pressed = stm32f4::read_pin(Port::A, BUTTON_PIN);
        TICK.on_interrupt(&SHARED, pressed, RECEIVER);
    }

    #[exception]
    unsafe fn DefaultHandler(irqn: i16) {
        if irqn == Interrupt::Exti0 as i16 {
            stm32f4::clear_edge_pending(BUTTON_EXTI_LINE);
            cortex_m4::signal_wake();
        }
    }

    // -----------------------------------------------------------------------
    // Entry point
    // -----------------------------------------------------------------------

    #[entry]
    fn main() -> ! {
        let mut cp = match cortex_m::Peripherals::take() {
            Some(cp) => cp,
            None => loop {
                cortex_m4::idle();
            },
        };

        cortex_m4::configure_systick(&mut cp.SYST);

        let board = Discovery {
            ir: NoTransceiver,
            pixels: LedPixels::new(),
            button: UserButton,
        };

        Kernel::new(&SHARED, board, Demo::new()).run()
    }
}
