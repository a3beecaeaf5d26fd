//! # Kernel
//!
//! The main-loop orchestrator and the interrupt-side entry point.
//!
//! State is split by owner, not by subsystem:
//!
//! | Type | Owner | Contents |
//! |------|-------|----------|
//! | [`SharedState`] | both contexts (`&'static`) | clock, button bridge, sleep timer |
//! | [`TickContext`] | interrupt context only | service counter, µs accumulator, gesture tracker |
//! | [`Kernel`] | main context only | drivers, game, loop output, IR router |
//!
//! ## Startup Sequence
//!
//! ```text
//! reset_handler (cortex-m-rt)
//!   └─► main()
//!         ├─► arch::cortex_m4::configure_systick()  ← TickContext::on_interrupt()
//!         └─► Kernel::run()                         (no return)
//!               ├─► enable IR, pixels, button pull-up
//!               ├─► Game::setup()
//!               ├─► arm the sleep timer
//!               └─► loop { Kernel::step() }
//! ```
//!
//! ## One Iteration
//!
//! 1. Snapshot the clock.
//! 2. Validate and route pending infrared frames.
//! 3. Grab-and-clear the button state.
//! 4. Run the game.
//! 5. Release acknowledged frames; send changed colors; present the frame.
//! 6. If the sleep timer has expired, sleep.

use log::info;

use crate::button::{ButtonBridge, ButtonTracker};
use crate::config::{FACE_COUNT, IR_SERVICES_PER_TICK, SLEEP_TIMEOUT_MS, TICK_PERIOD_US};
use crate::game::Game;
use crate::hal::{ButtonDriver, IrDriver, IrService, PixelDriver, Platform};
use crate::ir::{ControlHandler, IgnoreControl, IrRouter, IrStats};
use crate::loopstate::{IrPayload, LoopInput, LoopOutput};
use crate::power::{PowerState, SleepScheduler};
use crate::time::{Clock, TickAccumulator};
use crate::timer::SleepTimer;

// ---------------------------------------------------------------------------
// Interrupt-shared state
// ---------------------------------------------------------------------------

/// Kernel state reachable from both the tick interrupt and the main loop.
///
/// Constructed once, usually as a `static`, and handed by reference to
/// both sides. Every field is written with atomics; the main loop reads
/// the multi-field button record and the clock inside a critical section.
pub struct SharedState {
    pub clock: Clock,
    pub buttons: ButtonBridge,
    pub sleep_timer: SleepTimer,
}

impl SharedState {
    pub const fn new() -> Self {
        Self::with_sleep_timeout(SLEEP_TIMEOUT_MS)
    }

    pub const fn with_sleep_timeout(timeout_ms: u32) -> Self {
        Self {
            clock: Clock::new(),
            buttons: ButtonBridge::new(),
            sleep_timer: SleepTimer::new(timeout_ms),
        }
    }

    /// Restart the inactivity countdown from the current clock.
    pub fn postpone_sleep(&self) {
        self.sleep_timer.postpone(self.clock.snapshot());
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Interrupt context
// ---------------------------------------------------------------------------

/// State owned by the tick interrupt.
#[derive(Debug, Default)]
pub struct TickContext {
    accumulator: TickAccumulator,
    tracker: ButtonTracker,
    services: u32,
}

impl TickContext {
    pub const fn new() -> Self {
        Self {
            accumulator: TickAccumulator::new(),
            tracker: ButtonTracker::new(),
            services: 0,
        }
    }

    /// Timer interrupt, every `IR_SERVICE_PERIOD_US`. Interrupt context.
    ///
    /// Services the receivers on every call and runs [`on_tick`](Self::on_tick)
    /// on every `IR_SERVICES_PER_TICK`th call.
    pub fn on_interrupt<S>(
        &mut self,
        shared: &SharedState,
        button_pressed: bool,
        receiver: &mut S,
    ) where
        S: IrService + ?Sized,
    {
        receiver.service();
        self.services += 1;
        if self.services == IR_SERVICES_PER_TICK {
            self.services = 0;
            self.on_tick(shared, button_pressed);
        }
    }

    /// Hardware tick, every `TICK_PERIOD_US`. Interrupt context.
    ///
    /// `button_pressed` is the debounced button level sampled by the
    /// platform in the same interrupt. Bounded work, never blocks.
    pub fn on_tick(&mut self, shared: &SharedState, button_pressed: bool) {
        if self.accumulator.accumulate(TICK_PERIOD_US) {
            self.on_millisecond(shared, button_pressed);
        }
    }

    fn on_millisecond(&mut self, shared: &SharedState, button_pressed: bool) {
        let now = shared.clock.advance();
        if self.tracker.on_millisecond(button_pressed, &shared.buttons) {
            shared.sleep_timer.postpone(now);
        }
    }
}

// ---------------------------------------------------------------------------
// Main-loop orchestrator
// ---------------------------------------------------------------------------

/// The cooperative main loop. The only caller of the game.
pub struct Kernel<'s, P, G, C = IgnoreControl>
where
    P: Platform,
    G: Game,
    C: ControlHandler,
{
    shared: &'s SharedState,
    platform: P,
    game: G,
    control: C,
    output: LoopOutput,
    power: SleepScheduler,
    router: IrRouter,
}

impl<'s, P, G> Kernel<'s, P, G, IgnoreControl>
where
    P: Platform,
    G: Game,
{
    pub fn new(shared: &'s SharedState, platform: P, game: G) -> Self {
        Self {
            shared,
            platform,
            game,
            control: IgnoreControl,
            output: LoopOutput::new(),
            power: SleepScheduler::new(),
            router: IrRouter::new(),
        }
    }
}

impl<'s, P, G, C> Kernel<'s, P, G, C>
where
    P: Platform,
    G: Game,
    C: ControlHandler,
{
    /// Route kernel control packets to `control` instead of dropping them.
    pub fn with_control_handler<C2: ControlHandler>(self, control: C2) -> Kernel<'s, P, G, C2> {
        Kernel {
            shared: self.shared,
            platform: self.platform,
            game: self.game,
            control,
            output: self.output,
            power: self.power,
            router: self.router,
        }
    }

    /// Bring the drivers up, run the game's setup and arm the sleep timer.
    pub fn start(&mut self) {
        self.platform.ir().enable();
        self.platform.pixels().enable();
        self.platform.button().enable_pull_up();

        self.game.setup();

        // We just turned on
        self.shared.postpone_sleep();
        info!("kernel: started with {} faces", FACE_COUNT);
    }

    /// [`start`](Self::start), then iterate forever.
    pub fn run(mut self) -> ! {
        self.start();
        loop {
            self.step();
        }
    }

    /// One main-loop iteration.
    pub fn step(&mut self) {
        let millis = self.shared.clock.snapshot();

        self.router.process(self.platform.ir(), &mut self.control);

        let buttons = self.shared.buttons.grab_and_clear();
        let woke = self.power.take_woke();

        {
            let receiver: &P::Ir = self.platform.ir();
            let router = &self.router;
            let input = LoopInput {
                millis,
                buttons,
                ir: core::array::from_fn(|face| {
                    match router.user_payload(face, receiver.frame(face)) {
                        Some(data) => IrPayload { data, ready: true },
                        None => IrPayload::EMPTY,
                    }
                }),
                woke,
            };
            self.game.loop_step(&input, &mut self.output);
        }

        self.apply_output();

        if self.shared.sleep_timer.is_expired(millis) {
            self.power.sleep(&mut self.platform);
            // The wake edge itself may have been too short for the tick to see
            self.shared.postpone_sleep();
        }
    }

    fn apply_output(&mut self) {
        for face in self.output.take_acknowledged().iter() {
            self.router.release(self.platform.ir(), face);
        }

        let pixels = self.platform.pixels();
        for (face, color) in self.output.take_changed() {
            pixels.buffer_color(face, color);
        }
        pixels.present();
    }

    pub fn ir_stats(&self) -> &IrStats {
        self.router.stats()
    }

    pub fn power_state(&self) -> PowerState {
        self.power.state()
    }

    pub fn output(&self) -> &LoopOutput {
        &self.output
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn control_handler(&self) -> &C {
        &self.control
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
