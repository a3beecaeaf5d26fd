//! Recording platform and game for driving the kernel on the host.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use tilekernel::color::PixelColor;
use tilekernel::config::{FACE_COUNT, TICK_PERIOD_US};
use tilekernel::game::Game;
use tilekernel::hal::{ButtonDriver, IrDriver, PixelDriver, Platform};
use tilekernel::ir::ControlHandler;
use tilekernel::kernel::{SharedState, TickContext};
use tilekernel::loopstate::{LoopInput, LoopOutput};

/// Driver calls in the order they happened, across all drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    IrEnable,
    IrDisable,
    IrMarkRead(usize),
    PixelsEnable,
    PixelsDisable,
    PixelWrite(usize, PixelColor),
    Present,
    PullUp,
    WakeOn,
    WakeOff,
    Sleep,
}

pub type EventLog = Rc<RefCell<Vec<Event>>>;

pub struct MockIr {
    frames: [Vec<u8>; FACE_COUNT],
    ready: [bool; FACE_COUNT],
    pub enabled: bool,
    log: EventLog,
}

impl MockIr {
    pub fn inject(&mut self, face: usize, frame: &[u8]) {
        assert!(!self.ready[face], "driver would not complete a frame into a busy slot");
        self.frames[face] = frame.to_vec();
        self.ready[face] = true;
    }

    pub fn is_ready(&self, face: usize) -> bool {
        self.ready[face]
    }
}

impl IrDriver for MockIr {
    fn is_frame_ready(&self, face: usize) -> bool {
        self.ready[face]
    }

    fn frame(&self, face: usize) -> &[u8] {
        &self.frames[face]
    }

    fn mark_read(&mut self, face: usize) {
        self.ready[face] = false;
        self.log.borrow_mut().push(Event::IrMarkRead(face));
    }

    fn enable(&mut self) {
        self.enabled = true;
        self.log.borrow_mut().push(Event::IrEnable);
    }

    fn disable(&mut self) {
        self.enabled = false;
        self.log.borrow_mut().push(Event::IrDisable);
    }
}

pub struct MockPixels {
    pub enabled: bool,
    pub presents: usize,
    log: EventLog,
}

impl PixelDriver for MockPixels {
    fn buffer_color(&mut self, face: usize, color: PixelColor) {
        self.log.borrow_mut().push(Event::PixelWrite(face, color));
    }

    fn present(&mut self) {
        self.presents += 1;
        self.log.borrow_mut().push(Event::Present);
    }

    fn enable(&mut self) {
        self.enabled = true;
        self.log.borrow_mut().push(Event::PixelsEnable);
    }

    fn disable(&mut self) {
        self.enabled = false;
        self.log.borrow_mut().push(Event::PixelsDisable);
    }
}

pub struct MockButton {
    pub wake_armed: bool,
    log: EventLog,
}

impl ButtonDriver for MockButton {
    fn enable_pull_up(&mut self) {
        self.log.borrow_mut().push(Event::PullUp);
    }

    fn wake_interrupt_on(&mut self) {
        self.wake_armed = true;
        self.log.borrow_mut().push(Event::WakeOn);
    }

    fn wake_interrupt_off(&mut self) {
        self.wake_armed = false;
        self.log.borrow_mut().push(Event::WakeOff);
    }
}

/// Driver state observed from inside the sleep primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsleepView {
    pub ir_enabled: bool,
    pub pixels_enabled: bool,
    pub wake_armed: bool,
}

pub struct MockPlatform {
    pub ir: MockIr,
    pub pixels: MockPixels,
    pub button: MockButton,
    pub sleeps: Vec<AsleepView>,
    pub log: EventLog,
}

impl MockPlatform {
    pub fn new() -> Self {
        let log: EventLog = Rc::new(RefCell::new(Vec::new()));
        Self {
            ir: MockIr {
                frames: Default::default(),
                ready: [false; FACE_COUNT],
                enabled: false,
                log: log.clone(),
            },
            pixels: MockPixels {
                enabled: false,
                presents: 0,
                log: log.clone(),
            },
            button: MockButton {
                wake_armed: false,
                log: log.clone(),
            },
            sleeps: Vec::new(),
            log,
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.log.borrow().clone()
    }

    pub fn clear_events(&self) {
        self.log.borrow_mut().clear();
    }
}

impl Platform for MockPlatform {
    type Ir = MockIr;
    type Pixels = MockPixels;
    type Button = MockButton;

    fn ir(&mut self) -> &mut MockIr {
        &mut self.ir
    }

    fn pixels(&mut self) -> &mut MockPixels {
        &mut self.pixels
    }

    fn button(&mut self) -> &mut MockButton {
        &mut self.button
    }

    /// Returns at once, as if a button edge had fired.
    fn power_sleep(&mut self) {
        self.sleeps.push(AsleepView {
            ir_enabled: self.ir.enabled,
            pixels_enabled: self.pixels.enabled,
            wake_armed: self.button.wake_armed,
        });
        self.log.borrow_mut().push(Event::Sleep);
    }
}

/// What the game saw in one iteration.
#[derive(Debug, Clone)]
pub struct Seen {
    pub millis: u32,
    pub flags: tilekernel::button::ButtonFlags,
    pub click_count: u8,
    pub down: bool,
    pub ir: Vec<Option<Vec<u8>>>,
    pub woke: bool,
}

type Script = Box<dyn FnMut(&LoopInput<'_>, &mut LoopOutput)>;

/// Game that records every input and optionally runs a script.
pub struct RecordingGame {
    pub setups: usize,
    pub seen: Vec<Seen>,
    script: Option<Script>,
}

impl RecordingGame {
    pub fn new() -> Self {
        Self {
            setups: 0,
            seen: Vec::new(),
            script: None,
        }
    }

    pub fn scripted(script: impl FnMut(&LoopInput<'_>, &mut LoopOutput) + 'static) -> Self {
        Self {
            script: Some(Box::new(script)),
            ..Self::new()
        }
    }

    pub fn last(&self) -> &Seen {
        self.seen.last().expect("game was never stepped")
    }
}

impl Game for RecordingGame {
    fn setup(&mut self) {
        self.setups += 1;
    }

    fn loop_step(&mut self, input: &LoopInput<'_>, output: &mut LoopOutput) {
        self.seen.push(Seen {
            millis: input.millis,
            flags: input.buttons.flags,
            click_count: input.buttons.click_count,
            down: input.buttons.down,
            ir: input
                .ir
                .iter()
                .map(|p| p.ready.then(|| p.data.to_vec()))
                .collect(),
            woke: input.woke,
        });
        if let Some(script) = self.script.as_mut() {
            script(input, output);
        }
    }
}

#[derive(Default)]
pub struct RecordingControl {
    pub packets: Vec<(usize, Vec<u8>)>,
}

impl ControlHandler for RecordingControl {
    fn on_control(&mut self, face: usize, body: &[u8]) {
        self.packets.push((face, body.to_vec()));
    }
}

/// Fire ticks until the clock has advanced by `ms`, holding the button at
/// `pressed`.
pub fn run_ms(tick: &mut TickContext, shared: &SharedState, ms: u32, pressed: bool) {
    let target = shared.clock.snapshot().wrapping_add(ms);
    let mut guard = 0u32;
    while shared.clock.snapshot() != target {
        tick.on_tick(shared, pressed);
        guard += 1;
        assert!(guard <= (ms + 1) * 1000 / TICK_PERIOD_US + 1, "clock stalled");
    }
}
