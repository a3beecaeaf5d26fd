//! # Game Contract
//!
//! The only surface the kernel exposes outward. A game is set up once,
//! then stepped once per main-loop iteration:
//!
//! ```text
//!  Kernel::start()                 Kernel::step()  (forever)
//!   └─► Game::setup()               ├─► build LoopInput
//!                                   ├─► Game::loop_step(&input, &mut output)
//!                                   └─► apply output
//! ```
//!
//! The game only ever sees validated data. Malformed infrared frames,
//! unknown headers and control packets are absorbed by the kernel before
//! `loop_step` runs, and nothing the kernel does can fail into the game.

use crate::loopstate::{LoopInput, LoopOutput};

pub trait Game {
    /// Called once after the drivers are enabled and before the first
    /// iteration.
    fn setup(&mut self) {}

    /// Called once per iteration. Runs to completion before the kernel
    /// applies `output` or considers sleeping.
    ///
    /// To consume a user frame shown in `input.ir[face]`, call
    /// [`LoopOutput::acknowledge`] for that face.
    fn loop_step(&mut self, input: &LoopInput<'_>, output: &mut LoopOutput);
}
