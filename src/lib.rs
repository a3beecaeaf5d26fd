//! # Tile OS: a main-loop kernel for face-communicating LED tiles
//!
//! A tile has a button, a pixel on each face and an infrared transceiver
//! on each face. This crate sits between the board's drivers and a game:
//! it turns asynchronous interrupt-time events into one synchronous,
//! immutable input per main-loop iteration, applies the game's output to
//! the display, and puts the tile to sleep when nobody touches it.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                   Game (game.rs)                        │
//! │          setup() · loop_step(&LoopInput, &mut LoopOutput)│
//! ├────────────────────────────────────────────────────────┤
//! │            Main Loop Orchestrator (kernel.rs)           │
//! │      snapshot → IR → buttons → game → pixels → sleep?   │
//! ├──────────────┬──────────────┬─────────────┬────────────┤
//! │  Time Base   │ Button Bridge│ IR Protocol │ Power      │
//! │  time.rs     │ button.rs    │ ir.rs       │ power.rs   │
//! │  timer.rs    │              │             │            │
//! ├──────────────┴──────────────┴─────────────┴────────────┤
//! │  Platform traits (hal.rs) · Sync (sync.rs)              │
//! ├────────────────────────────────────────────────────────┤
//! │            Arch Port (arch/cortex_m4.rs)                │
//! │        SysTick · low-power wait · EXTI wake             │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Execution Contexts
//!
//! - **Interrupt**: the fixed-period timer. Services the infrared
//!   receivers every period; every second period it also advances the
//!   millisecond clock, tracks button gestures and re-arms the sleep
//!   timer on activity.
//!   Bounded work, no blocking, no logging.
//! - **Main**: a single cooperative loop. Validates infrared frames,
//!   takes snapshots, runs the game, drives the display, sleeps.
//!
//! The two share a [`kernel::SharedState`] of atomics. The only
//! synchronization primitive is a critical section (see [`sync`]), taken
//! twice per iteration and for a few instructions each time.
//!
//! ## Memory Model
//!
//! - **No heap**: all state is statically sized
//! - **No `alloc`**: pure `core` only
//! - **Face-indexed arrays**: `[T; FACE_COUNT]`

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod sync;
pub mod time;
pub mod timer;
pub mod button;
pub mod color;
pub mod ir;
pub mod hal;
pub mod loopstate;
pub mod game;
pub mod power;
pub mod kernel;
pub mod arch;
