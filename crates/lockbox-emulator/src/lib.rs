//! Lockbox emulator crate providing the lock controller.
//!
//! This crate ties the keypad pipeline to the lock-access state machine and
//! the display renderer, and runs them on any [`LineIo`](lockbox_hardware::LineIo)
//! driver and [`Delay`](lockbox_hardware::Delay).

pub mod display;
pub mod lockbox;
pub mod script;
pub mod state_machine;

pub use display::{Screen, describe, render, render_over, render_screen};
pub use lockbox::{Lockbox, LockboxBuilder, Tick};
pub use script::{Typist, parse_keys};
pub use state_machine::{
    LockState, MAX_HISTORY_SIZE, StateMachine, StateMachineBuilder, StateTransition,
};
