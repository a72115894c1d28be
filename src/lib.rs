#![cfg_attr(not(test), no_std)]

pub mod clock;
pub mod config;
pub mod feedback;
pub mod keymap;
pub mod protocol;
pub mod sensor;
pub mod sequencer;
pub mod session;
pub mod terminal;
pub mod users;

// These modules depend on embassy-time and esp-hal, only available with the embedded feature
#[cfg(feature = "embedded")]
pub mod tasks;
