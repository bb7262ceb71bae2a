//! seasongrace library crate: re-exports all modules for integration testing.
//!
//! The binary crate (`main.rs`) runs a headless farm simulation.
//! This library crate exposes the same modules so that `tests/` integration
//! tests can drive the day cycle through a Bevy `App` without a window.

pub mod shared;
pub mod calendar;
pub mod config;
pub mod grace;
pub mod farming;
pub mod data;
pub mod save;
