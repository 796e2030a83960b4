//! Terminal front-end for the Chip-8 emulator.
//!
//! Provides an interactive terminal player with:
//! - Half-block rendering of the 64x32 framebuffer
//! - Keyboard-to-keypad mapping
//! - Register and disassembly panels
//! - Pause/step/reset controls

mod app;
mod ui;
pub mod keymap;

pub use app::{EmulatorApp, run_terminal};
