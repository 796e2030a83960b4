//! # Chip-8 Emulator
//!
//! An interpreter for the Chip-8 virtual machine of the late 1970s.
//!
//! The machine is tiny: 4 KiB of memory, sixteen 8-bit registers, a
//! 64×32 monochrome screen and a hex keypad. The [`cpu`] module holds the
//! machine itself. [`driver`] paces it against the 60 Hz timers, and the
//! front-ends (terminal and WebAssembly) sit on top of the driver.

pub mod cpu;
pub mod asm;
pub mod config;
pub mod driver;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use cpu::{Cpu, CpuState, CpuError, Memory, Registers, Instruction, Opcode, Display};
pub use asm::{disassemble, load_rom, RomError};
pub use config::{Config, ConfigError};
pub use driver::{Driver, Frame};

#[cfg(feature = "tui")]
pub use tui::run_terminal;
