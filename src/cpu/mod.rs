//! CPU emulation for the Chip-8.
//!
//! This module implements the complete Chip-8 virtual machine:
//! - 4096 bytes of memory with the hex font at 0x050
//! - 16 eight-bit registers V0-VF, the index register I and the PC
//! - a 16-deep call stack, delay and sound timers
//! - a 64x32 monochrome framebuffer and a 16-key hex keypad
//! - the 35-instruction classic instruction set

pub mod memory;
pub mod registers;
pub mod decode;
pub mod display;
pub mod keypad;
pub mod execute;

pub use memory::{Memory, MemoryError};
pub use registers::Registers;
pub use decode::{Instruction, Opcode, DecodeError};
pub use display::Display;
pub use keypad::{Keypad, KeypadError};
pub use execute::{Cpu, CpuError, CpuState, Snapshot};
