//! Program tooling for Chip-8 images.
//!
//! This module provides:
//! - ROM loading (raw big-endian program bytes)
//! - A disassembler (instruction words → readable text)

pub mod disasm;
pub mod rom;

pub use disasm::{disassemble, disassemble_instruction};
pub use rom::{load_rom, validate_rom, RomError, MAX_ROM_SIZE};
