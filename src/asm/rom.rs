//! ROM image loading.
//!
//! A Chip-8 ROM is the raw program bytes: no header, no magic number, no
//! length prefix. The file size is the program size and must fit between
//! 0x200 and the end of memory.

use crate::cpu::memory::{MEMORY_SIZE, PROGRAM_START};
use std::path::Path;
use thiserror::Error;

/// Largest program that fits in memory.
pub const MAX_ROM_SIZE: usize = MEMORY_SIZE - PROGRAM_START as usize;

/// Read a ROM image from disk and check it fits in program space.
pub fn load_rom<P: AsRef<Path>>(path: P) -> Result<Vec<u8>, RomError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .map_err(|e| RomError::IoError(format!("{}: {}", path.display(), e)))?;
    validate_rom(&bytes)?;
    log::info!("read {} byte ROM from {}", bytes.len(), path.display());
    Ok(bytes)
}

/// Check an in-memory image without touching disk.
pub fn validate_rom(bytes: &[u8]) -> Result<(), RomError> {
    if bytes.is_empty() {
        return Err(RomError::Empty);
    }
    if bytes.len() > MAX_ROM_SIZE {
        return Err(RomError::TooLarge { size: bytes.len(), max: MAX_ROM_SIZE });
    }
    Ok(())
}

/// Errors that can occur while loading a ROM.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RomError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("ROM is empty")]
    Empty,

    #[error("ROM size {size} exceeds program space {max}")]
    TooLarge { size: usize, max: usize },
}
