//! Chip-8 memory subsystem.
//!
//! 4 KiB of byte-addressable RAM. The first 512 bytes belong to the
//! interpreter and hold the built-in hex-digit font; programs are loaded
//! at 0x200.

use thiserror::Error;

/// Total addressable memory in bytes.
pub const MEMORY_SIZE: usize = 4096;

/// Address at which programs are loaded and execution begins.
pub const PROGRAM_START: u16 = 0x200;

/// Address of the first built-in font sprite.
pub const FONT_START: u16 = 0x050;

/// Height in bytes (rows) of each font sprite.
pub const FONT_SPRITE_LEN: u16 = 5;

/// Hex digit sprites 0-F, 4 pixels wide, 5 rows each.
pub const FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// Chip-8 memory: 4096 bytes with the font pre-loaded.
#[derive(Clone)]
pub struct Memory {
    bytes: Vec<u8>,
}

impl Memory {
    /// Create a new memory image with the font installed and everything
    /// else zeroed.
    pub fn new() -> Self {
        let mut bytes = vec![0u8; MEMORY_SIZE];
        let font = FONT_START as usize;
        bytes[font..font + FONT.len()].copy_from_slice(&FONT);
        Self { bytes }
    }

    /// Read a single byte.
    #[inline]
    pub fn read(&self, addr: u16) -> Result<u8, MemoryError> {
        self.bytes
            .get(addr as usize)
            .copied()
            .ok_or(MemoryError::AddressOutOfRange { addr, len: 1 })
    }

    /// Read a big-endian 16-bit word from `[addr, addr + 2)`.
    pub fn read_word(&self, addr: u16) -> Result<u16, MemoryError> {
        let pair = self.slice(addr, 2)?;
        Ok(u16::from_be_bytes([pair[0], pair[1]]))
    }

    /// Borrow `len` bytes starting at `addr`.
    ///
    /// The whole range must lie inside memory; nothing is clamped.
    pub fn slice(&self, addr: u16, len: usize) -> Result<&[u8], MemoryError> {
        let range = Self::range(addr, len)?;
        Ok(&self.bytes[range])
    }

    /// Mutably borrow `len` bytes starting at `addr`.
    pub fn slice_mut(&mut self, addr: u16, len: usize) -> Result<&mut [u8], MemoryError> {
        let range = Self::range(addr, len)?;
        Ok(&mut self.bytes[range])
    }

    fn range(addr: u16, len: usize) -> Result<std::ops::Range<usize>, MemoryError> {
        let start = addr as usize;
        let end = start + len;
        if end > MEMORY_SIZE {
            return Err(MemoryError::AddressOutOfRange { addr, len });
        }
        Ok(start..end)
    }

    /// Restore the power-on image: zeroes plus font.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Copy a program image into memory at [`PROGRAM_START`].
    ///
    /// The size is checked before any byte is written, so a rejected image
    /// leaves memory untouched.
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), MemoryError> {
        let start = PROGRAM_START as usize;
        let available = MEMORY_SIZE - start;
        if program.len() > available {
            return Err(MemoryError::ProgramTooLarge {
                size: program.len(),
                available,
            });
        }

        self.bytes[start..start + program.len()].copy_from_slice(program);
        Ok(())
    }

    /// `(address, byte)` pairs for `[start, start + count)`, clamped to
    /// the end of memory. Feeds the debugger's memory view.
    pub fn dump(&self, start: usize, count: usize) -> Vec<(usize, u8)> {
        let end = (start + count).min(MEMORY_SIZE);
        (start.min(end)..end)
            .map(|i| (i, self.bytes[i]))
            .collect()
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let program = &self.bytes[PROGRAM_START as usize..];
        let non_zero = program.iter().filter(|b| **b != 0).count();

        f.debug_struct("Memory")
            .field("non_zero_program_bytes", &non_zero)
            .field("total_bytes", &MEMORY_SIZE)
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// Access of `len` bytes at `addr` runs past the end of memory.
    #[error("memory access of {len} byte(s) at {addr:#05x} out of range (0x000-0xfff)")]
    AddressOutOfRange { addr: u16, len: usize },

    /// Program does not fit between the load address and the end of memory.
    #[error("program size {size} exceeds available space {available}")]
    ProgramTooLarge { size: usize, available: usize },
}
