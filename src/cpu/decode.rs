//! Instruction decoder for the Chip-8.
//!
//! Every instruction is a big-endian 16-bit word. The high nibble selects
//! the instruction family; the remaining 12 bits carry some mix of the
//! operand fields below:
//!
//! ```text
//!  15..12  11..8  7..4  3..0
//!  kind    x      y     n
//!          \---- nnn ------/
//!                 \-- nn --/
//! ```

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// A raw 16-bit instruction word.
///
/// Field accessors are pure; any value decodes into fields; only
/// [`decode`] judges validity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Opcode(pub u16);

impl Opcode {
    /// Compose an opcode from the two bytes at `[pc, pc + 2)`.
    pub const fn from_bytes(hi: u8, lo: u8) -> Self {
        Self(u16::from_be_bytes([hi, lo]))
    }

    /// Build `KNNN`.
    pub const fn from_nnn(kind: u8, nnn: u16) -> Self {
        Self(((kind as u16 & 0xF) << 12) | (nnn & 0x0FFF))
    }

    /// Build `KXNN`.
    pub const fn from_xnn(kind: u8, x: u8, nn: u8) -> Self {
        Self(((kind as u16 & 0xF) << 12) | ((x as u16 & 0xF) << 8) | nn as u16)
    }

    /// Build `KXYN`.
    pub const fn from_xyn(kind: u8, x: u8, y: u8, n: u8) -> Self {
        Self(
            ((kind as u16 & 0xF) << 12)
                | ((x as u16 & 0xF) << 8)
                | ((y as u16 & 0xF) << 4)
                | (n as u16 & 0xF),
        )
    }

    /// High nibble: instruction family.
    #[inline]
    pub const fn kind(self) -> u8 {
        (self.0 >> 12) as u8
    }

    /// Low 12 bits: absolute address.
    #[inline]
    pub const fn nnn(self) -> u16 {
        self.0 & 0x0FFF
    }

    /// Low 8 bits: immediate byte.
    #[inline]
    pub const fn nn(self) -> u8 {
        (self.0 & 0x00FF) as u8
    }

    /// Low 4 bits: immediate nibble.
    #[inline]
    pub const fn n(self) -> u8 {
        (self.0 & 0x000F) as u8
    }

    /// Bits 8-11: first register index.
    #[inline]
    pub const fn x(self) -> u8 {
        ((self.0 & 0x0F00) >> 8) as u8
    }

    /// Bits 4-7: second register index.
    #[inline]
    pub const fn y(self) -> u8 {
        ((self.0 & 0x00F0) >> 4) as u8
    }

    /// The two memory bytes this opcode occupies.
    pub const fn to_bytes(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }
}

impl std::fmt::Debug for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Opcode({:04X})", self.0)
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04X}", self.0)
    }
}

/// Decoded Chip-8 instruction.
///
/// Register operands are indices 0x0-0xF; addresses are 12-bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    // ==================== Display ====================

    /// 00E0: clear the display
    Cls,

    /// DXYN: draw an N-row sprite from [I] at (VX, VY), VF := collision
    Drw { x: u8, y: u8, n: u8 },

    // ==================== Control Flow ====================

    /// 00EE: return from subroutine
    Ret,

    /// 1NNN: PC := NNN
    Jp { addr: u16 },

    /// 2NNN: push PC, PC := NNN
    Call { addr: u16 },

    /// BNNN: PC := V0 + NNN
    JpV0 { addr: u16 },

    /// 3XNN: skip if VX == NN
    SeByte { x: u8, nn: u8 },

    /// 4XNN: skip if VX != NN
    SneByte { x: u8, nn: u8 },

    /// 5XY0: skip if VX == VY
    SeReg { x: u8, y: u8 },

    /// 9XY0: skip if VX != VY
    SneReg { x: u8, y: u8 },

    // ==================== Load / Arithmetic ====================

    /// 6XNN: VX := NN
    LdByte { x: u8, nn: u8 },

    /// 7XNN: VX := VX + NN (no flag)
    AddByte { x: u8, nn: u8 },

    /// 8XY0: VX := VY
    LdReg { x: u8, y: u8 },

    /// 8XY1: VX := VX | VY
    Or { x: u8, y: u8 },

    /// 8XY2: VX := VX & VY
    And { x: u8, y: u8 },

    /// 8XY3: VX := VX ^ VY
    Xor { x: u8, y: u8 },

    /// 8XY4: VX := VX + VY, VF := carry
    AddReg { x: u8, y: u8 },

    /// 8XY5: VX := VX - VY, VF := no borrow
    Sub { x: u8, y: u8 },

    /// 8XY6: VX := VY >> 1, VF := bit shifted out
    Shr { x: u8, y: u8 },

    /// 8XY7: VX := VY - VX, VF := no borrow
    Subn { x: u8, y: u8 },

    /// 8XYE: VX := VY << 1, VF := bit shifted out
    Shl { x: u8, y: u8 },

    /// CXNN: VX := random byte & NN
    Rnd { x: u8, nn: u8 },

    // ==================== Index Register ====================

    /// ANNN: I := NNN
    LdI { addr: u16 },

    /// FX1E: I := I + VX
    AddI { x: u8 },

    /// FX29: I := address of the font sprite for digit VX
    LdFont { x: u8 },

    // ==================== Memory ====================

    /// FX33: [I..I+3] := BCD of VX
    LdBcd { x: u8 },

    /// FX55: [I..=I+X] := V0..=VX, I := I + X + 1
    StoreRegs { x: u8 },

    /// FX65: V0..=VX := [I..=I+X], I := I + X + 1
    LoadRegs { x: u8 },

    // ==================== Keyboard ====================

    /// EX9E: skip if key VX is pressed
    Skp { x: u8 },

    /// EXA1: skip if key VX is not pressed
    Sknp { x: u8 },

    /// FX0A: wait for a key press, VX := key
    WaitKey { x: u8 },

    // ==================== Timers ====================

    /// FX07: VX := delay timer
    LdVxDt { x: u8 },

    /// FX15: delay timer := VX
    LdDtVx { x: u8 },

    /// FX18: sound timer := VX
    LdStVx { x: u8 },
}

/// Decode a 16-bit instruction word.
pub fn decode(op: Opcode) -> Result<Instruction, DecodeError> {
    let (x, y, n, nn, addr) = (op.x(), op.y(), op.n(), op.nn(), op.nnn());

    let instruction = match op.kind() {
        0x0 => match addr {
            0x0E0 => Instruction::Cls,
            0x0EE => Instruction::Ret,
            _ => return Err(DecodeError::InvalidOpcode(op)),
        },
        0x1 => Instruction::Jp { addr },
        0x2 => Instruction::Call { addr },
        0x3 => Instruction::SeByte { x, nn },
        0x4 => Instruction::SneByte { x, nn },
        0x5 if n == 0 => Instruction::SeReg { x, y },
        0x6 => Instruction::LdByte { x, nn },
        0x7 => Instruction::AddByte { x, nn },
        0x8 => match n {
            0x0 => Instruction::LdReg { x, y },
            0x1 => Instruction::Or { x, y },
            0x2 => Instruction::And { x, y },
            0x3 => Instruction::Xor { x, y },
            0x4 => Instruction::AddReg { x, y },
            0x5 => Instruction::Sub { x, y },
            0x6 => Instruction::Shr { x, y },
            0x7 => Instruction::Subn { x, y },
            0xE => Instruction::Shl { x, y },
            _ => return Err(DecodeError::InvalidOpcode(op)),
        },
        0x9 if n == 0 => Instruction::SneReg { x, y },
        0xA => Instruction::LdI { addr },
        0xB => Instruction::JpV0 { addr },
        0xC => Instruction::Rnd { x, nn },
        0xD => Instruction::Drw { x, y, n },
        0xE => match nn {
            0x9E => Instruction::Skp { x },
            0xA1 => Instruction::Sknp { x },
            _ => return Err(DecodeError::InvalidOpcode(op)),
        },
        0xF => match nn {
            0x07 => Instruction::LdVxDt { x },
            0x0A => Instruction::WaitKey { x },
            0x15 => Instruction::LdDtVx { x },
            0x18 => Instruction::LdStVx { x },
            0x1E => Instruction::AddI { x },
            0x29 => Instruction::LdFont { x },
            0x33 => Instruction::LdBcd { x },
            0x55 => Instruction::StoreRegs { x },
            0x65 => Instruction::LoadRegs { x },
            _ => return Err(DecodeError::InvalidOpcode(op)),
        },
        _ => return Err(DecodeError::InvalidOpcode(op)),
    };

    Ok(instruction)
}

/// Encode an instruction back to its 16-bit word.
pub fn encode(instr: &Instruction) -> Opcode {
    match *instr {
        Instruction::Cls => Opcode(0x00E0),
        Instruction::Ret => Opcode(0x00EE),
        Instruction::Jp { addr } => Opcode::from_nnn(0x1, addr),
        Instruction::Call { addr } => Opcode::from_nnn(0x2, addr),
        Instruction::SeByte { x, nn } => Opcode::from_xnn(0x3, x, nn),
        Instruction::SneByte { x, nn } => Opcode::from_xnn(0x4, x, nn),
        Instruction::SeReg { x, y } => Opcode::from_xyn(0x5, x, y, 0x0),
        Instruction::LdByte { x, nn } => Opcode::from_xnn(0x6, x, nn),
        Instruction::AddByte { x, nn } => Opcode::from_xnn(0x7, x, nn),
        Instruction::LdReg { x, y } => Opcode::from_xyn(0x8, x, y, 0x0),
        Instruction::Or { x, y } => Opcode::from_xyn(0x8, x, y, 0x1),
        Instruction::And { x, y } => Opcode::from_xyn(0x8, x, y, 0x2),
        Instruction::Xor { x, y } => Opcode::from_xyn(0x8, x, y, 0x3),
        Instruction::AddReg { x, y } => Opcode::from_xyn(0x8, x, y, 0x4),
        Instruction::Sub { x, y } => Opcode::from_xyn(0x8, x, y, 0x5),
        Instruction::Shr { x, y } => Opcode::from_xyn(0x8, x, y, 0x6),
        Instruction::Subn { x, y } => Opcode::from_xyn(0x8, x, y, 0x7),
        Instruction::Shl { x, y } => Opcode::from_xyn(0x8, x, y, 0xE),
        Instruction::SneReg { x, y } => Opcode::from_xyn(0x9, x, y, 0x0),
        Instruction::LdI { addr } => Opcode::from_nnn(0xA, addr),
        Instruction::JpV0 { addr } => Opcode::from_nnn(0xB, addr),
        Instruction::Rnd { x, nn } => Opcode::from_xnn(0xC, x, nn),
        Instruction::Drw { x, y, n } => Opcode::from_xyn(0xD, x, y, n),
        Instruction::Skp { x } => Opcode::from_xnn(0xE, x, 0x9E),
        Instruction::Sknp { x } => Opcode::from_xnn(0xE, x, 0xA1),
        Instruction::LdVxDt { x } => Opcode::from_xnn(0xF, x, 0x07),
        Instruction::WaitKey { x } => Opcode::from_xnn(0xF, x, 0x0A),
        Instruction::LdDtVx { x } => Opcode::from_xnn(0xF, x, 0x15),
        Instruction::LdStVx { x } => Opcode::from_xnn(0xF, x, 0x18),
        Instruction::AddI { x } => Opcode::from_xnn(0xF, x, 0x1E),
        Instruction::LdFont { x } => Opcode::from_xnn(0xF, x, 0x29),
        Instruction::LdBcd { x } => Opcode::from_xnn(0xF, x, 0x33),
        Instruction::StoreRegs { x } => Opcode::from_xnn(0xF, x, 0x55),
        Instruction::LoadRegs { x } => Opcode::from_xnn(0xF, x, 0x65),
    }
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid opcode: {0}")]
    InvalidOpcode(Opcode),
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_field_extraction() {
        let op = Opcode(0xD12A);
        assert_eq!(op.kind(), 0xD);
        assert_eq!(op.x(), 0x1);
        assert_eq!(op.y(), 0x2);
        assert_eq!(op.n(), 0xA);
        assert_eq!(op.nn(), 0x2A);
        assert_eq!(op.nnn(), 0x12A);
    }

    #[test]
    fn test_from_bytes_is_big_endian() {
        assert_eq!(Opcode::from_bytes(0xA2, 0xF0), Opcode(0xA2F0));
        assert_eq!(Opcode(0xA2F0).to_bytes(), [0xA2, 0xF0]);
    }

    #[test]
    fn test_decode_known_forms() {
        assert_eq!(decode(Opcode(0x00E0)).unwrap(), Instruction::Cls);
        assert_eq!(decode(Opcode(0x00EE)).unwrap(), Instruction::Ret);
        assert_eq!(decode(Opcode(0x1ABC)).unwrap(), Instruction::Jp { addr: 0xABC });
        assert_eq!(decode(Opcode(0x8AB4)).unwrap(), Instruction::AddReg { x: 0xA, y: 0xB });
        assert_eq!(decode(Opcode(0x8ABE)).unwrap(), Instruction::Shl { x: 0xA, y: 0xB });
        assert_eq!(decode(Opcode(0xD015)).unwrap(), Instruction::Drw { x: 0, y: 1, n: 5 });
        assert_eq!(decode(Opcode(0xE39E)).unwrap(), Instruction::Skp { x: 3 });
        assert_eq!(decode(Opcode(0xF50A)).unwrap(), Instruction::WaitKey { x: 5 });
        assert_eq!(decode(Opcode(0xF765)).unwrap(), Instruction::LoadRegs { x: 7 });
    }

    #[test]
    fn test_decode_rejects_unknown_selectors() {
        for raw in [0x0000, 0x0FFF, 0x00E1, 0x5121, 0x8128, 0x812F, 0x9121, 0xE19F, 0xF000, 0xF1FF] {
            assert_eq!(
                decode(Opcode(raw)),
                Err(DecodeError::InvalidOpcode(Opcode(raw))),
                "{raw:04X} should be invalid"
            );
        }
    }

    #[test]
    fn test_encode_matches_documented_words() {
        assert_eq!(encode(&Instruction::LdByte { x: 0xA, nn: 0x42 }), Opcode(0x6A42));
        assert_eq!(encode(&Instruction::Subn { x: 1, y: 2 }), Opcode(0x8127));
        assert_eq!(encode(&Instruction::LdBcd { x: 0xC }), Opcode(0xFC33));
    }

    proptest! {
        #[test]
        fn prop_fields_reassemble(raw in any::<u16>()) {
            let op = Opcode(raw);
            prop_assert_eq!(Opcode::from_xyn(op.kind(), op.x(), op.y(), op.n()), op);
            prop_assert_eq!(Opcode::from_xnn(op.kind(), op.x(), op.nn()), op);
            prop_assert_eq!(Opcode::from_nnn(op.kind(), op.nnn()), op);
        }

        #[test]
        fn prop_encode_inverts_decode(raw in any::<u16>()) {
            if let Ok(instr) = decode(Opcode(raw)) {
                prop_assert_eq!(encode(&instr), Opcode(raw));
            }
        }
    }
}
