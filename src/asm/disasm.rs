//! Disassembler for Chip-8 programs.
//!
//! Converts raw instruction words back to readable assembly using the
//! conventional mnemonics (`LD`, `ADD`, `SE`, `DRW`, ...).

use crate::cpu::decode::{decode, Instruction, Opcode};

/// Disassemble a single instruction to text.
pub fn disassemble_instruction(op: Opcode) -> String {
    match decode(op) {
        Ok(decoded) => format_instruction(&decoded),
        Err(_) => format!("??? ; {}", op),
    }
}

/// Disassemble a program image loaded at `origin`.
///
/// Words are read in pairs from the start; a trailing odd byte is listed
/// as data.
pub fn disassemble(bytes: &[u8], origin: u16) -> String {
    let mut output = String::new();
    output.push_str("; Chip-8 Disassembly\n");
    output.push_str("; ------------------\n\n");

    let mut words = bytes.chunks_exact(2);
    let mut addr = origin as usize;
    for pair in &mut words {
        let op = Opcode::from_bytes(pair[0], pair[1]);
        let line = disassemble_instruction(op);
        output.push_str(&format!("{:#05x}: {}  {}\n", addr, op, line));
        addr += 2;
    }
    if let [last] = words.remainder() {
        output.push_str(&format!("{:#05x}: {:02X}    DB {:#04x}\n", addr, last, last));
    }

    output
}

/// Format a decoded instruction as assembly text.
pub fn format_instruction(instr: &Instruction) -> String {
    match *instr {
        // Display
        Instruction::Cls => "CLS".to_string(),
        Instruction::Drw { x, y, n } => format!("DRW V{:X}, V{:X}, {}", x, y, n),

        // Control
        Instruction::Ret => "RET".to_string(),
        Instruction::Jp { addr } => format!("JP {:#05x}", addr),
        Instruction::Call { addr } => format!("CALL {:#05x}", addr),
        Instruction::JpV0 { addr } => format!("JP V0, {:#05x}", addr),
        Instruction::SeByte { x, nn } => format!("SE V{:X}, {:#04x}", x, nn),
        Instruction::SneByte { x, nn } => format!("SNE V{:X}, {:#04x}", x, nn),
        Instruction::SeReg { x, y } => format!("SE V{:X}, V{:X}", x, y),
        Instruction::SneReg { x, y } => format!("SNE V{:X}, V{:X}", x, y),

        // Load / arithmetic
        Instruction::LdByte { x, nn } => format!("LD V{:X}, {:#04x}", x, nn),
        Instruction::AddByte { x, nn } => format!("ADD V{:X}, {:#04x}", x, nn),
        Instruction::LdReg { x, y } => format!("LD V{:X}, V{:X}", x, y),
        Instruction::Or { x, y } => format!("OR V{:X}, V{:X}", x, y),
        Instruction::And { x, y } => format!("AND V{:X}, V{:X}", x, y),
        Instruction::Xor { x, y } => format!("XOR V{:X}, V{:X}", x, y),
        Instruction::AddReg { x, y } => format!("ADD V{:X}, V{:X}", x, y),
        Instruction::Sub { x, y } => format!("SUB V{:X}, V{:X}", x, y),
        Instruction::Shr { x, y } => format!("SHR V{:X}, V{:X}", x, y),
        Instruction::Subn { x, y } => format!("SUBN V{:X}, V{:X}", x, y),
        Instruction::Shl { x, y } => format!("SHL V{:X}, V{:X}", x, y),
        Instruction::Rnd { x, nn } => format!("RND V{:X}, {:#04x}", x, nn),

        // Index / memory
        Instruction::LdI { addr } => format!("LD I, {:#05x}", addr),
        Instruction::AddI { x } => format!("ADD I, V{:X}", x),
        Instruction::LdFont { x } => format!("LD F, V{:X}", x),
        Instruction::LdBcd { x } => format!("LD B, V{:X}", x),
        Instruction::StoreRegs { x } => format!("LD [I], V{:X}", x),
        Instruction::LoadRegs { x } => format!("LD V{:X}, [I]", x),

        // Keyboard
        Instruction::Skp { x } => format!("SKP V{:X}", x),
        Instruction::Sknp { x } => format!("SKNP V{:X}", x),
        Instruction::WaitKey { x } => format!("LD V{:X}, K", x),

        // Timers
        Instruction::LdVxDt { x } => format!("LD V{:X}, DT", x),
        Instruction::LdDtVx { x } => format!("LD DT, V{:X}", x),
        Instruction::LdStVx { x } => format!("LD ST, V{:X}", x),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disassemble_instruction() {
        assert_eq!(disassemble_instruction(Opcode(0x00E0)), "CLS");
        assert_eq!(disassemble_instruction(Opcode(0x6A2B)), "LD VA, 0x2b");
        assert_eq!(disassemble_instruction(Opcode(0xA2F0)), "LD I, 0x2f0");
        assert_eq!(disassemble_instruction(Opcode(0xD015)), "DRW V0, V1, 5");
        assert_eq!(disassemble_instruction(Opcode(0xF30A)), "LD V3, K");
        assert_eq!(disassemble_instruction(Opcode(0x0FFF)), "??? ; 0FFF");
    }

    #[test]
    fn test_disassemble_listing() {
        let listing = disassemble(&[0x00, 0xE0, 0x12, 0x00, 0xAB], 0x200);
        let lines: Vec<&str> = listing.lines().skip(3).collect();

        assert_eq!(lines[0], "0x200: 00E0  CLS");
        assert_eq!(lines[1], "0x202: 1200  JP 0x200");
        assert_eq!(lines[2], "0x204: AB    DB 0xab");
    }
}
