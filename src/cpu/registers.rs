//! Chip-8 CPU registers.
//!
//! The register file consists of:
//! - V0-VF: sixteen 8-bit general registers (VF doubles as the flag register)
//! - I: 16-bit index register used for memory addressing
//! - PC: 16-bit program counter
//! - a 16-entry call stack with its stack pointer
//! - delay and sound timers, counted down by the 60 Hz tick

use crate::cpu::memory::PROGRAM_START;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Number of general-purpose registers.
pub const NUM_REGISTERS: usize = 16;

/// Maximum call depth.
pub const STACK_DEPTH: usize = 16;

/// Index of the flag register VF.
pub const VF: usize = 0xF;

/// The Chip-8 register file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// V0-VF general registers.
    pub v: [u8; NUM_REGISTERS],

    /// I: index register.
    pub i: u16,

    /// PC: address of the next instruction to fetch.
    pub pc: u16,

    /// Return addresses. Only `stack[..sp]` is live.
    pub stack: [u16; STACK_DEPTH],

    /// Number of live return addresses on the stack.
    pub sp: u8,

    /// Delay timer, decremented once per tick until zero.
    pub delay_timer: u8,

    /// Sound timer; a tone plays while it is non-zero.
    pub sound_timer: u8,
}

impl Registers {
    /// Create a register file with everything zeroed and PC at the
    /// program entry point.
    pub fn new() -> Self {
        Self {
            v: [0; NUM_REGISTERS],
            i: 0,
            pc: PROGRAM_START,
            stack: [0; STACK_DEPTH],
            sp: 0,
            delay_timer: 0,
            sound_timer: 0,
        }
    }

    /// Reset all registers to their power-on values.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Advance the program counter past one instruction.
    /// Returns the old value.
    pub fn advance_pc(&mut self) -> u16 {
        let old = self.pc;
        self.pc = self.pc.wrapping_add(2);
        old
    }

    /// Skip the next instruction.
    pub fn skip(&mut self) {
        self.pc = self.pc.wrapping_add(2);
    }

    /// Set the program counter to an absolute address.
    pub fn jump(&mut self, addr: u16) {
        self.pc = addr;
    }

    /// Push a return address.
    pub fn push(&mut self, addr: u16) -> Result<(), StackError> {
        let sp = self.sp as usize;
        if sp >= STACK_DEPTH {
            return Err(StackError::Overflow);
        }
        self.stack[sp] = addr;
        self.sp += 1;
        Ok(())
    }

    /// Pop a return address. The pointer is decremented before the read.
    pub fn pop(&mut self) -> Result<u16, StackError> {
        if self.sp == 0 {
            return Err(StackError::Underflow);
        }
        self.sp -= 1;
        Ok(self.stack[self.sp as usize])
    }

    /// Write VF as a 0/1 flag.
    pub fn set_flag(&mut self, flag: bool) {
        self.v[VF] = flag as u8;
    }

    /// Decrement both timers by one, never below zero.
    pub fn tick_timers(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }

    /// Whether the sound timer is currently running.
    pub fn sound_active(&self) -> bool {
        self.sound_timer > 0
    }

    /// The live portion of the call stack, oldest first.
    pub fn call_stack(&self) -> &[u16] {
        &self.stack[..self.sp as usize]
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

/// Call stack misuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StackError {
    #[error("call stack overflow (depth {STACK_DEPTH})")]
    Overflow,

    #[error("return with empty call stack")]
    Underflow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registers() {
        let regs = Registers::new();
        assert_eq!(regs.pc, 0x200);
        assert_eq!(regs.v, [0; 16]);
        assert_eq!(regs.sp, 0);
        assert!(regs.call_stack().is_empty());
    }

    #[test]
    fn test_advance_pc() {
        let mut regs = Registers::new();
        regs.pc = 0x2FE;

        let old = regs.advance_pc();
        assert_eq!(old, 0x2FE);
        assert_eq!(regs.pc, 0x300);
    }

    #[test]
    fn test_push_pop() {
        let mut regs = Registers::new();
        regs.push(0x202).unwrap();
        regs.push(0x404).unwrap();
        assert_eq!(regs.call_stack(), &[0x202, 0x404]);

        assert_eq!(regs.pop().unwrap(), 0x404);
        assert_eq!(regs.pop().unwrap(), 0x202);
        assert_eq!(regs.pop(), Err(StackError::Underflow));
    }

    #[test]
    fn test_stack_overflow() {
        let mut regs = Registers::new();
        for n in 0..STACK_DEPTH as u16 {
            regs.push(0x200 + n * 2).unwrap();
        }
        assert_eq!(regs.push(0x300), Err(StackError::Overflow));
        assert_eq!(regs.sp as usize, STACK_DEPTH);
    }

    #[test]
    fn test_tick_timers_floor_at_zero() {
        let mut regs = Registers::new();
        regs.delay_timer = 2;
        regs.sound_timer = 1;

        regs.tick_timers();
        assert_eq!((regs.delay_timer, regs.sound_timer), (1, 0));
        assert!(!regs.sound_active());

        regs.tick_timers();
        regs.tick_timers();
        assert_eq!((regs.delay_timer, regs.sound_timer), (0, 0));
    }
}
