//! CPU execution engine for the Chip-8.
//!
//! Implements the fetch-decode-execute cycle and all instruction behaviors.

use crate::cpu::decode::{self, DecodeError, Instruction, Opcode};
use crate::cpu::display::Display;
use crate::cpu::keypad::{Keypad, KeypadError};
use crate::cpu::memory::{MemoryError, FONT_SPRITE_LEN, FONT_START, PROGRAM_START};
use crate::cpu::{Memory, Registers};
use crate::cpu::registers::StackError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// CPU is running normally.
    Running,
    /// FX0A at `pc` is blocking until a key goes down; the key lands in
    /// `register`.
    AwaitingKey { register: u8, pc: u16 },
    /// CPU hit a fatal error and will not execute further.
    Faulted,
}

/// The Chip-8 CPU.
#[derive(Clone)]
pub struct Cpu {
    /// CPU registers.
    pub regs: Registers,
    /// Main memory.
    pub mem: Memory,
    /// Current execution state.
    pub state: CpuState,
    /// Instruction count (for profiling).
    pub cycles: u64,
    display: Display,
    keypad: Keypad,
    rng: StdRng,
    /// Seed to restore on reset; `None` keeps the running sequence.
    seed: Option<u64>,
    /// Last executed instruction (for debugging).
    last_instr: Option<Instruction>,
}

/// Serializable view of the CPU for inspection and tooling output.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub regs: Registers,
    pub state: CpuState,
    pub cycles: u64,
    pub last_instruction: Option<Instruction>,
}

impl Cpu {
    /// Create a new CPU with zeroed state and an entropy-seeded random source.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy(), None)
    }

    /// Create a new CPU whose CXNN results are reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), Some(seed))
    }

    fn with_rng(rng: StdRng, seed: Option<u64>) -> Self {
        Self {
            regs: Registers::new(),
            mem: Memory::new(),
            state: CpuState::Running,
            cycles: 0,
            display: Display::new(),
            keypad: Keypad::new(),
            rng,
            seed,
            last_instr: None,
        }
    }

    /// Reset the CPU to its power-on state. The program must be reloaded.
    ///
    /// A seeded CPU restarts its CXNN sequence from the seed.
    pub fn reset(&mut self) {
        if let Some(seed) = self.seed {
            self.rng = StdRng::seed_from_u64(seed);
        }
        self.regs.reset();
        self.mem.clear();
        self.display = Display::new();
        self.keypad.release_all();
        self.state = CpuState::Running;
        self.cycles = 0;
        self.last_instr = None;
        log::debug!("cpu reset");
    }

    /// Load a program image at 0x200.
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), MemoryError> {
        self.mem.load_program(program)?;
        log::debug!("loaded {} byte program at {:#05x}", program.len(), PROGRAM_START);
        Ok(())
    }

    /// Execute a single instruction.
    ///
    /// Returns the instruction that was executed. While blocked on FX0A
    /// every call re-reports the FX0A instruction without fetching.
    /// Any error is fatal: the CPU moves to [`CpuState::Faulted`] and
    /// later calls return [`CpuError::NotRunning`].
    pub fn cycle(&mut self) -> Result<Instruction, CpuError> {
        let result = match self.state {
            CpuState::Running => self.fetch_execute(),
            CpuState::AwaitingKey { register, .. } => Ok(self.poll_key(register)),
            CpuState::Faulted => return Err(CpuError::NotRunning(self.state)),
        };

        match result {
            Ok(instr) => {
                self.cycles += 1;
                self.last_instr = Some(instr);
                Ok(instr)
            }
            Err(e) => {
                log::error!("cpu fault after {} cycles: {}", self.cycles, e);
                self.state = CpuState::Faulted;
                Err(e)
            }
        }
    }

    /// Run for at most `max_cycles` instructions, stopping early on error.
    ///
    /// Returns the number of instructions executed.
    pub fn run_cycles(&mut self, max_cycles: u64) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;

        for _ in 0..max_cycles {
            self.cycle()?;
        }

        Ok(self.cycles - start_cycles)
    }

    /// One 60 Hz timer tick: decrement the delay and sound timers.
    pub fn tick(&mut self) {
        self.regs.tick_timers();
    }

    fn fetch_execute(&mut self) -> Result<Instruction, CpuError> {
        // Fetch
        let pc = self.regs.pc;
        let raw = self.mem.read_word(pc)
            .map_err(|source| CpuError::Fetch { pc, source })?;
        let opcode = Opcode(raw);

        // Advance PC before decode (jumps and skips adjust from here)
        self.regs.advance_pc();

        // Decode
        let instr = decode::decode(opcode)
            .map_err(|DecodeError::InvalidOpcode(opcode)| CpuError::InvalidOpcode { pc, opcode })?;

        log::trace!("{:#05x}: {} {:?}", pc, opcode, instr);

        // Execute
        self.execute(instr, pc, opcode)?;

        Ok(instr)
    }

    fn poll_key(&mut self, register: u8) -> Instruction {
        if let Some(key) = self.keypad.first_pressed() {
            self.regs.v[register as usize] = key;
            self.state = CpuState::Running;
            log::trace!("key {:#x} released FX0A wait into V{:X}", key, register);
        }
        Instruction::WaitKey { x: register }
    }

    /// Execute a decoded instruction fetched from `pc`.
    fn execute(&mut self, instr: Instruction, pc: u16, opcode: Opcode) -> Result<(), CpuError> {
        let mem_err = |source: MemoryError| CpuError::Memory { pc, opcode, source };
        let v = &mut self.regs.v;

        match instr {
            // ==================== Display ====================

            Instruction::Cls => {
                self.display.clear();
            }

            Instruction::Drw { x, y, n } => {
                let (px, py) = (v[x as usize] as usize, v[y as usize] as usize);
                let rows = self.mem.slice(self.regs.i, n as usize).map_err(mem_err)?;
                let collision = self.display.draw_sprite(px, py, rows);
                self.regs.set_flag(collision);
            }

            // ==================== Control Flow ====================

            Instruction::Ret => {
                let addr = self.regs.pop().map_err(|e| CpuError::stack(e, pc, opcode))?;
                self.regs.jump(addr);
            }

            Instruction::Jp { addr } => {
                self.regs.jump(addr);
            }

            Instruction::Call { addr } => {
                let ret = self.regs.pc;
                self.regs.push(ret).map_err(|e| CpuError::stack(e, pc, opcode))?;
                self.regs.jump(addr);
            }

            Instruction::JpV0 { addr } => {
                let target = addr + v[0] as u16;
                self.regs.jump(target);
            }

            Instruction::SeByte { x, nn } => {
                if v[x as usize] == nn {
                    self.regs.skip();
                }
            }

            Instruction::SneByte { x, nn } => {
                if v[x as usize] != nn {
                    self.regs.skip();
                }
            }

            Instruction::SeReg { x, y } => {
                if v[x as usize] == v[y as usize] {
                    self.regs.skip();
                }
            }

            Instruction::SneReg { x, y } => {
                if v[x as usize] != v[y as usize] {
                    self.regs.skip();
                }
            }

            // ==================== Load / Arithmetic ====================

            Instruction::LdByte { x, nn } => {
                v[x as usize] = nn;
            }

            Instruction::AddByte { x, nn } => {
                v[x as usize] = v[x as usize].wrapping_add(nn);
            }

            Instruction::LdReg { x, y } => {
                v[x as usize] = v[y as usize];
            }

            Instruction::Or { x, y } => {
                v[x as usize] |= v[y as usize];
            }

            Instruction::And { x, y } => {
                v[x as usize] &= v[y as usize];
            }

            Instruction::Xor { x, y } => {
                v[x as usize] ^= v[y as usize];
            }

            // Flag-setting forms write VF last so the flag wins when X is F.
            Instruction::AddReg { x, y } => {
                let (sum, carry) = v[x as usize].overflowing_add(v[y as usize]);
                v[x as usize] = sum;
                self.regs.set_flag(carry);
            }

            Instruction::Sub { x, y } => {
                let (vx, vy) = (v[x as usize], v[y as usize]);
                v[x as usize] = vx.wrapping_sub(vy);
                self.regs.set_flag(vx >= vy);
            }

            Instruction::Subn { x, y } => {
                let (vx, vy) = (v[x as usize], v[y as usize]);
                v[x as usize] = vy.wrapping_sub(vx);
                self.regs.set_flag(vy >= vx);
            }

            Instruction::Shr { x, y } => {
                let vy = v[y as usize];
                v[x as usize] = vy >> 1;
                self.regs.set_flag(vy & 0x01 != 0);
            }

            Instruction::Shl { x, y } => {
                let vy = v[y as usize];
                v[x as usize] = vy << 1;
                self.regs.set_flag(vy & 0x80 != 0);
            }

            Instruction::Rnd { x, nn } => {
                v[x as usize] = self.rng.gen::<u8>() & nn;
            }

            // ==================== Index Register ====================

            Instruction::LdI { addr } => {
                self.regs.i = addr;
            }

            Instruction::AddI { x } => {
                self.regs.i = self.regs.i.wrapping_add(v[x as usize] as u16);
            }

            Instruction::LdFont { x } => {
                let digit = (v[x as usize] & 0xF) as u16;
                self.regs.i = FONT_START + digit * FONT_SPRITE_LEN;
            }

            // ==================== Memory ====================

            Instruction::LdBcd { x } => {
                let value = v[x as usize];
                let digits = self.mem.slice_mut(self.regs.i, 3).map_err(mem_err)?;
                digits.copy_from_slice(&[value / 100, value / 10 % 10, value % 10]);
            }

            Instruction::StoreRegs { x } => {
                let count = x as usize + 1;
                let dest = self.mem.slice_mut(self.regs.i, count).map_err(mem_err)?;
                dest.copy_from_slice(&v[..count]);
                self.regs.i = self.regs.i.wrapping_add(count as u16);
            }

            Instruction::LoadRegs { x } => {
                let count = x as usize + 1;
                let src = self.mem.slice(self.regs.i, count).map_err(mem_err)?;
                v[..count].copy_from_slice(src);
                self.regs.i = self.regs.i.wrapping_add(count as u16);
            }

            // ==================== Keyboard ====================

            Instruction::Skp { x } => {
                let key = v[x as usize];
                if self.key_down(key, pc, opcode)? {
                    self.regs.skip();
                }
            }

            Instruction::Sknp { x } => {
                let key = v[x as usize];
                if !self.key_down(key, pc, opcode)? {
                    self.regs.skip();
                }
            }

            Instruction::WaitKey { x } => {
                match self.keypad.first_pressed() {
                    Some(key) => v[x as usize] = key,
                    None => self.state = CpuState::AwaitingKey { register: x, pc },
                }
            }

            // ==================== Timers ====================

            Instruction::LdVxDt { x } => {
                v[x as usize] = self.regs.delay_timer;
            }

            Instruction::LdDtVx { x } => {
                self.regs.delay_timer = v[x as usize];
            }

            Instruction::LdStVx { x } => {
                self.regs.sound_timer = v[x as usize];
            }
        }

        Ok(())
    }

    fn key_down(&self, key: u8, pc: u16, opcode: Opcode) -> Result<bool, CpuError> {
        self.keypad
            .is_pressed(key)
            .map_err(|KeypadError::InvalidKey(key)| CpuError::InvalidKey { pc, opcode, key })
    }

    /// Record a key press or release from the front-end.
    pub fn set_key(&mut self, key: u8, pressed: bool) -> Result<(), KeypadError> {
        self.keypad.set(key, pressed)
    }

    /// Current keypad state.
    pub fn keypad(&self) -> &Keypad {
        &self.keypad
    }

    /// Read-only view of the framebuffer.
    pub fn display(&self) -> &Display {
        &self.display
    }

    /// Whether the framebuffer changed since the last call.
    pub fn take_display_dirty(&mut self) -> bool {
        self.display.take_dirty()
    }

    /// Check if the CPU can still execute (running or blocked on a key).
    pub fn is_running(&self) -> bool {
        self.state != CpuState::Faulted
    }

    /// Address of the instruction the next [`Cpu::cycle`] executes.
    ///
    /// While blocked on FX0A this is the FX0A itself, not `regs.pc`.
    pub fn instruction_addr(&self) -> u16 {
        match self.state {
            CpuState::AwaitingKey { pc, .. } => pc,
            _ => self.regs.pc,
        }
    }

    /// Check if the CPU is blocked on FX0A.
    pub fn is_awaiting_key(&self) -> bool {
        matches!(self.state, CpuState::AwaitingKey { .. })
    }

    /// Capture registers and execution state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            regs: self.regs.clone(),
            state: self.state,
            cycles: self.cycles,
            last_instruction: self.last_instr,
        }
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("state", &self.state)
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .field("display", &self.display)
            .finish()
    }
}

/// Errors that can occur during CPU execution. All of them halt the CPU.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("CPU not running: {0:?}")]
    NotRunning(CpuState),

    #[error("invalid opcode {opcode} at {pc:#05x}")]
    InvalidOpcode { pc: u16, opcode: Opcode },

    #[error("call stack overflow at {pc:#05x} ({opcode})")]
    StackOverflow { pc: u16, opcode: Opcode },

    #[error("return with empty call stack at {pc:#05x} ({opcode})")]
    StackUnderflow { pc: u16, opcode: Opcode },

    #[error("{source} at {pc:#05x} ({opcode})")]
    Memory { pc: u16, opcode: Opcode, source: MemoryError },

    #[error("key {key:#x} out of range at {pc:#05x} ({opcode})")]
    InvalidKey { pc: u16, opcode: Opcode, key: u8 },

    #[error("instruction fetch failed at {pc:#05x}: {source}")]
    Fetch { pc: u16, source: MemoryError },
}

impl CpuError {
    fn stack(err: StackError, pc: u16, opcode: Opcode) -> Self {
        match err {
            StackError::Overflow => CpuError::StackOverflow { pc, opcode },
            StackError::Underflow => CpuError::StackUnderflow { pc, opcode },
        }
    }

    /// Address of the instruction that failed.
    pub fn pc(&self) -> Option<u16> {
        match self {
            CpuError::NotRunning(_) => None,
            CpuError::InvalidOpcode { pc, .. }
            | CpuError::StackOverflow { pc, .. }
            | CpuError::StackUnderflow { pc, .. }
            | CpuError::Memory { pc, .. }
            | CpuError::InvalidKey { pc, .. }
            | CpuError::Fetch { pc, .. } => Some(*pc),
        }
    }

    /// Raw word of the instruction that failed, if it was fetched.
    pub fn opcode(&self) -> Option<Opcode> {
        match self {
            CpuError::NotRunning(_) | CpuError::Fetch { .. } => None,
            CpuError::InvalidOpcode { opcode, .. }
            | CpuError::StackOverflow { opcode, .. }
            | CpuError::StackUnderflow { opcode, .. }
            | CpuError::Memory { opcode, .. }
            | CpuError::InvalidKey { opcode, .. } => Some(*opcode),
        }
    }
}
