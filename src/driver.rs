//! Frame scheduler.
//!
//! The CPU has no notion of time. The driver slices execution into frames:
//! each frame runs `cycles_per_second / timer_hz` instructions and then
//! delivers one timer tick, so at the default 480/60 a frame is eight
//! instructions followed by a v-blank. When the rate is not a multiple of
//! `timer_hz` the leftover cycles are carried from frame to frame, so
//! every second of frames runs exactly `cycles_per_second` instructions. Front-ends call [`Driver::run_frame`]
//! at `timer_hz` and redraw when the frame reports the display changed.

use crate::config::{Config, ConfigError};
use crate::cpu::{Cpu, CpuError, Instruction, KeypadError, MemoryError};

/// What happened during one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// Instructions executed (including blocked FX0A re-issues).
    pub cycles: u32,
    /// The framebuffer changed and should be presented.
    pub display_dirty: bool,
    /// The sound timer is running after the tick.
    pub sound: bool,
    /// The CPU ended the frame blocked on FX0A.
    pub awaiting_key: bool,
}

/// Owns a CPU and drives it at the configured rates.
#[derive(Debug)]
pub struct Driver {
    cpu: Cpu,
    config: Config,
    frames: u64,
    /// Accumulated `cycles_per_second % timer_hz` remainder, below `timer_hz`.
    carry: u32,
}

impl Driver {
    /// Create a driver with a fresh CPU.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let cpu = match config.seed {
            Some(seed) => Cpu::with_seed(seed),
            None => Cpu::new(),
        };
        log::debug!(
            "driver: {} cycles/s, {} Hz ticks, {} cycles per frame",
            config.cycles_per_second,
            config.timer_hz,
            config.cycles_per_tick()
        );
        Ok(Self { cpu, config, frames: 0, carry: 0 })
    }

    /// Load a ROM image into the CPU.
    pub fn load(&mut self, rom: &[u8]) -> Result<(), MemoryError> {
        self.cpu.load_program(rom)
    }

    /// Run one frame: a slice of instructions followed by one timer tick.
    pub fn run_frame(&mut self) -> Result<Frame, CpuError> {
        self.run_frame_with(|_, _| {})
    }

    /// Like [`Driver::run_frame`], calling `on_step` with the address and
    /// instruction of every executed cycle. A blocked FX0A is reported at
    /// its own address on every re-issue.
    pub fn run_frame_with<F>(&mut self, mut on_step: F) -> Result<Frame, CpuError>
    where
        F: FnMut(u16, &Instruction),
    {
        let budget = self.frame_budget();

        for _ in 0..budget {
            let pc = self.cpu.instruction_addr();
            let instr = self.cpu.cycle()?;
            on_step(pc, &instr);
        }

        self.cpu.tick();
        self.frames += 1;

        Ok(Frame {
            cycles: budget,
            display_dirty: self.cpu.take_display_dirty(),
            sound: self.cpu.regs.sound_active(),
            awaiting_key: self.cpu.is_awaiting_key(),
        })
    }

    /// Instructions for the next frame, spreading the remainder of
    /// `cycles_per_second / timer_hz` over successive frames.
    fn frame_budget(&mut self) -> u32 {
        let hz = self.config.timer_hz as u64;
        let acc = self.carry as u64 + (self.config.cycles_per_second as u64 % hz);
        self.carry = (acc % hz) as u32;
        self.config.cycles_per_tick() + (acc / hz) as u32
    }

    /// Run up to `count` frames headless. Returns the instructions executed.
    pub fn run_frames(&mut self, count: u64) -> Result<u64, CpuError> {
        let start = self.cpu.cycles;
        for _ in 0..count {
            self.run_frame()?;
        }
        Ok(self.cpu.cycles - start)
    }

    /// Forward a key event to the CPU.
    pub fn set_key(&mut self, key: u8, pressed: bool) -> Result<(), KeypadError> {
        self.cpu.set_key(key, pressed)
    }

    /// Reset the CPU and reload `rom`.
    pub fn restart(&mut self, rom: &[u8]) -> Result<(), MemoryError> {
        self.cpu.reset();
        self.frames = 0;
        self.carry = 0;
        self.cpu.load_program(rom)
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Frames completed since construction or the last restart.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::decode::encode;

    fn rom(instructions: &[Instruction]) -> Vec<u8> {
        instructions.iter().flat_map(|i| encode(i).to_bytes()).collect()
    }

    fn seeded() -> Driver {
        Driver::new(Config { seed: Some(1), ..Config::default() }).unwrap()
    }

    #[test]
    fn test_frame_runs_budget_then_ticks() {
        let mut driver = seeded();
        // LD V0, 60; LD DT, V0; JP 0x204
        driver.load(&rom(&[
            Instruction::LdByte { x: 0, nn: 60 },
            Instruction::LdDtVx { x: 0 },
            Instruction::Jp { addr: 0x204 },
        ])).unwrap();

        let frame = driver.run_frame().unwrap();
        assert_eq!(frame.cycles, 8);
        assert_eq!(driver.cpu().cycles, 8);
        assert_eq!(driver.cpu().regs.delay_timer, 59);

        driver.run_frames(9).unwrap();
        assert_eq!(driver.cpu().regs.delay_timer, 50);
        assert_eq!(driver.frames(), 10);
    }

    #[test]
    fn test_frame_reports_display_and_sound() {
        let mut driver = seeded();
        driver.load(&rom(&[
            Instruction::LdByte { x: 0, nn: 2 },
            Instruction::LdStVx { x: 0 },
            Instruction::Drw { x: 1, y: 1, n: 1 },
            Instruction::Jp { addr: 0x206 },
        ])).unwrap();
        driver.cpu_mut().regs.i = 0x50;

        let frame = driver.run_frame().unwrap();
        assert!(frame.display_dirty);
        assert!(frame.sound);

        let frame = driver.run_frame().unwrap();
        assert!(!frame.display_dirty);
        assert!(!frame.sound);
    }

    #[test]
    fn test_key_wait_across_frames() {
        let mut driver = seeded();
        driver.load(&rom(&[
            Instruction::WaitKey { x: 3 },
            Instruction::Jp { addr: 0x202 },
        ])).unwrap();

        let frame = driver.run_frame().unwrap();
        assert!(frame.awaiting_key);

        driver.set_key(0x9, true).unwrap();
        let frame = driver.run_frame().unwrap();
        assert!(!frame.awaiting_key);
        assert_eq!(driver.cpu().regs.v[3], 0x9);
    }

    #[test]
    fn test_trace_callback_sees_addresses() {
        let mut driver = seeded();
        driver.load(&rom(&[Instruction::Jp { addr: 0x200 }])).unwrap();

        let mut seen = Vec::new();
        driver.run_frame_with(|pc, instr| seen.push((pc, *instr))).unwrap();
        assert_eq!(seen.len(), 8);
        assert!(seen.iter().all(|(pc, _)| *pc == 0x200));
    }

    #[test]
    fn test_fault_stops_frame() {
        let mut driver = seeded();
        driver.load(&[0xFF, 0xFF]).unwrap();
        let err = driver.run_frame().unwrap_err();
        assert_eq!(err.pc(), Some(0x200));
        assert_eq!(driver.frames(), 0);
    }

    #[test]
    fn test_restart() {
        let mut driver = seeded();
        let program = rom(&[Instruction::LdByte { x: 0, nn: 1 }, Instruction::Jp { addr: 0x202 }]);
        driver.load(&program).unwrap();
        driver.run_frame().unwrap();

        driver.restart(&program).unwrap();
        assert_eq!(driver.cpu().cycles, 0);
        assert_eq!(driver.cpu().regs.v[0], 0);
        assert_eq!(driver.frames(), 0);
    }

    #[test]
    fn test_blocked_key_wait_traced_at_its_address() {
        let mut driver = seeded();
        driver.load(&rom(&[
            Instruction::WaitKey { x: 3 },
            Instruction::Jp { addr: 0x202 },
        ])).unwrap();

        let mut seen = Vec::new();
        driver.run_frame_with(|pc, instr| seen.push((pc, *instr))).unwrap();
        assert_eq!(seen, vec![(0x200, Instruction::WaitKey { x: 3 }); 8]);
        assert_eq!(driver.cpu().regs.pc, 0x202);

        driver.set_key(0x1, true).unwrap();
        seen.clear();
        driver.run_frame_with(|pc, instr| seen.push((pc, *instr))).unwrap();
        assert_eq!(seen[0], (0x200, Instruction::WaitKey { x: 3 }));
        assert_eq!(seen[1], (0x202, Instruction::Jp { addr: 0x202 }));
    }

    #[test]
    fn test_restart_repeats_seeded_random_sequence() {
        let mut driver = Driver::new(Config { seed: Some(5), ..Config::default() }).unwrap();
        let program = rom(&[
            Instruction::Rnd { x: 0, nn: 0xFF },
            Instruction::Rnd { x: 1, nn: 0xFF },
            Instruction::Rnd { x: 2, nn: 0xFF },
            Instruction::Jp { addr: 0x206 },
        ]);
        driver.load(&program).unwrap();
        driver.run_frame().unwrap();
        let first = driver.cpu().regs.v;

        driver.restart(&program).unwrap();
        driver.run_frame().unwrap();
        assert_eq!(driver.cpu().regs.v, first);
    }

    #[test]
    fn test_uneven_rate_carries_remainder() {
        let program = rom(&[Instruction::Jp { addr: 0x200 }]);

        for (ips, per_frame) in [(500, [8, 8, 9]), (119, [1, 2, 2])] {
            let mut driver = Driver::new(Config {
                cycles_per_second: ips,
                seed: Some(1),
                ..Config::default()
            }).unwrap();
            driver.load(&program).unwrap();

            let budgets: Vec<u32> = (0..3).map(|_| driver.run_frame().unwrap().cycles).collect();
            assert_eq!(budgets, per_frame);

            driver.run_frames(57).unwrap();
            assert_eq!(driver.cpu().cycles, ips as u64, "{} ips over one second", ips);
        }
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = Config { timer_hz: 0, ..Config::default() };
        assert!(Driver::new(config).is_err());
    }
}
