//! Front-end application state and logic.

use crate::asm::disasm::disassemble_instruction;
use crate::config::Config;
use crate::cpu::memory::MEMORY_SIZE;
use crate::cpu::Opcode;
use crate::driver::Driver;
use super::keymap::logical_key;
use crossterm::event::{KeyCode, KeyEventKind};
use std::time::{Duration, Instant};

/// How long a key stays down after a press when the terminal does not
/// report releases.
pub const KEY_HOLD: Duration = Duration::from_millis(150);

/// Front-end application state.
pub struct EmulatorApp {
    /// The driven CPU.
    pub driver: Driver,
    /// Original ROM for resets.
    pub rom: Vec<u8>,
    /// Is emulation paused?
    pub paused: bool,
    /// Did the CPU fault?
    pub halted: bool,
    /// Show the register/disassembly panel?
    pub show_debug: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// Whether the terminal reports key releases.
    pub release_events: bool,
    held: [Option<Instant>; 16],
}

impl EmulatorApp {
    /// Create an app with the ROM loaded.
    pub fn new(config: Config, rom: Vec<u8>) -> Result<Self, Box<dyn std::error::Error>> {
        let mut driver = Driver::new(config)?;
        driver.load(&rom)?;

        Ok(Self {
            driver,
            rom,
            paused: false,
            halted: false,
            show_debug: true,
            should_quit: false,
            status: "Running. Space: pause, n: step, x: reset, Tab: debug, q: quit.".into(),
            release_events: false,
            held: [None; 16],
        })
    }

    /// Handle one key event. `now` stamps keypad presses for hold expiry.
    pub fn handle_key(&mut self, code: KeyCode, kind: KeyEventKind, now: Instant) {
        if let KeyCode::Char(c) = code {
            if let Some(key) = logical_key(c) {
                let pressed = kind != KeyEventKind::Release;
                self.held[key as usize] = pressed.then_some(now);
                self.set_key(key, pressed);
                return;
            }
        }

        if kind != KeyEventKind::Press {
            return;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char(' ') => self.toggle_pause(),
            KeyCode::Char('n') => {
                self.paused = true;
                self.step();
            }
            KeyCode::Char('x') => self.reset(),
            KeyCode::Tab => self.show_debug = !self.show_debug,
            _ => {}
        }
    }

    /// Release keys whose press is older than [`KEY_HOLD`].
    ///
    /// Only used when the terminal cannot report releases.
    pub fn release_expired(&mut self, now: Instant) {
        if self.release_events {
            return;
        }
        for key in 0..16u8 {
            if let Some(since) = self.held[key as usize] {
                if now.duration_since(since) >= KEY_HOLD {
                    self.held[key as usize] = None;
                    self.set_key(key, false);
                }
            }
        }
    }

    fn set_key(&mut self, key: u8, pressed: bool) {
        if let Err(e) = self.driver.set_key(key, pressed) {
            log::warn!("dropped key event: {}", e);
        }
    }

    /// Run one frame if not paused or halted.
    pub fn tick(&mut self) {
        if self.paused || self.halted {
            return;
        }

        if let Err(e) = self.driver.run_frame() {
            self.halt(e);
        }
    }

    /// Execute a single instruction.
    pub fn step(&mut self) {
        if self.halted {
            return;
        }

        let pc = self.driver.cpu().instruction_addr();
        match self.driver.cpu_mut().cycle() {
            Ok(instr) => {
                let text = crate::asm::disasm::format_instruction(&instr);
                self.status = format!("PC={:#05x}: {}", pc, text);
            }
            Err(e) => self.halt(e),
        }
    }

    fn halt(&mut self, e: crate::cpu::CpuError) {
        self.halted = true;
        self.status = format!("Halted: {}", e);
    }

    /// Toggle between running and paused.
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        self.status = if self.paused { "Paused.".into() } else { "Running.".into() };
    }

    /// Reset the CPU and reload the ROM.
    pub fn reset(&mut self) {
        match self.driver.restart(&self.rom) {
            Ok(()) => {
                self.halted = false;
                self.held = [None; 16];
                self.status = "Reset.".into();
            }
            Err(e) => self.status = format!("Reset failed: {}", e),
        }
    }

    /// Get disassembly around the current PC as (address, text, is_current).
    pub fn get_disassembly(&self, lines: usize) -> Vec<(u16, String, bool)> {
        let cpu = self.driver.cpu();
        let pc = cpu.instruction_addr() as usize;
        let start = pc.saturating_sub(lines / 2 * 2);

        (0..lines)
            .map(|i| start + i * 2)
            .filter(|addr| addr + 1 < MEMORY_SIZE)
            .filter_map(|addr| {
                let word = cpu.mem.read_word(addr as u16).ok()?;
                let text = disassemble_instruction(Opcode(word));
                Some((addr as u16, format!("{:04X}  {}", word, text), addr == pc))
            })
            .collect()
    }
}

/// Run the terminal front-end with a ROM.
pub fn run_terminal(config: Config, rom: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
    use crossterm::{
        event::{
            self, Event, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
            PushKeyboardEnhancementFlags,
        },
        terminal::{
            disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement,
            EnterAlternateScreen, LeaveAlternateScreen,
        },
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;

    let mut app = EmulatorApp::new(config, rom)?;
    let frame_time = Duration::from_secs(1) / app.driver.config().timer_hz;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    app.release_events = supports_keyboard_enhancement().unwrap_or(false);
    if app.release_events {
        stdout().execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))?;
    }
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut next_frame = Instant::now();

    // Main loop
    let result = loop {
        // Draw
        if let Err(e) = terminal.draw(|frame| super::ui::draw(frame, &app)) {
            break Err(e);
        }

        // Handle input until the next frame is due
        let timeout = next_frame.saturating_duration_since(Instant::now());
        match event::poll(timeout) {
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) => app.handle_key(key.code, key.kind, Instant::now()),
                Ok(_) => {}
                Err(e) => break Err(e),
            },
            Ok(false) => {}
            Err(e) => break Err(e),
        }

        let now = Instant::now();
        app.release_expired(now);
        if now >= next_frame {
            app.tick();
            next_frame += frame_time;
            // Don't try to catch up after a long stall.
            if next_frame < now {
                next_frame = now + frame_time;
            }
        }

        if app.should_quit {
            break Ok(());
        }
    };

    // Restore terminal
    if app.release_events {
        stdout().execute(PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result.map_err(Into::into)
}
