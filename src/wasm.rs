//! WebAssembly bindings for the Chip-8 emulator.
//!
//! This module provides JavaScript-friendly wrappers around the driver.
//! The host calls `run_frame` from `requestAnimationFrame` and blits
//! `pixels()` when the frame reports a display change.

use wasm_bindgen::prelude::*;
use crate::asm::disasm::disassemble_instruction;
use crate::config::Config;
use crate::cpu::display::{HEIGHT, WIDTH};
use crate::cpu::Opcode;
use crate::driver::Driver;

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// WebAssembly-friendly emulator wrapper.
#[wasm_bindgen]
pub struct WasmChip8 {
    driver: Driver,
    rom: Vec<u8>,
}

#[wasm_bindgen]
impl WasmChip8 {
    /// Create an emulator running `cycles_per_second` instructions per
    /// second of emulated time.
    #[wasm_bindgen(constructor)]
    pub fn new(cycles_per_second: u32) -> Result<WasmChip8, JsError> {
        let config = Config {
            cycles_per_second,
            // Math.random() is plenty for CXNN and keeps getrandom out of
            // the hot path.
            seed: Some((js_sys::Math::random() * u64::MAX as f64) as u64),
            ..Config::default()
        };
        let driver = Driver::new(config)
            .map_err(|e| JsError::new(&format!("{}", e)))?;

        Ok(Self { driver, rom: Vec::new() })
    }

    /// Load a ROM image. Returns its size in bytes.
    #[wasm_bindgen]
    pub fn load_rom(&mut self, rom: &[u8]) -> Result<usize, JsError> {
        crate::asm::rom::validate_rom(rom)
            .map_err(|e| JsError::new(&format!("{}", e)))?;
        self.driver.restart(rom)
            .map_err(|e| JsError::new(&format!("{}", e)))?;
        self.rom = rom.to_vec();
        Ok(rom.len())
    }

    /// Run one 60 Hz frame. Returns true if the display changed.
    #[wasm_bindgen]
    pub fn run_frame(&mut self) -> Result<bool, JsError> {
        let frame = self.driver.run_frame()
            .map_err(|e| JsError::new(&format!("{}", e)))?;
        Ok(frame.display_dirty)
    }

    /// Reset CPU to initial state with the loaded ROM.
    #[wasm_bindgen]
    pub fn reset(&mut self) -> Result<(), JsError> {
        self.driver.restart(&self.rom)
            .map_err(|e| JsError::new(&format!("{}", e)))
    }

    /// Press or release a keypad key (0-15).
    #[wasm_bindgen]
    pub fn set_key(&mut self, key: u8, pressed: bool) -> Result<(), JsError> {
        self.driver.set_key(key, pressed)
            .map_err(|e| JsError::new(&format!("{}", e)))
    }

    /// Framebuffer, one byte per pixel, row-major.
    #[wasm_bindgen]
    pub fn pixels(&self) -> Vec<u8> {
        self.driver.cpu().display().pixels().to_vec()
    }

    #[wasm_bindgen]
    pub fn width(&self) -> usize {
        WIDTH
    }

    #[wasm_bindgen]
    pub fn height(&self) -> usize {
        HEIGHT
    }

    /// Whether the sound timer is running.
    #[wasm_bindgen]
    pub fn sound_active(&self) -> bool {
        self.driver.cpu().regs.sound_active()
    }

    /// Check if the CPU can still run.
    #[wasm_bindgen]
    pub fn is_running(&self) -> bool {
        self.driver.cpu().is_running()
    }

    /// Address of the instruction about to execute.
    #[wasm_bindgen]
    pub fn pc(&self) -> u16 {
        self.driver.cpu().instruction_addr()
    }

    /// Get cycle count.
    #[wasm_bindgen]
    pub fn cycles(&self) -> u64 {
        self.driver.cpu().cycles
    }

    /// Read one byte of memory for a debugger view.
    #[wasm_bindgen]
    pub fn peek(&self, addr: u16) -> Result<u8, JsError> {
        self.driver.cpu().mem.read(addr)
            .map_err(|e| JsError::new(&format!("{}", e)))
    }

    /// Disassemble the instruction about to execute.
    #[wasm_bindgen]
    pub fn current_instruction(&self) -> String {
        let cpu = self.driver.cpu();
        match cpu.mem.read_word(cpu.instruction_addr()) {
            Ok(word) => disassemble_instruction(Opcode(word)),
            Err(e) => format!("{}", e),
        }
    }

    /// Get registers and state as a JSON string.
    #[wasm_bindgen]
    pub fn registers_json(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.driver.cpu().snapshot())
            .map_err(|e| JsError::new(&format!("{}", e)))
    }
}

/// Disassemble a single 16-bit word.
#[wasm_bindgen]
pub fn wasm_disassemble(word: u16) -> String {
    disassemble_instruction(Opcode(word))
}
