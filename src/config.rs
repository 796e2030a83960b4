//! Emulator configuration.
//!
//! Settings can come from a JSON file and be overridden on the command
//! line. Every field has a default, so an empty object `{}` is a valid
//! config file.

use serde::{Serialize, Deserialize};
use std::path::Path;
use thiserror::Error;

/// Runtime settings for the driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Instructions executed per second of emulated time.
    pub cycles_per_second: u32,
    /// Timer/display tick rate in Hz.
    pub timer_hz: u32,
    /// Seed for CXNN; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Config {
    /// Load a config from a JSON file and validate it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_json(&text)
    }

    /// Parse a config from JSON text and validate it.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(text)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the rates describe a schedulable frame.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timer_hz == 0 {
            return Err(ConfigError::Invalid("timer_hz must be non-zero".into()));
        }
        if self.cycles_per_second < self.timer_hz {
            return Err(ConfigError::Invalid(format!(
                "cycles_per_second ({}) must be at least timer_hz ({})",
                self.cycles_per_second, self.timer_hz
            )));
        }
        Ok(())
    }

    /// Whole instructions executed between two timer ticks. The driver
    /// carries the remainder so uneven rates are not truncated.
    pub fn cycles_per_tick(&self) -> u32 {
        (self.cycles_per_second / self.timer_hz.max(1)).max(1)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cycles_per_second: 480,
            timer_hz: 60,
            seed: None,
        }
    }
}

/// Errors that can occur while loading a config.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("config parse error: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}
