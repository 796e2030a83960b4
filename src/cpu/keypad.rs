//! Hex keypad state.
//!
//! Sixteen keys, indexed by logical key code 0x0-0xF. Front-ends translate
//! physical keys before calling [`Keypad::set`].

use thiserror::Error;

/// Number of keys on the keypad.
pub const NUM_KEYS: usize = 16;

/// Pressed/released state for each logical key (1 = pressed).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Keypad {
    keys: [u8; NUM_KEYS],
}

impl Keypad {
    /// All keys released.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key press or release.
    pub fn set(&mut self, key: u8, pressed: bool) -> Result<(), KeypadError> {
        let cell = self.keys
            .get_mut(key as usize)
            .ok_or(KeypadError::InvalidKey(key))?;
        *cell = pressed as u8;
        Ok(())
    }

    /// Whether `key` is held down.
    pub fn is_pressed(&self, key: u8) -> Result<bool, KeypadError> {
        self.keys
            .get(key as usize)
            .map(|k| *k == 1)
            .ok_or(KeypadError::InvalidKey(key))
    }

    /// Lowest-numbered key currently held down.
    pub fn first_pressed(&self) -> Option<u8> {
        self.keys.iter().position(|k| *k == 1).map(|k| k as u8)
    }

    /// Release every key.
    pub fn release_all(&mut self) {
        self.keys = [0; NUM_KEYS];
    }

    /// Raw key states.
    pub fn keys(&self) -> &[u8; NUM_KEYS] {
        &self.keys
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum KeypadError {
    #[error("key {0:#x} out of range (0x0-0xf)")]
    InvalidKey(u8),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_release() {
        let mut keypad = Keypad::new();
        keypad.set(0xA, true).unwrap();
        assert!(keypad.is_pressed(0xA).unwrap());

        keypad.set(0xA, false).unwrap();
        assert!(!keypad.is_pressed(0xA).unwrap());
    }

    #[test]
    fn test_invalid_key() {
        let mut keypad = Keypad::new();
        assert_eq!(keypad.set(0x10, true), Err(KeypadError::InvalidKey(0x10)));
        assert_eq!(keypad.is_pressed(0x10), Err(KeypadError::InvalidKey(0x10)));
    }

    #[test]
    fn test_first_pressed_is_lowest() {
        let mut keypad = Keypad::new();
        assert_eq!(keypad.first_pressed(), None);

        keypad.set(0xC, true).unwrap();
        keypad.set(0x3, true).unwrap();
        assert_eq!(keypad.first_pressed(), Some(0x3));

        keypad.release_all();
        assert_eq!(keypad.first_pressed(), None);
    }
}
