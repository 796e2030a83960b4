//! Physical-to-logical key mapping.
//!
//! The hex keypad is laid out on the right-hand block of a QWERTY
//! keyboard:
//!
//! ```text
//!  keypad        keyboard
//!  1 2 3 C       7 8 9 0
//!  4 5 6 D       U I O P
//!  7 8 9 E       J K L ;
//!  A 0 B F       M , . /
//! ```

/// Keyboard character → keypad key.
pub const KEYMAP: [(char, u8); 16] = [
    ('7', 0x1),
    ('8', 0x2),
    ('9', 0x3),
    ('0', 0xC),
    ('u', 0x4),
    ('i', 0x5),
    ('o', 0x6),
    ('p', 0xD),
    ('j', 0x7),
    ('k', 0x8),
    ('l', 0x9),
    (';', 0xE),
    ('m', 0xA),
    (',', 0x0),
    ('.', 0xB),
    ('/', 0xF),
];

/// Map a typed character to its keypad key, ignoring case.
pub fn logical_key(c: char) -> Option<u8> {
    let c = c.to_ascii_lowercase();
    KEYMAP.iter().find(|(k, _)| *k == c).map(|(_, key)| *key)
}

/// The keyboard character bound to a keypad key.
pub fn physical_key(key: u8) -> Option<char> {
    KEYMAP.iter().find(|(_, k)| *k == key).map(|(c, _)| *c)
}
