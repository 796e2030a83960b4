//! Monochrome framebuffer.
//!
//! One byte per pixel (0 or 1), row-major, 64x32. The interpreter writes
//! it through [`Display::clear`] and [`Display::draw_sprite`]; front-ends
//! only read.

/// Framebuffer width in pixels.
pub const WIDTH: usize = 64;

/// Framebuffer height in pixels.
pub const HEIGHT: usize = 32;

/// The Chip-8 display buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct Display {
    pixels: Vec<u8>,
    dirty: bool,
}

impl Display {
    /// Create a blank display.
    pub fn new() -> Self {
        Self {
            pixels: vec![0; WIDTH * HEIGHT],
            dirty: false,
        }
    }

    /// Turn every pixel off.
    pub fn clear(&mut self) {
        self.pixels.fill(0);
        self.dirty = true;
    }

    /// XOR an 8-pixel-wide sprite onto the buffer with its top-left corner
    /// at `(x, y)`.
    ///
    /// Pixels past the right or bottom edge are dropped. Returns `true` if
    /// any lit pixel was turned off.
    pub fn draw_sprite(&mut self, x: usize, y: usize, rows: &[u8]) -> bool {
        let mut collision = false;

        for (dy, row) in rows.iter().enumerate() {
            let py = y + dy;
            if py >= HEIGHT {
                break;
            }
            for dx in 0..8 {
                let px = x + dx;
                if px >= WIDTH {
                    break;
                }
                if row & (0x80 >> dx) == 0 {
                    continue;
                }
                let cell = &mut self.pixels[py * WIDTH + px];
                collision |= *cell == 1;
                *cell ^= 1;
            }
        }

        self.dirty = true;
        collision
    }

    /// Pixel at `(x, y)`; anything off-screen reads as unlit.
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        x < WIDTH && y < HEIGHT && self.pixels[y * WIDTH + x] == 1
    }

    /// The raw row-major pixel buffer.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Iterate over the rows of the buffer, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.pixels.chunks_exact(WIDTH)
    }

    /// Number of lit pixels.
    pub fn lit(&self) -> usize {
        self.pixels.iter().filter(|p| **p == 1).count()
    }

    /// Returns whether the buffer changed since the last call, and resets
    /// the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Render as text, `#` for lit and `.` for unlit pixels.
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity((WIDTH + 1) * HEIGHT);
        for row in self.rows() {
            out.extend(row.iter().map(|p| if *p == 1 { '#' } else { '.' }));
            out.push('\n');
        }
        out
    }
}

impl Default for Display {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Display {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Display")
            .field("lit", &self.lit())
            .field("dirty", &self.dirty)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_draw_sets_pixels() {
        let mut display = Display::new();
        let collision = display.draw_sprite(2, 3, &[0b1010_0000]);

        assert!(!collision);
        assert!(display.pixel(2, 3));
        assert!(!display.pixel(3, 3));
        assert!(display.pixel(4, 3));
        assert_eq!(display.lit(), 2);
    }

    #[test]
    fn test_draw_clips_at_edges() {
        let mut display = Display::new();
        display.draw_sprite(WIDTH - 4, HEIGHT - 1, &[0xFF, 0xFF]);

        assert_eq!(display.lit(), 4);
        // Nothing wrapped to the opposite edges.
        assert!(!display.pixel(0, HEIGHT - 1));
        assert!(!display.pixel(WIDTH - 4, 0));
    }

    #[test]
    fn test_draw_fully_off_screen() {
        let mut display = Display::new();
        assert!(!display.draw_sprite(WIDTH, 0, &[0xFF]));
        assert!(!display.draw_sprite(0, HEIGHT, &[0xFF]));
        assert_eq!(display.lit(), 0);
    }

    #[test]
    fn test_collision_is_cumulative() {
        let mut display = Display::new();
        display.draw_sprite(0, 0, &[0x80]);

        // The colliding pixel is in the first row; the flag must survive
        // the non-colliding rows after it.
        assert!(display.draw_sprite(0, 0, &[0x80, 0x01, 0x01]));
    }

    #[test]
    fn test_clear_draw_clear() {
        let mut display = Display::new();
        display.clear();
        display.draw_sprite(10, 10, &[0xFF, 0x81, 0xFF]);
        display.clear();
        assert_eq!(display, {
            let mut fresh = Display::new();
            fresh.clear();
            fresh
        });
        assert_eq!(display.lit(), 0);
    }

    #[test]
    fn test_take_dirty() {
        let mut display = Display::new();
        assert!(!display.take_dirty());
        display.draw_sprite(0, 0, &[0x80]);
        assert!(display.take_dirty());
        assert!(!display.take_dirty());
    }

    #[test]
    fn test_to_ascii() {
        let mut display = Display::new();
        display.draw_sprite(0, 0, &[0xC0]);
        let first = display.to_ascii().lines().next().unwrap().to_string();
        assert!(first.starts_with("##."));
        assert_eq!(first.len(), WIDTH);
    }

    proptest! {
        #[test]
        fn prop_double_draw_restores(
            x in 0usize..WIDTH + 8,
            y in 0usize..HEIGHT + 4,
            rows in proptest::collection::vec(any::<u8>(), 1..16),
            background in proptest::collection::vec(any::<u8>(), 0..4),
        ) {
            let mut display = Display::new();
            display.draw_sprite(0, 0, &background);
            let before = display.pixels().to_vec();

            display.draw_sprite(x, y, &rows);
            let lit_by_first = display
                .pixels()
                .iter()
                .zip(&before)
                .any(|(now, was)| *now == 1 && *was == 0);

            let collision = display.draw_sprite(x, y, &rows);
            prop_assert_eq!(display.pixels(), &before[..]);
            if lit_by_first {
                prop_assert!(collision);
            }
        }
    }
}
