//! Palette and sheet types
//!
//! - `PALETTE`: the fixed 16-entry RGB table
//! - `PaletteState`: draw-time remap, display-time remap, transparency mask
//! - `PixelSheet`: decoded RGBA source pixels (sprite sheet, font)

use super::constants::{PALETTE_SIZE, PIXEL_STRIDE};
use crate::error::ConsoleError;

/// Palette color index (0-15)
pub type ColorIndex = u8;

/// The fixed 16-color table.
pub const PALETTE: [[u8; 3]; PALETTE_SIZE] = [
    [0, 0, 0],       // 0 black
    [29, 43, 83],    // 1 dark blue
    [126, 37, 83],   // 2 dark purple
    [0, 135, 81],    // 3 dark green
    [171, 82, 54],   // 4 brown
    [95, 87, 79],    // 5 dark gray
    [194, 195, 199], // 6 light gray
    [255, 241, 232], // 7 white
    [255, 0, 77],    // 8 red
    [255, 163, 0],   // 9 orange
    [255, 236, 39],  // 10 yellow
    [0, 228, 54],    // 11 green
    [41, 173, 255],  // 12 blue
    [131, 118, 156], // 13 indigo
    [255, 119, 168], // 14 pink
    [255, 204, 170], // 15 peach
];

/// Named palette indices used by gameplay code.
pub mod color {
    use super::ColorIndex;

    pub const BLACK: ColorIndex = 0;
    pub const DARK_BLUE: ColorIndex = 1;
    pub const DARK_PURPLE: ColorIndex = 2;
    pub const DARK_GRAY: ColorIndex = 5;
    pub const LIGHT_GRAY: ColorIndex = 6;
    pub const WHITE: ColorIndex = 7;
    pub const RED: ColorIndex = 8;
    pub const GREEN: ColorIndex = 11;
    pub const BLUE: ColorIndex = 12;
    pub const PINK: ColorIndex = 14;
}

/// RGB triple of a palette index. Indices wrap into 0-15.
#[inline]
pub fn rgb_of(color: ColorIndex) -> [u8; 3] {
    PALETTE[(color as usize) % PALETTE_SIZE]
}

/// Reverse lookup by exact RGB match.
///
/// Source pixel data is expected to be palette-pure, so a miss is an error
/// rather than a nearest-color guess.
pub fn color_from_rgb(r: u8, g: u8, b: u8) -> Result<ColorIndex, ConsoleError> {
    PALETTE
        .iter()
        .position(|c| c[0] == r && c[1] == g && c[2] == b)
        .map(|i| i as ColorIndex)
        .ok_or(ConsoleError::UnknownColor { r, g, b })
}

fn identity_remap() -> [ColorIndex; PALETTE_SIZE] {
    let mut table = [0; PALETTE_SIZE];
    for (i, entry) in table.iter_mut().enumerate() {
        *entry = i as ColorIndex;
    }
    table
}

/// Two-stage color indirection plus the transparency mask.
///
/// Both remap tables persist across frames until changed or reset; a caller
/// that remaps for a single draw call has to remap back afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteState {
    draw_remap: [ColorIndex; PALETTE_SIZE],
    display_remap: [ColorIndex; PALETTE_SIZE],
    transparent: [bool; PALETTE_SIZE],
}

impl PaletteState {
    pub fn new() -> Self {
        let mut transparent = [false; PALETTE_SIZE];
        transparent[0] = true;
        Self {
            draw_remap: identity_remap(),
            display_remap: identity_remap(),
            transparent,
        }
    }

    /// Restore both remap tables to identity. The transparency mask is kept.
    pub fn reset(&mut self) {
        self.draw_remap = identity_remap();
        self.display_remap = identity_remap();
    }

    pub fn set_draw_remap(&mut self, from: ColorIndex, to: ColorIndex) {
        self.draw_remap[(from as usize) % PALETTE_SIZE] = to % PALETTE_SIZE as u8;
    }

    pub fn set_display_remap(&mut self, from: ColorIndex, to: ColorIndex) {
        self.display_remap[(from as usize) % PALETTE_SIZE] = to % PALETTE_SIZE as u8;
    }

    pub fn set_transparent(&mut self, color: ColorIndex, transparent: bool) {
        self.transparent[(color as usize) % PALETTE_SIZE] = transparent;
    }

    #[inline]
    pub fn draw(&self, color: ColorIndex) -> ColorIndex {
        self.draw_remap[(color as usize) % PALETTE_SIZE]
    }

    #[inline]
    pub fn display(&self, color: ColorIndex) -> ColorIndex {
        self.display_remap[(color as usize) % PALETTE_SIZE]
    }

    #[inline]
    pub fn is_transparent(&self, color: ColorIndex) -> bool {
        self.transparent[(color as usize) % PALETTE_SIZE]
    }
}

impl Default for PaletteState {
    fn default() -> Self {
        Self::new()
    }
}

/// Decoded RGBA source pixels (sprite sheet or font sheet).
#[derive(Debug, Clone)]
pub struct PixelSheet {
    pub width: usize,
    pub height: usize,
    /// RGBA, 4 bytes per pixel
    pub pixels: Vec<u8>,
}

impl PixelSheet {
    pub fn new(width: usize, height: usize, pixels: Vec<u8>) -> Self {
        Self { width, height, pixels }
    }

    /// A sheet filled with a single palette color.
    pub fn filled(width: usize, height: usize, color: ColorIndex) -> Self {
        let [r, g, b] = rgb_of(color);
        let mut pixels = Vec::with_capacity(width * height * PIXEL_STRIDE);
        for _ in 0..width * height {
            pixels.extend_from_slice(&[r, g, b, 255]);
        }
        Self { width, height, pixels }
    }

    /// Write a palette color at (x, y). Out-of-bounds writes are ignored.
    pub fn set(&mut self, x: usize, y: usize, color: ColorIndex) {
        if x < self.width && y < self.height {
            let i = (y * self.width + x) * PIXEL_STRIDE;
            let [r, g, b] = rgb_of(color);
            self.pixels[i] = r;
            self.pixels[i + 1] = g;
            self.pixels[i + 2] = b;
            self.pixels[i + 3] = 255;
        }
    }

    /// Palette index of the source pixel at (x, y).
    pub fn color_at(&self, x: usize, y: usize) -> Result<ColorIndex, ConsoleError> {
        if x >= self.width || y >= self.height {
            return Err(ConsoleError::SheetOutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        let i = (y * self.width + x) * PIXEL_STRIDE;
        color_from_rgb(self.pixels[i], self.pixels[i + 1], self.pixels[i + 2])
    }
}
