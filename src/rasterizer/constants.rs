//! Rasterizer constants
//!
//! Screen resolution and buffer layout.

/// Screen width in pixels
pub const WIDTH: usize = 128;

/// Screen height in pixels
pub const HEIGHT: usize = 128;

/// Bytes per RGBA pixel
pub const PIXEL_STRIDE: usize = 4;

/// Bytes per framebuffer row
pub const ROW_STRIDE: usize = PIXEL_STRIDE * WIDTH;

/// Sprite cell size (sprites and map tiles are 8x8)
pub const SPRITE_SIZE: usize = 8;

/// Sprite cells per sprite sheet row
pub const SPRITES_PER_ROW: usize = 16;

/// Edge of the sprite and font sheets (16 cells of 8 pixels)
pub const SHEET_SIZE: usize = SPRITES_PER_ROW * SPRITE_SIZE;

/// Number of palette entries
pub const PALETTE_SIZE: usize = 16;
