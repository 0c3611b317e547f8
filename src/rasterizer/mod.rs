//! Palette-indexed software rasterizer
//!
//! A fixed 128x128 RGBA buffer written only through palette indices.
//!
//! Features:
//! - 16-color fixed palette with draw-time and display-time remap tables
//! - Per-color transparency mask (color 0 transparent by default)
//! - Camera offset and silent clipping on every pixel write
//! - Lines, circles, rectangles, sprite/map blits, masked text
//!
//! # Module Organization
//!
//! - `types` - palette table, `PaletteState`, `PixelSheet`
//! - `render` - `Framebuffer` and primitive drawing
//! - `draw` - sprite, map and text drawing over a framebuffer
//! - `constants` - screen and sheet layout constants

#![allow(dead_code)]

pub mod constants;
pub mod draw;
pub mod render;
pub mod types;

// =============================================================================
// Convenience re-exports for commonly used items
// =============================================================================

pub use types::{color, ColorIndex, PixelSheet};

pub use render::Framebuffer;

pub use draw::{map, print, print_centered, spr};

pub use constants::{HEIGHT, SHEET_SIZE, WIDTH};
