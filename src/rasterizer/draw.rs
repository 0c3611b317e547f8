//! Sheet-based drawing: sprites, map cells, text
//!
//! Standalone functions over a `Framebuffer`, mirroring the console's
//! `spr`, `map` and `print` calls. All destination coordinates are floored.

use super::constants::{SPRITES_PER_ROW, SPRITE_SIZE};
use super::render::Framebuffer;
use super::types::{ColorIndex, PixelSheet};
use crate::error::ConsoleError;
use crate::world::TileMap;

/// Glyph cell size inside the font sheet
const GLYPH_W: usize = 7;
const GLYPH_H: usize = 5;
/// Distance between glyph cells in the font sheet
const GLYPH_PITCH_X: usize = GLYPH_W + 1;
const GLYPH_PITCH_Y: usize = GLYPH_H + 3;
/// Horizontal advance per printed character
pub const CHAR_ADVANCE: i32 = 4;
/// Font sheet pixels with this color are glyph ink
const GLYPH_INK: ColorIndex = 7;

/// Printable glyphs, starting at grid position 32 (space)
const GLYPH_ORDER: &str = concat!(
    " !\"#$%&'()*+,-./",
    "0123456789:;<=>?",
    "@ABCDEFGHIJKLMNO",
    "PQRSTUVWXYZ[\\]^_",
    "`abcdefghijklmno",
    "pqrstuvwxyz{|}~\u{220e}",
);
const FIRST_GLYPH: usize = 32;

/// Grid position of a character in the font sheet. Unknown characters map to space.
fn glyph_position(ch: char) -> usize {
    GLYPH_ORDER
        .chars()
        .position(|g| g == ch)
        .map_or(FIRST_GLYPH, |i| FIRST_GLYPH + i)
}

/// Draw sprite `n` (8x8 cell, 16 cells per sheet row).
pub fn spr(
    fb: &mut Framebuffer,
    sheet: &PixelSheet,
    n: f32,
    x: f32,
    y: f32,
    flip_x: bool,
    flip_y: bool,
) -> Result<(), ConsoleError> {
    let n = n.floor().max(0.0) as usize;
    let sx = (n % SPRITES_PER_ROW) * SPRITE_SIZE;
    let sy = (n / SPRITES_PER_ROW) * SPRITE_SIZE;
    fb.blit(
        sheet,
        sx,
        sy,
        x.floor() as i32,
        y.floor() as i32,
        SPRITE_SIZE,
        SPRITE_SIZE,
        flip_x,
        flip_y,
    )
}

/// Draw a block of map cells.
///
/// With a layer mask only tiles whose flag byte shares a bit with the
/// mask are drawn.
#[allow(clippy::too_many_arguments)]
pub fn map(
    fb: &mut Framebuffer,
    sheet: &PixelSheet,
    tiles: &TileMap,
    cell_x: i32,
    cell_y: i32,
    sx: f32,
    sy: f32,
    cell_w: i32,
    cell_h: i32,
    layer: Option<u8>,
) -> Result<(), ConsoleError> {
    let size = SPRITE_SIZE as f32;
    for cy in 0..cell_h {
        let y = sy + cy as f32 * size;
        for cx in 0..cell_w {
            let tile = tiles.mget(cell_x + cx, cell_y + cy);
            if let Some(mask) = layer {
                if tiles.fget(tile) & mask == 0 {
                    continue;
                }
            }
            let x = sx + cx as f32 * size;
            spr(fb, sheet, tile as f32, x, y, false, false)?;
        }
    }
    Ok(())
}

/// Print text with the font sheet. The color goes through the draw remap once.
pub fn print(
    fb: &mut Framebuffer,
    font: &PixelSheet,
    text: &str,
    x: f32,
    y: f32,
    color: ColorIndex,
) -> Result<(), ConsoleError> {
    let (x, y) = (x.floor() as i32, y.floor() as i32);
    let color = fb.palette.draw(color);
    for (i, ch) in text.chars().enumerate() {
        let pos = glyph_position(ch);
        let gx = (pos % 16) * GLYPH_PITCH_X;
        let gy = (pos / 16) * GLYPH_PITCH_Y;
        fb.blit_masked(
            font,
            gx,
            gy,
            x + i as i32 * CHAR_ADVANCE,
            y,
            GLYPH_W,
            GLYPH_H,
            GLYPH_INK,
            color,
        )?;
    }
    Ok(())
}

/// Print text horizontally centered on `cx`.
pub fn print_centered(
    fb: &mut Framebuffer,
    font: &PixelSheet,
    text: &str,
    cx: f32,
    y: f32,
    color: ColorIndex,
) -> Result<(), ConsoleError> {
    let half = text.chars().count() as f32 * 2.0;
    print(fb, font, text, cx - half, y, color)
}
