//! Framebuffer and primitive drawing
//!
//! The buffer is RGBA at a fixed 128x128. Every write goes through
//! `put_pixel`, which applies the camera offset and silently clips.
//! Colors are palette indices; the draw-time remap is applied once per
//! primitive call, the display-time remap once per frame in
//! `apply_display_remap`.

use super::constants::{HEIGHT, PIXEL_STRIDE, ROW_STRIDE, WIDTH};
use super::types::{color_from_rgb, rgb_of, ColorIndex, PaletteState, PixelSheet};
use crate::error::ConsoleError;

/// Palette-indexed software framebuffer
pub struct Framebuffer {
    pixels: Vec<u8>, // RGBA, 4 bytes per pixel
    camera_x: i32,
    camera_y: i32,
    pub palette: PaletteState,
}

impl Framebuffer {
    pub fn new() -> Self {
        Self {
            pixels: vec![0; WIDTH * HEIGHT * PIXEL_STRIDE],
            camera_x: 0,
            camera_y: 0,
            palette: PaletteState::new(),
        }
    }

    pub fn width(&self) -> usize {
        WIDTH
    }

    pub fn height(&self) -> usize {
        HEIGHT
    }

    /// Raw RGBA bytes, row-major
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Palette index currently stored at a screen pixel (ignores the camera).
    pub fn pixel(&self, x: usize, y: usize) -> Result<ColorIndex, ConsoleError> {
        let i = x * PIXEL_STRIDE + y * ROW_STRIDE;
        color_from_rgb(self.pixels[i], self.pixels[i + 1], self.pixels[i + 2])
    }

    /// Alpha byte at a screen pixel.
    pub fn alpha(&self, x: usize, y: usize) -> u8 {
        self.pixels[x * PIXEL_STRIDE + y * ROW_STRIDE + 3]
    }

    // =========================================================================
    // State
    // =========================================================================

    /// Set the camera. Subsequent draws are shifted by (-x, -y).
    pub fn camera(&mut self, x: f32, y: f32) {
        self.camera_x = -(x.floor() as i32);
        self.camera_y = -(y.floor() as i32);
    }

    /// `pal()` with no arguments: both remap tables back to identity.
    pub fn reset_palette(&mut self) {
        self.palette.reset();
    }

    pub fn set_draw_remap(&mut self, from: ColorIndex, to: ColorIndex) {
        self.palette.set_draw_remap(from, to);
    }

    pub fn set_display_remap(&mut self, from: ColorIndex, to: ColorIndex) {
        self.palette.set_display_remap(from, to);
    }

    pub fn set_transparent(&mut self, color: ColorIndex, transparent: bool) {
        self.palette.set_transparent(color, transparent);
    }

    // =========================================================================
    // Primitives
    // =========================================================================

    /// Fill the whole buffer with the remapped color at full opacity.
    pub fn clear(&mut self, color: ColorIndex) {
        let [r, g, b] = rgb_of(self.palette.draw(color));
        for px in self.pixels.chunks_exact_mut(PIXEL_STRIDE) {
            px[0] = r;
            px[1] = g;
            px[2] = b;
            px[3] = 255;
        }
    }

    /// Write one pixel. The color is used as given (no remap); alpha is left untouched.
    pub fn put_pixel(&mut self, x: i32, y: i32, color: ColorIndex) {
        let x = x + self.camera_x;
        let y = y + self.camera_y;
        if x < 0 || x >= WIDTH as i32 || y < 0 || y >= HEIGHT as i32 {
            return;
        }
        let i = x as usize * PIXEL_STRIDE + y as usize * ROW_STRIDE;
        let [r, g, b] = rgb_of(color);
        self.pixels[i] = r;
        self.pixels[i + 1] = g;
        self.pixels[i + 2] = b;
    }

    /// Bresenham line, endpoints inclusive.
    pub fn line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, color: ColorIndex) {
        let color = self.palette.draw(color);
        self.raw_line(
            x0.floor() as i32,
            y0.floor() as i32,
            x1.floor() as i32,
            y1.floor() as i32,
            color,
        );
    }

    fn raw_line(&mut self, mut x0: i32, mut y0: i32, x1: i32, y1: i32, color: ColorIndex) {
        let dx = (x1 - x0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let dy = -(y1 - y0).abs();
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.put_pixel(x0, y0, color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    /// Circle outline (midpoint algorithm, 4-way symmetric plots).
    pub fn circ(&mut self, cx: f32, cy: f32, r: f32, color: ColorIndex) {
        let color = self.palette.draw(color);
        let (xm, ym) = (cx.floor() as i32, cy.floor() as i32);
        for_each_circle_point(r.floor() as i32, |dx, dy| {
            self.put_pixel(xm + dx, ym + dy, color);
        });
    }

    /// Filled circle with the same silhouette as `circ`.
    ///
    /// Each row is spanned between the leftmost and rightmost outline point
    /// the midpoint pass produced on it.
    pub fn circfill(&mut self, cx: f32, cy: f32, r: f32, color: ColorIndex) {
        let color = self.palette.draw(color);
        let (xm, ym) = (cx.floor() as i32, cy.floor() as i32);
        let r = r.floor() as i32;
        if r < 0 {
            return;
        }

        // Row extents indexed by dy + r
        let mut extents: Vec<Option<(i32, i32)>> = vec![None; (2 * r + 1) as usize];
        for_each_circle_point(r, |dx, dy| {
            let row = &mut extents[(dy + r) as usize];
            *row = Some(match *row {
                Some((lo, hi)) => (lo.min(dx), hi.max(dx)),
                None => (dx, dx),
            });
        });

        for (i, extent) in extents.iter().enumerate() {
            if let Some((lo, hi)) = *extent {
                let y = ym + i as i32 - r;
                self.raw_line(xm + lo, y, xm + hi, y, color);
            }
        }
    }

    /// Rectangle outline, both corners inclusive.
    pub fn rect(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, color: ColorIndex) {
        let color = self.palette.draw(color);
        let (x0, y0, x1, y1) = floor4(x0, y0, x1, y1);
        for x in x0..=x1 {
            self.put_pixel(x, y0, color);
            self.put_pixel(x, y1, color);
        }
        for y in y0..=y1 {
            self.put_pixel(x0, y, color);
            self.put_pixel(x1, y, color);
        }
    }

    /// Filled rectangle, both corners inclusive.
    pub fn rectfill(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, color: ColorIndex) {
        let color = self.palette.draw(color);
        let (x0, y0, x1, y1) = floor4(x0, y0, x1, y1);
        for y in y0..=y1 {
            for x in x0..=x1 {
                self.put_pixel(x, y, color);
            }
        }
    }

    // =========================================================================
    // Blitting
    // =========================================================================

    /// Copy a `w`x`h` block of a source sheet.
    ///
    /// Each source pixel is resolved to its palette index, draw-remapped,
    /// skipped if the remapped color is transparent, and written with
    /// optional flips of the destination coordinate.
    #[allow(clippy::too_many_arguments)]
    pub fn blit(
        &mut self,
        source: &PixelSheet,
        sx: usize,
        sy: usize,
        dx: i32,
        dy: i32,
        w: usize,
        h: usize,
        flip_x: bool,
        flip_y: bool,
    ) -> Result<(), ConsoleError> {
        for y in 0..h {
            for x in 0..w {
                let mapped = self.palette.draw(source.color_at(sx + x, sy + y)?);
                if self.palette.is_transparent(mapped) {
                    continue;
                }
                let tx = if flip_x { w - 1 - x } else { x };
                let ty = if flip_y { h - 1 - y } else { y };
                self.put_pixel(dx + tx as i32, dy + ty as i32, mapped);
            }
        }
        Ok(())
    }

    /// Stamp `out_color` wherever the unmapped source color equals `mask_color`.
    ///
    /// Used for monochrome glyphs; bypasses both the draw remap and the
    /// transparency mask.
    #[allow(clippy::too_many_arguments)]
    pub fn blit_masked(
        &mut self,
        source: &PixelSheet,
        sx: usize,
        sy: usize,
        dx: i32,
        dy: i32,
        w: usize,
        h: usize,
        mask_color: ColorIndex,
        out_color: ColorIndex,
    ) -> Result<(), ConsoleError> {
        for y in 0..h {
            for x in 0..w {
                if source.color_at(sx + x, sy + y)? == mask_color {
                    self.put_pixel(dx + x as i32, dy + y as i32, out_color);
                }
            }
        }
        Ok(())
    }

    // =========================================================================
    // Presentation
    // =========================================================================

    /// Run every pixel through the display-time remap.
    pub fn apply_display_remap(&mut self) -> Result<(), ConsoleError> {
        for px in self.pixels.chunks_exact_mut(PIXEL_STRIDE) {
            let color = color_from_rgb(px[0], px[1], px[2])?;
            let [r, g, b] = rgb_of(self.palette.display(color));
            px[0] = r;
            px[1] = g;
            px[2] = b;
        }
        Ok(())
    }
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new()
    }
}

fn floor4(x0: f32, y0: f32, x1: f32, y1: f32) -> (i32, i32, i32, i32) {
    (
        x0.floor() as i32,
        y0.floor() as i32,
        x1.floor() as i32,
        y1.floor() as i32,
    )
}

/// Midpoint circle walk, calling `plot` with offsets from the center.
fn for_each_circle_point(r: i32, mut plot: impl FnMut(i32, i32)) {
    if r < 0 {
        return;
    }
    let mut x = -r;
    let mut y = 0;
    let mut err = 2 - 2 * r;
    loop {
        plot(-x, y);
        plot(-y, -x);
        plot(x, -y);
        plot(y, x);
        let e = err;
        if e <= y {
            y += 1;
            err += y * 2 + 1;
        }
        if e > x || err > y {
            x += 1;
            err += x * 2 + 1;
        }
        if x >= 0 {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::types::PALETTE;
    use std::collections::HashSet;

    fn lit(fb: &Framebuffer, color: ColorIndex) -> HashSet<(usize, usize)> {
        let mut set = HashSet::new();
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                if fb.pixel(x, y).unwrap() == color {
                    set.insert((x, y));
                }
            }
        }
        set
    }

    #[test]
    fn test_clear_is_opaque_and_remapped() {
        let mut fb = Framebuffer::new();
        fb.set_draw_remap(3, 9);
        fb.clear(3);
        assert_eq!(fb.pixel(0, 0).unwrap(), 9);
        assert_eq!(fb.pixel(127, 127).unwrap(), 9);
        assert_eq!(fb.alpha(64, 64), 255);
    }

    #[test]
    fn test_put_pixel_clips_and_keeps_alpha() {
        let mut fb = Framebuffer::new();
        fb.put_pixel(-1, 0, 7);
        fb.put_pixel(128, 0, 7);
        fb.put_pixel(0, 128, 7);
        assert!(lit(&fb, 7).is_empty());

        fb.put_pixel(5, 6, 7);
        assert_eq!(fb.pixel(5, 6).unwrap(), 7);
        assert_eq!(fb.alpha(5, 6), 0);
    }

    #[test]
    fn test_camera_offsets_writes() {
        let mut fb = Framebuffer::new();
        fb.clear(0);
        fb.camera(-2.0, 3.7);
        fb.put_pixel(0, 5, 8);
        // camera(-2, 3.7) shifts by (+2, -3)
        assert_eq!(fb.pixel(2, 2).unwrap(), 8);
    }

    #[test]
    fn test_line_endpoints_inclusive() {
        let mut fb = Framebuffer::new();
        fb.clear(0);
        fb.line(1.0, 1.0, 6.0, 3.0, 7);
        let pts = lit(&fb, 7);
        assert!(pts.contains(&(1, 1)));
        assert!(pts.contains(&(6, 3)));
        assert_eq!(pts.len(), 6);
    }

    #[test]
    fn test_line_remaps_once() {
        let mut fb = Framebuffer::new();
        fb.clear(0);
        fb.set_draw_remap(7, 8);
        fb.set_draw_remap(8, 9);
        fb.line(0.0, 0.0, 3.0, 0.0, 7);
        assert_eq!(fb.pixel(2, 0).unwrap(), 8);
    }

    #[test]
    fn test_rectfill_inclusive_bounds() {
        let mut fb = Framebuffer::new();
        fb.clear(0);
        fb.rectfill(2.0, 3.0, 4.0, 5.0, 11);
        assert_eq!(lit(&fb, 11).len(), 9);
        fb.rect(10.0, 10.0, 13.0, 12.0, 12);
        // 4x3 outline = 10 distinct pixels
        assert_eq!(lit(&fb, 12).len(), 10);
    }

    #[test]
    fn test_circle_outline_and_fill_share_silhouette() {
        for r in 0..6 {
            let mut outline = Framebuffer::new();
            outline.clear(0);
            outline.circ(40.0, 40.0, r as f32, 7);
            let mut filled = Framebuffer::new();
            filled.clear(0);
            filled.circfill(40.0, 40.0, r as f32, 7);

            let o = lit(&outline, 7);
            let f = lit(&filled, 7);
            assert!(o.is_subset(&f), "outline escapes fill at r={}", r);
            // Row extents match
            for y in 30..51 {
                let ox: Vec<usize> = o.iter().filter(|p| p.1 == y).map(|p| p.0).collect();
                let fx: Vec<usize> = f.iter().filter(|p| p.1 == y).map(|p| p.0).collect();
                assert_eq!(ox.iter().min(), fx.iter().min());
                assert_eq!(ox.iter().max(), fx.iter().max());
            }
        }
    }

    #[test]
    fn test_circle_radius_zero_is_single_pixel() {
        let mut fb = Framebuffer::new();
        fb.clear(0);
        fb.circfill(10.0, 10.0, 0.0, 7);
        assert_eq!(lit(&fb, 7).len(), 1);
    }

    fn checker_sheet() -> PixelSheet {
        // 8x8: column 0 transparent (color 0), the rest color 8
        let mut sheet = PixelSheet::filled(8, 8, 8);
        for y in 0..8 {
            sheet.set(0, y, 0);
        }
        sheet
    }

    #[test]
    fn test_blit_skips_transparent_and_flips() {
        let sheet = checker_sheet();
        let mut fb = Framebuffer::new();
        fb.clear(1);
        fb.blit(&sheet, 0, 0, 0, 0, 8, 8, false, false).unwrap();
        assert_eq!(fb.pixel(0, 0).unwrap(), 1);
        assert_eq!(fb.pixel(1, 0).unwrap(), 8);

        fb.clear(1);
        fb.blit(&sheet, 0, 0, 0, 0, 8, 8, true, false).unwrap();
        assert_eq!(fb.pixel(7, 0).unwrap(), 1);
        assert_eq!(fb.pixel(0, 0).unwrap(), 8);
    }

    #[test]
    fn test_blit_remap_controls_transparency() {
        let sheet = checker_sheet();
        let mut fb = Framebuffer::new();
        fb.clear(1);
        // 8 remapped to 0 becomes transparent
        fb.set_draw_remap(8, 0);
        fb.blit(&sheet, 0, 0, 0, 0, 8, 8, false, false).unwrap();
        assert_eq!(fb.pixel(3, 3).unwrap(), 1);

        // Making 0 opaque lets the (remapped) pixels through
        fb.set_transparent(0, false);
        fb.blit(&sheet, 0, 0, 0, 0, 8, 8, false, false).unwrap();
        assert_eq!(fb.pixel(3, 3).unwrap(), 0);
    }

    #[test]
    fn test_blit_unknown_color_fails() {
        let mut sheet = PixelSheet::filled(8, 8, 7);
        sheet.pixels[0] = 1;
        let mut fb = Framebuffer::new();
        let err = fb.blit(&sheet, 0, 0, 0, 0, 8, 8, false, false).unwrap_err();
        assert!(matches!(err, ConsoleError::UnknownColor { .. }));
    }

    #[test]
    fn test_blit_masked_ignores_remap_and_transparency() {
        let mut glyph = PixelSheet::filled(4, 4, 0);
        glyph.set(1, 1, 7);
        let mut fb = Framebuffer::new();
        fb.clear(2);
        fb.set_draw_remap(7, 3);
        fb.set_transparent(5, true);
        fb.blit_masked(&glyph, 0, 0, 10, 10, 4, 4, 7, 5).unwrap();
        assert_eq!(fb.pixel(11, 11).unwrap(), 5);
        assert_eq!(fb.pixel(10, 10).unwrap(), 2);
    }

    #[test]
    fn test_display_remap_applies_to_whole_buffer() {
        let mut fb = Framebuffer::new();
        fb.clear(4);
        fb.put_pixel(0, 0, 6);
        fb.set_display_remap(4, 12);
        fb.apply_display_remap().unwrap();
        assert_eq!(fb.pixel(1, 1).unwrap(), 12);
        assert_eq!(fb.pixel(0, 0).unwrap(), 6);
        assert_eq!(&fb.pixels()[4..7], &PALETTE[12]);
    }

    #[test]
    fn test_palette_reset_round_trip() {
        let mut fb = Framebuffer::new();
        fb.set_draw_remap(5, 8);
        fb.reset_palette();
        fb.clear(5);
        assert_eq!(fb.pixel(0, 0).unwrap(), 5);
    }
}
