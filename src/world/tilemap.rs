//! Tile map and sprite flags
//!
//! The map is a 128x64 grid of sprite indices, split into 32 scenes of
//! 16x16 tiles (8 scenes per row). Each sprite index has a flag byte;
//! gameplay reads bit 0 (solid) and bit 4 (ice), terrain drawing reads
//! the layer bits.

use crate::error::ConsoleError;
use crate::rasterizer::constants::SPRITE_SIZE;

/// Map width in tiles
pub const MAP_W: usize = 128;
/// Map height in tiles
pub const MAP_H: usize = 64;
/// Scene size in tiles (both axes)
pub const SCENE_TILES: usize = 16;
/// Scenes per map row
pub const SCENES_PER_ROW: usize = MAP_W / SCENE_TILES;
/// Number of sprite indices carrying a flag byte
pub const FLAG_COUNT: usize = 256;

pub const FLAG_SOLID: u8 = 0;
pub const FLAG_ICE: u8 = 4;

/// Terrain layer masks, drawn back to front
pub const LAYER_BACKGROUND: u8 = 4;
pub const LAYER_FOREGROUND: u8 = 8;
pub const LAYER_MAIN: u8 = 2;

/// Spike sprites, by the side they point to
pub mod spike {
    pub const UP: u8 = 17;
    pub const DOWN: u8 = 27;
    pub const RIGHT: u8 = 43;
    pub const LEFT: u8 = 59;
}

/// Tile origin of a scene.
pub fn scene_origin(level: u32) -> (i32, i32) {
    let n = level as usize;
    (
        ((n % SCENES_PER_ROW) * SCENE_TILES) as i32,
        ((n / SCENES_PER_ROW) * SCENE_TILES) as i32,
    )
}

/// The tile grid plus per-sprite flag bytes.
#[derive(Debug, Clone)]
pub struct TileMap {
    tiles: Vec<u8>, // row-major, MAP_W x MAP_H
    flags: [u8; FLAG_COUNT],
}

impl TileMap {
    /// An all-zero map with no flags set.
    pub fn empty() -> Self {
        Self {
            tiles: vec![0; MAP_W * MAP_H],
            flags: [0; FLAG_COUNT],
        }
    }

    /// Build from the map hex text and the flag hex text.
    ///
    /// Map text holds 2 hex digits per tile. The upper 32 rows are
    /// high-nibble first; the lower 32 rows come from the shared sprite
    /// memory and store each byte low-nibble first. Line breaks are ignored.
    pub fn parse(map_text: &str, flags_text: &str) -> Result<Self, ConsoleError> {
        let digits: Vec<u8> = map_text.bytes().filter(|b| !matches!(b, b'\n' | b'\r')).collect();
        if digits.len() < MAP_W * MAP_H * 2 {
            return Err(ConsoleError::asset(
                "map",
                format!("expected {} hex digits, found {}", MAP_W * MAP_H * 2, digits.len()),
            ));
        }

        let mut tiles = vec![0; MAP_W * MAP_H];
        for (i, tile) in tiles.iter_mut().enumerate() {
            let (a, b) = (digits[2 * i], digits[2 * i + 1]);
            let swapped = i / MAP_W >= MAP_H / 2;
            *tile = if swapped {
                hex_byte(b, a, "map")?
            } else {
                hex_byte(a, b, "map")?
            };
        }

        Ok(Self {
            tiles,
            flags: parse_flags(flags_text)?,
        })
    }

    /// Tile at (x, y). Out-of-range cells read as 0.
    pub fn mget(&self, x: i32, y: i32) -> u8 {
        if x < 0 || y < 0 || x as usize >= MAP_W || y as usize >= MAP_H {
            return 0;
        }
        self.tiles[y as usize * MAP_W + x as usize]
    }

    /// Overwrite the tile at (x, y). Out-of-range writes are ignored.
    pub fn mset(&mut self, x: i32, y: i32, tile: u8) {
        if x < 0 || y < 0 || x as usize >= MAP_W || y as usize >= MAP_H {
            return;
        }
        self.tiles[y as usize * MAP_W + x as usize] = tile;
    }

    /// Full flag byte of a sprite.
    pub fn fget(&self, sprite: u8) -> u8 {
        self.flags[sprite as usize]
    }

    /// Single flag bit of a sprite.
    pub fn fget_flag(&self, sprite: u8, flag: u8) -> bool {
        self.flags[sprite as usize] & (1 << flag) != 0
    }

    pub fn set_flags(&mut self, sprite: u8, flags: u8) {
        self.flags[sprite as usize] = flags;
    }

    /// Whether any tile under a pixel rectangle carries `flag`.
    ///
    /// The rectangle is in scene-local pixels; the scanned tile span is
    /// clamped to the 16x16 scene at `origin`.
    pub fn rect_has_flag(
        &self,
        origin: (i32, i32),
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        flag: u8,
    ) -> bool {
        let mut hit = false;
        for_each_tile(x, y, w, h, |i, j| {
            if !hit && self.fget_flag(self.mget(origin.0 + i, origin.1 + j), flag) {
                hit = true;
            }
        });
        hit
    }

    /// Whether a moving hitbox touches a spike pointing against its motion.
    ///
    /// Spikes only hurt from the side they point to: up-spikes while not
    /// rising and with the box bottom in the lower part of the tile, and so
    /// on for the other three directions.
    #[allow(clippy::too_many_arguments)]
    pub fn spikes_at(
        &self,
        origin: (i32, i32),
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        speed_x: f32,
        speed_y: f32,
    ) -> bool {
        let size = SPRITE_SIZE as f32;
        let mut hit = false;
        for_each_tile(x, y, w, h, |i, j| {
            if hit {
                return;
            }
            let tile = self.mget(origin.0 + i, origin.1 + j);
            hit = match tile {
                spike::UP => {
                    ((y + h - 1.0) % size >= 6.0 || y + h == j as f32 * size + size)
                        && speed_y >= 0.0
                }
                spike::DOWN => y % size <= 2.0 && speed_y <= 0.0,
                spike::RIGHT => x % size <= 2.0 && speed_x <= 0.0,
                spike::LEFT => {
                    ((x + w - 1.0) % size >= 6.0 || x + w == i as f32 * size + size)
                        && speed_x >= 0.0
                }
                _ => false,
            };
        });
        hit
    }
}

impl Default for TileMap {
    fn default() -> Self {
        Self::empty()
    }
}

/// Visit scene-local tile coordinates under a pixel rectangle.
///
/// The first tile is floored and clamped at 0; the last is clamped at 15
/// and the span is inclusive.
fn for_each_tile(x: f32, y: f32, w: f32, h: f32, mut visit: impl FnMut(i32, i32)) {
    let size = SPRITE_SIZE as f32;
    let last = (SCENE_TILES - 1) as f32;
    let first_x = (x / size).floor().max(0.0) as i32;
    let last_x = ((x + w - 1.0) / size).min(last).floor() as i32;
    let first_y = (y / size).floor().max(0.0) as i32;
    let last_y = ((y + h - 1.0) / size).min(last).floor() as i32;
    for i in first_x..=last_x {
        for j in first_y..=last_y {
            visit(i, j);
        }
    }
}

fn parse_flags(text: &str) -> Result<[u8; FLAG_COUNT], ConsoleError> {
    let digits: Vec<u8> = text.bytes().filter(|b| !matches!(b, b'\n' | b'\r')).collect();
    if digits.len() < FLAG_COUNT * 2 {
        return Err(ConsoleError::asset(
            "flags",
            format!("expected {} hex digits, found {}", FLAG_COUNT * 2, digits.len()),
        ));
    }
    let mut flags = [0; FLAG_COUNT];
    for (i, flag) in flags.iter_mut().enumerate() {
        *flag = hex_byte(digits[2 * i], digits[2 * i + 1], "flags")?;
    }
    Ok(flags)
}

fn hex_byte(hi: u8, lo: u8, what: &str) -> Result<u8, ConsoleError> {
    let nibble = |d: u8| {
        (d as char)
            .to_digit(16)
            .map(|v| v as u8)
            .ok_or_else(|| ConsoleError::asset(what, format!("invalid hex digit '{}'", d as char)))
    };
    Ok(nibble(hi)? << 4 | nibble(lo)?)
}
