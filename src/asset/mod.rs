//! Asset loading
//!
//! The console needs four files before the first frame can run:
//!
//! ```text
//! assets/
//! ├── sprites.png        # 128x128 sprite sheet, palette-pure RGBA
//! ├── font.png           # 128x128 glyph sheet, ink color 7
//! ├── map.txt            # 128x64 tiles as hex byte pairs
//! └── sprite_flags.txt   # 256 flag bytes as hex pairs
//! ```
//!
//! Loading is staged so the frame clock can keep presenting a status line:
//! `poll` fetches raw bytes on one call and decodes on the next.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::ConsoleError;
use crate::rasterizer::{PixelSheet, SHEET_SIZE};
use crate::world::TileMap;

pub const SPRITES_FILE: &str = "sprites.png";
pub const FONT_FILE: &str = "font.png";
pub const MAP_FILE: &str = "map.txt";
pub const FLAGS_FILE: &str = "sprite_flags.txt";

/// Everything the runtime reads from disk, decoded.
#[derive(Debug, Clone)]
pub struct AssetBundle {
    pub sprites: PixelSheet,
    pub font: PixelSheet,
    pub map: TileMap,
}

/// Where raw asset bytes come from.
pub trait AssetSource {
    fn read(&self, name: &str) -> Result<Vec<u8>, ConsoleError>;
}

/// Reads assets from a directory on disk.
#[derive(Debug, Clone)]
pub struct DirSource {
    base_dir: PathBuf,
}

impl DirSource {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }
}

impl AssetSource for DirSource {
    fn read(&self, name: &str) -> Result<Vec<u8>, ConsoleError> {
        let path = self.base_dir.join(name);
        std::fs::read(&path)
            .map_err(|e| ConsoleError::asset(path.display().to_string(), e.to_string()))
    }
}

/// In-memory asset files, keyed by file name.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, bytes: Vec<u8>) {
        self.files.insert(name.to_string(), bytes);
    }
}

impl AssetSource for MemorySource {
    fn read(&self, name: &str) -> Result<Vec<u8>, ConsoleError> {
        self.files
            .get(name)
            .cloned()
            .ok_or_else(|| ConsoleError::asset(name, "not found"))
    }
}

/// Decode a PNG into RGBA pixels.
pub fn decode_png(bytes: &[u8]) -> Result<PixelSheet, ConsoleError> {
    let img = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)?.to_rgba8();
    let (width, height) = img.dimensions();
    Ok(PixelSheet::new(width as usize, height as usize, img.into_raw()))
}

/// Raw bytes of all four files, not yet decoded.
struct RawAssets {
    sprites: Vec<u8>,
    font: Vec<u8>,
    map: Vec<u8>,
    flags: Vec<u8>,
}

enum LoadStage {
    Downloading,
    Decoding(RawAssets),
    Ready,
    Failed(String),
}

/// Staged loader polled once per frame until the bundle is ready.
pub struct AssetLoader<S: AssetSource> {
    source: S,
    stage: LoadStage,
}

impl<S: AssetSource> AssetLoader<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            stage: LoadStage::Downloading,
        }
    }

    /// Status line shown while the bundle is not ready.
    pub fn status(&self) -> String {
        match &self.stage {
            LoadStage::Downloading => "Downloading assets".to_string(),
            LoadStage::Decoding(_) => "Decoding assets".to_string(),
            LoadStage::Ready => "Ready".to_string(),
            LoadStage::Failed(reason) => format!("Asset load failed: {}", reason),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.stage, LoadStage::Failed(_))
    }

    /// Advance one stage. Returns the bundle exactly once, when decoding completes.
    ///
    /// A failure parks the loader in the failed stage; later polls return
    /// `None` without retrying.
    pub fn poll(&mut self) -> Option<AssetBundle> {
        match std::mem::replace(&mut self.stage, LoadStage::Ready) {
            LoadStage::Downloading => {
                self.stage = match self.fetch() {
                    Ok(raw) => {
                        tracing::debug!("asset files fetched");
                        LoadStage::Decoding(raw)
                    }
                    Err(e) => self.fail(e),
                };
                None
            }
            LoadStage::Decoding(raw) => match decode(&raw) {
                Ok(bundle) => {
                    tracing::info!(
                        sprites = ?(bundle.sprites.width, bundle.sprites.height),
                        "assets decoded"
                    );
                    self.stage = LoadStage::Ready;
                    Some(bundle)
                }
                Err(e) => {
                    self.stage = self.fail(e);
                    None
                }
            },
            other => {
                self.stage = other;
                None
            }
        }
    }

    fn fetch(&self) -> Result<RawAssets, ConsoleError> {
        Ok(RawAssets {
            sprites: self.source.read(SPRITES_FILE)?,
            font: self.source.read(FONT_FILE)?,
            map: self.source.read(MAP_FILE)?,
            flags: self.source.read(FLAGS_FILE)?,
        })
    }

    fn fail(&self, e: ConsoleError) -> LoadStage {
        tracing::error!("asset load failed: {}", e);
        LoadStage::Failed(e.to_string())
    }
}

fn decode(raw: &RawAssets) -> Result<AssetBundle, ConsoleError> {
    let map_text =
        std::str::from_utf8(&raw.map).map_err(|e| ConsoleError::asset(MAP_FILE, e.to_string()))?;
    let flags_text = std::str::from_utf8(&raw.flags)
        .map_err(|e| ConsoleError::asset(FLAGS_FILE, e.to_string()))?;
    Ok(AssetBundle {
        sprites: decode_sheet(SPRITES_FILE, &raw.sprites)?,
        font: decode_sheet(FONT_FILE, &raw.font)?,
        map: TileMap::parse(map_text, flags_text)?,
    })
}

/// Decode a sprite or font sheet, which must be exactly 128x128.
fn decode_sheet(name: &str, bytes: &[u8]) -> Result<PixelSheet, ConsoleError> {
    let sheet = decode_png(bytes)?;
    if (sheet.width, sheet.height) != (SHEET_SIZE, SHEET_SIZE) {
        return Err(ConsoleError::asset(
            name,
            format!(
                "expected {SHEET_SIZE}x{SHEET_SIZE} pixels, got {}x{}",
                sheet.width, sheet.height
            ),
        ));
    }
    Ok(sheet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::types::PALETTE;
    use crate::world::{FLAG_COUNT, MAP_H, MAP_W};
    use std::io::Cursor;

    fn png_of_color(w: u32, h: u32, color: usize) -> Vec<u8> {
        let [r, g, b] = PALETTE[color];
        let img = image::RgbaImage::from_pixel(w, h, image::Rgba([r, g, b, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn full_source() -> MemorySource {
        let mut src = MemorySource::new();
        src.insert(SPRITES_FILE, png_of_color(128, 128, 8));
        src.insert(FONT_FILE, png_of_color(128, 128, 7));
        src.insert(MAP_FILE, "01".repeat(MAP_W * MAP_H).into_bytes());
        src.insert(FLAGS_FILE, "03".repeat(FLAG_COUNT).into_bytes());
        src
    }

    #[test]
    fn test_decode_png_round_trips_palette_colors() {
        let sheet = decode_png(&png_of_color(16, 8, 12)).unwrap();
        assert_eq!((sheet.width, sheet.height), (16, 8));
        assert_eq!(sheet.color_at(15, 7).unwrap(), 12);
    }

    #[test]
    fn test_loader_stages() {
        let mut loader = AssetLoader::new(full_source());
        assert_eq!(loader.status(), "Downloading assets");
        assert!(loader.poll().is_none());
        assert_eq!(loader.status(), "Decoding assets");

        let bundle = loader.poll().expect("bundle after decode");
        assert_eq!(bundle.sprites.color_at(0, 0).unwrap(), 8);
        assert_eq!(bundle.map.mget(0, 0), 0x01);
        // Lower half is stored low-nibble first
        assert_eq!(bundle.map.mget(0, 40), 0x10);
        assert_eq!(bundle.map.fget(200), 0x03);

        // Delivered once
        assert!(loader.poll().is_none());
    }

    #[test]
    fn test_truncated_sheet_fails_decode() {
        let mut src = full_source();
        src.insert(SPRITES_FILE, png_of_color(128, 64, 8));
        let mut loader = AssetLoader::new(src);
        assert!(loader.poll().is_none());
        assert!(loader.poll().is_none());
        assert!(loader.is_failed());
        assert!(loader.status().contains(SPRITES_FILE));
        assert!(loader.status().contains("128x64"));
    }

    #[test]
    fn test_loader_failure_is_sticky() {
        let mut src = full_source();
        src.files.remove(FONT_FILE);
        let mut loader = AssetLoader::new(src);
        assert!(loader.poll().is_none());
        assert!(loader.is_failed());
        assert!(loader.status().contains(FONT_FILE));
        assert!(loader.poll().is_none());
        assert!(loader.is_failed());
    }

    #[test]
    fn test_loader_decode_failure() {
        let mut src = full_source();
        src.insert(SPRITES_FILE, b"not a png".to_vec());
        let mut loader = AssetLoader::new(src);
        assert!(loader.poll().is_none());
        assert!(loader.poll().is_none());
        assert!(loader.is_failed());
    }

    #[test]
    fn test_dir_source_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MAP_FILE), "ab").unwrap();
        let src = DirSource::new(dir.path());
        assert_eq!(src.read(MAP_FILE).unwrap(), b"ab".to_vec());
        assert!(src.read(FONT_FILE).is_err());
    }
}
