//! Console error taxonomy
//!
//! Every fallible engine path returns `Result<_, ConsoleError>`. Pool
//! exhaustion and unknown colors are fatal to the frame that hits them:
//! the frame clock logs them and stops instead of guessing.

use crate::game::EntityKind;

/// Errors raised by the console runtime.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// Entity creation beyond the fixed pool capacity.
    #[error("entity pool exhausted ({capacity} slots) while creating {kind:?}")]
    PoolExhausted { capacity: usize, kind: EntityKind },

    /// An RGB triple that is not one of the 16 palette entries.
    #[error("color ({r}, {g}, {b}) is not in the palette")]
    UnknownColor { r: u8, g: u8, b: u8 },

    /// A blit read past the edge of its source sheet.
    #[error("read at ({x}, {y}) is outside the {width}x{height} sheet")]
    SheetOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },

    /// An asset could not be read or decoded.
    #[error("asset '{path}': {reason}")]
    Asset { path: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Config(#[from] ron::error::SpannedError),

    #[error("serialize error: {0}")]
    Serialize(#[from] ron::Error),

    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),
}

impl ConsoleError {
    pub fn asset(path: impl Into<String>, reason: impl Into<String>) -> Self {
        ConsoleError::Asset {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
