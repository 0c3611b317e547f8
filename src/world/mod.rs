//! World module - scene-based tile map
//!
//! - 128x64 tile grid split into 32 scenes of 16x16 tiles
//! - Per-sprite flag bytes (solid, ice, terrain layers)
//! - Flag and spike queries over a hitbox's tile span

#![allow(dead_code)]

mod tilemap;

pub use tilemap::*;
