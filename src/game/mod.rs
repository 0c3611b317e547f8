//! Game Module
//!
//! The platformer cartridge: a fixed-capacity entity pool with a
//! parent/child ownership graph, per-kind behaviors, axis-separated solid
//! collision and a stable draw order.
//!
//! Key pieces:
//! - Entity: pooled record addressed by a slot + id handle
//! - EntityPool: FIFO slot reuse, kind index, draw ordering
//! - Game: the context the frame clock drives each tick

#![allow(dead_code)]

pub mod behavior;
pub mod collision;
pub mod entity;
pub mod math;
pub mod pool;
pub mod renderer;
pub mod runtime;
pub mod spawn;
pub mod state;

// Re-export main types
pub use entity::EntityKind;
pub use runtime::{Game, GameOptions};
