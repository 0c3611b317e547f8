//! Console math helpers
//!
//! Angles are in turns (1.0 = full circle) and `sin` is inverted so that
//! positive y points down the screen.

use std::f32::consts::TAU;

pub fn sin(turns: f32) -> f32 {
    -(turns * TAU).sin()
}

pub fn cos(turns: f32) -> f32 {
    (turns * TAU).cos()
}

/// Round half up.
pub fn round(x: f32) -> f32 {
    (x + 0.5).floor()
}

/// -1, 0 or 1.
pub fn sign(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Move `value` toward `target` by at most `amount`.
pub fn approach(value: f32, target: f32, amount: f32) -> f32 {
    if value > target {
        (value - amount).max(target)
    } else {
        (value + amount).min(target)
    }
}
