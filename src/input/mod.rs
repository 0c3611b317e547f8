//! Input handling with gamepad support
//!
//! Six console buttons read as a per-frame snapshot. Gameplay only ever
//! sees a `ButtonSet`, so tests drive it with `ScriptedInput`.
//!
//! Native: keyboard via macroquad, gamepad via gilrs
//! WASM: keyboard only

mod actions;
mod gamepad;
mod state;

pub use actions::*;
pub use gamepad::Gamepad;
pub use state::*;
