//! Input state management
//!
//! Polls keyboard (macroquad) and gamepad (gilrs) once per frame and
//! merges them into a single `ButtonSet`.

use macroquad::prelude::*;

use super::{Button, ButtonSet, Gamepad, InputSource};

/// Live keyboard + gamepad input
pub struct InputState {
    gamepad: Gamepad,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            gamepad: Gamepad::new(),
        }
    }

    pub fn has_gamepad(&self) -> bool {
        self.gamepad.has_gamepad()
    }

    fn keyboard(&self) -> ButtonSet {
        let mut set = ButtonSet::NONE;
        set.set(Button::Left, is_key_down(KeyCode::Left));
        set.set(Button::Right, is_key_down(KeyCode::Right));
        set.set(Button::Up, is_key_down(KeyCode::Up));
        set.set(Button::Down, is_key_down(KeyCode::Down));
        set.set(Button::Jump, is_key_down(KeyCode::Z) || is_key_down(KeyCode::C));
        set.set(Button::Dash, is_key_down(KeyCode::X) || is_key_down(KeyCode::V));
        set
    }
}

impl InputSource for InputState {
    fn poll(&mut self) -> ButtonSet {
        self.gamepad.poll();
        ButtonSet::from_bits(self.keyboard().bits() | self.gamepad.buttons().bits())
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}
