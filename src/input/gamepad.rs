//! Gamepad support
//!
//! Native: uses gilrs for cross-platform gamepad input
//! WASM: no gamepad backend, keyboard only

use super::{Button, ButtonSet};

/// Stick deflection that counts as a direction press
const STICK_THRESHOLD: f32 = 0.5;

// ============================================================================
// Native Implementation (gilrs)
// ============================================================================

#[cfg(not(target_arch = "wasm32"))]
mod platform {
    use super::*;
    use gilrs::{Axis, Button as GilrsButton, Gilrs};

    pub struct Gamepad {
        gilrs: Option<Gilrs>,
    }

    impl Gamepad {
        pub fn new() -> Self {
            let gilrs = match Gilrs::new() {
                Ok(g) => Some(g),
                Err(e) => {
                    tracing::warn!("gamepad backend unavailable: {}", e);
                    None
                }
            };
            Self { gilrs }
        }

        pub fn poll(&mut self) {
            if let Some(gilrs) = self.gilrs.as_mut() {
                // Drain events so gilrs updates its cached state
                while gilrs.next_event().is_some() {}
            }
        }

        pub fn has_gamepad(&self) -> bool {
            self.gilrs.as_ref().is_some_and(|g| g.gamepads().next().is_some())
        }

        /// Buttons held on the first connected gamepad.
        pub fn buttons(&self) -> ButtonSet {
            let mut set = ButtonSet::NONE;
            let Some(gilrs) = self.gilrs.as_ref() else { return set };
            let Some((_, gp)) = gilrs.gamepads().next() else { return set };

            let x = gp.value(Axis::LeftStickX);
            let y = gp.value(Axis::LeftStickY);
            set.set(Button::Left, gp.is_pressed(GilrsButton::DPadLeft) || x < -STICK_THRESHOLD);
            set.set(Button::Right, gp.is_pressed(GilrsButton::DPadRight) || x > STICK_THRESHOLD);
            set.set(Button::Up, gp.is_pressed(GilrsButton::DPadUp) || y > STICK_THRESHOLD);
            set.set(Button::Down, gp.is_pressed(GilrsButton::DPadDown) || y < -STICK_THRESHOLD);
            set.set(Button::Jump, gp.is_pressed(GilrsButton::South));
            set.set(
                Button::Dash,
                gp.is_pressed(GilrsButton::East) || gp.is_pressed(GilrsButton::West),
            );
            set
        }
    }

    impl Default for Gamepad {
        fn default() -> Self {
            Self::new()
        }
    }
}

// ============================================================================
// WASM Implementation
// ============================================================================

#[cfg(target_arch = "wasm32")]
mod platform {
    use super::*;

    #[derive(Default)]
    pub struct Gamepad;

    impl Gamepad {
        pub fn new() -> Self {
            Self
        }

        pub fn poll(&mut self) {}

        pub fn has_gamepad(&self) -> bool {
            false
        }

        pub fn buttons(&self) -> ButtonSet {
            ButtonSet::NONE
        }
    }
}

// Re-export the platform-specific implementation
pub use platform::Gamepad;
