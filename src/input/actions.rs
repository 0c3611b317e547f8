//! Console button definitions
//!
//! Six buttons, queried by fixed index the way the console's `btn(i)` does.

/// A console button.
///
/// Keyboard mapping:
/// - Arrows = Left / Right / Up / Down
/// - Z or C = Jump
/// - X or V = Dash
///
/// Gamepad mapping: D-pad or left stick for directions, A = Jump, B/X = Dash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Left,
    Right,
    Up,
    Down,
    Jump,
    Dash,
}

impl Button {
    pub const ALL: [Button; 6] = [
        Button::Left,
        Button::Right,
        Button::Up,
        Button::Down,
        Button::Jump,
        Button::Dash,
    ];

    /// Button index (0-5)
    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(i: u8) -> Option<Button> {
        Self::ALL.get(i as usize).copied()
    }
}

/// Snapshot of held buttons, one bit per button index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonSet(u8);

impl ButtonSet {
    pub const NONE: ButtonSet = ButtonSet(0);

    pub fn from_bits(bits: u8) -> Self {
        ButtonSet(bits & 0b11_1111)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn with(self, button: Button) -> Self {
        ButtonSet(self.0 | 1 << button.index())
    }

    pub fn set(&mut self, button: Button, down: bool) {
        if down {
            self.0 |= 1 << button.index();
        } else {
            self.0 &= !(1 << button.index());
        }
    }

    /// `btn(i)`
    pub fn is_down(self, button: Button) -> bool {
        self.0 & (1 << button.index()) != 0
    }

    /// -1 for left, 1 for right, 0 for neither. Right wins when both are held.
    pub fn horizontal(self) -> i32 {
        if self.is_down(Button::Right) {
            1
        } else if self.is_down(Button::Left) {
            -1
        } else {
            0
        }
    }

    /// -1 for up, 1 for down, 0 for neither. Up wins when both are held.
    pub fn vertical(self) -> i32 {
        if self.is_down(Button::Up) {
            -1
        } else if self.is_down(Button::Down) {
            1
        } else {
            0
        }
    }
}

/// Anything that can report the held buttons for the next frame.
pub trait InputSource {
    fn poll(&mut self) -> ButtonSet;
}

/// Replays a fixed list of frames, then holds nothing.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    frames: Vec<ButtonSet>,
    cursor: usize,
}

impl ScriptedInput {
    pub fn new(frames: Vec<ButtonSet>) -> Self {
        Self { frames, cursor: 0 }
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self) -> ButtonSet {
        let set = self.frames.get(self.cursor).copied().unwrap_or_default();
        self.cursor += 1;
        set
    }
}
