//! Held-control state
//!
//! The simulation only cares which logical controls are currently down;
//! key repeat and text input never reach it.

use serde::{Deserialize, Serialize};

/// Logical controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Control {
    Up,
    Left,
    Right,
    /// Leave the game screen
    Menu,
}

impl Control {
    fn bit(self) -> u8 {
        match self {
            Control::Up => 1,
            Control::Left => 2,
            Control::Right => 4,
            Control::Menu => 8,
        }
    }
}

/// Set of currently held controls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlSet(u8);

impl ControlSet {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn press(&mut self, control: Control) {
        self.0 |= control.bit();
    }

    pub fn release(&mut self, control: Control) {
        self.0 &= !control.bit();
    }

    pub fn release_all(&mut self) {
        self.0 = 0;
    }

    #[inline]
    pub fn held(&self, control: Control) -> bool {
        self.0 & control.bit() != 0
    }

    pub fn up(&self) -> bool {
        self.held(Control::Up)
    }

    pub fn left(&self) -> bool {
        self.held(Control::Left)
    }

    pub fn right(&self) -> bool {
        self.held(Control::Right)
    }

    /// Horizontal input: -1, 0 or 1
    pub fn horizontal(&self) -> f32 {
        crate::axis(self.left(), self.right())
    }

    /// Exactly one of left/right is held
    pub fn single_direction(&self) -> bool {
        self.left() ^ self.right()
    }

    /// Any flight control (up, left or right) is held
    pub fn any_movement(&self) -> bool {
        self.up() || self.left() || self.right()
    }
}

impl FromIterator<Control> for ControlSet {
    fn from_iter<I: IntoIterator<Item = Control>>(iter: I) -> Self {
        let mut set = ControlSet::new();
        for control in iter {
            set.press(control);
        }
        set
    }
}
