//! Remote command types.
//!
//! The small set of semantic commands the remote device understands.

use serde::{Deserialize, Serialize};

use crate::key::KeyId;

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    /// Numeric button code used by the remote (0 left, 1 right, 2 middle).
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Left => 0,
            Self::Right => 1,
            Self::Middle => 2,
        }
    }
}

/// A command delivered to the remote device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteCommand {
    /// Key pressed (repeated while held).
    KeyDown(KeyId),

    /// Key released; terminates a repeat stream.
    KeyUp(KeyId),

    /// Single press-and-release of a key.
    KeyPress(KeyId),

    /// Relative pointer motion.
    Move { dx: i32, dy: i32 },

    /// Button click.
    Click(MouseButton),

    /// Vertical scroll.
    Scroll { dy: i32 },
}

impl std::fmt::Display for RemoteCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::KeyDown(key) => write!(f, "key-down({key})"),
            Self::KeyUp(key) => write!(f, "key-up({key})"),
            Self::KeyPress(key) => write!(f, "key-press({key})"),
            Self::Move { dx, dy } => write!(f, "mouse-move({dx},{dy})"),
            Self::Click(button) => write!(f, "mouse-click({})", button.code()),
            Self::Scroll { dy } => write!(f, "mouse-scroll({dy})"),
        }
    }
}
