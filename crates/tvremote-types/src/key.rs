//! Key intent types.
//!
//! Key controls report a logical key identifier (the remote's key code, e.g.
//! `"19"` for D-pad up) together with a press action.

use serde::{Deserialize, Serialize};

/// Logical key identifier understood by the remote device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyId(String);

impl KeyId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for KeyId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl std::fmt::Display for KeyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Press action reported by a key control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyAction {
    Down,
    Up,
}

/// A key control event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: KeyId,
    pub action: KeyAction,
}

impl KeyEvent {
    #[must_use]
    pub fn down(key: impl Into<KeyId>) -> Self {
        Self {
            key: key.into(),
            action: KeyAction::Down,
        }
    }

    #[must_use]
    pub fn up(key: impl Into<KeyId>) -> Self {
        Self {
            key: key.into(),
            action: KeyAction::Up,
        }
    }
}
