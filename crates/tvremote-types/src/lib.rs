//! Shared types for tvremote.
//!
//! This crate contains the value types shared across the tvremote workspace:
//! key intents coming from key controls, contact samples coming from the
//! touchpad surface, and the semantic commands sent to the remote device.

pub mod command;
pub mod contact;
pub mod key;

pub use command::{MouseButton, RemoteCommand};
pub use contact::{ContactEvent, ContactPhase, InvalidSample, Point, PointerSample};
pub use key::{KeyAction, KeyEvent, KeyId};
