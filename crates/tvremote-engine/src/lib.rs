//! Input translation engine for tvremote.
//!
//! Turns held key controls into repeating key-down streams, classifies
//! touchpad contact lifecycles into move/scroll/click commands, and runs the
//! single event loop that feeds both and emits through the command channel.

pub mod config;
pub mod engine;
pub mod error;
pub mod gesture;
pub mod repeat;
pub mod sensitivity;
pub mod setup;
pub mod state;

pub use config::Config;
pub use engine::{Engine, EngineEvent, EngineStatus};
pub use error::EngineError;
pub use gesture::{GestureRecognizer, GestureTuning};
pub use repeat::{KeyRepeatDispatcher, RepeatTiming};
pub use sensitivity::{Sensitivity, SensitivityControl};
