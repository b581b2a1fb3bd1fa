//! Touchpad gesture state machine.

use tvremote_types::{Point, PointerSample};

/// State of the touchpad surface.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GestureState {
    /// No contact in progress.
    #[default]
    Idle,
    /// One contact lifecycle is being tracked.
    Tracking(GestureSession),
}

impl GestureState {
    pub fn is_tracking(&self) -> bool {
        matches!(self, Self::Tracking(_))
    }

    pub fn session(&self) -> Option<&GestureSession> {
        match self {
            Self::Tracking(session) => Some(session),
            Self::Idle => None,
        }
    }
}

impl std::fmt::Display for GestureState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Tracking(_) => write!(f, "Tracking"),
        }
    }
}

/// Per-lifecycle tracking data, from first contact to release.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureSession {
    /// Position at first contact.
    pub origin: Point,
    /// Position at the most recent accepted sample.
    pub last: Point,
    pub start_ms: u64,
    /// Timestamp of the most recent accepted sample (throttle reference).
    pub last_sample_ms: u64,
    /// Highest simultaneous contact count seen.
    pub max_contact_count: u32,
    pub moved_beyond_threshold: bool,
}

impl GestureSession {
    /// Start a session at the given sample.
    pub fn begin(sample: &PointerSample) -> Self {
        Self {
            origin: sample.position,
            last: sample.position,
            start_ms: sample.timestamp_ms,
            last_sample_ms: sample.timestamp_ms,
            max_contact_count: sample.contact_count,
            moved_beyond_threshold: false,
        }
    }

    /// Two or more fingers were down at some point.
    pub fn is_multi_contact(&self) -> bool {
        self.max_contact_count >= 2
    }
}
