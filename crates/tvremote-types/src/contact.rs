//! Contact (touch/press) samples from the touchpad surface.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A position on the touchpad surface, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another point.
    #[must_use]
    pub fn manhattan(self, other: Self) -> f64 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

/// Lifecycle phase of a contact event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactPhase {
    /// First touch or button press.
    Start,
    /// Pointer moved while in contact.
    Move,
    /// All contacts released (or cancelled).
    End,
}

/// Raw contact event as reported by the input layer.
///
/// Unvalidated: coordinates may be non-finite and the contact count may be
/// negative. Use [`PointerSample::from_event`] to validate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactEvent {
    pub phase: ContactPhase,
    pub x: f64,
    pub y: f64,
    /// Number of simultaneous contacts on the surface.
    pub contact_count: i32,
    /// Millisecond timestamp (monotonic).
    pub timestamp_ms: u64,
}

impl ContactEvent {
    #[must_use]
    pub fn start(x: f64, y: f64, contact_count: i32, timestamp_ms: u64) -> Self {
        Self {
            phase: ContactPhase::Start,
            x,
            y,
            contact_count,
            timestamp_ms,
        }
    }

    #[must_use]
    pub fn moved(x: f64, y: f64, contact_count: i32, timestamp_ms: u64) -> Self {
        Self {
            phase: ContactPhase::Move,
            x,
            y,
            contact_count,
            timestamp_ms,
        }
    }

    #[must_use]
    pub fn end(x: f64, y: f64, timestamp_ms: u64) -> Self {
        Self {
            phase: ContactPhase::End,
            x,
            y,
            contact_count: 0,
            timestamp_ms,
        }
    }
}

/// Rejection reason for a raw contact event.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum InvalidSample {
    #[error("non-finite coordinates ({x}, {y})")]
    NonFinite { x: f64, y: f64 },

    #[error("negative contact count {0}")]
    NegativeContactCount(i32),
}

/// A validated pointer sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerSample {
    pub position: Point,
    pub timestamp_ms: u64,
    pub contact_count: u32,
}

impl PointerSample {
    /// Validate a raw contact event.
    pub fn from_event(event: &ContactEvent) -> Result<Self, InvalidSample> {
        if !event.x.is_finite() || !event.y.is_finite() {
            return Err(InvalidSample::NonFinite {
                x: event.x,
                y: event.y,
            });
        }
        let contact_count = u32::try_from(event.contact_count)
            .map_err(|_| InvalidSample::NegativeContactCount(event.contact_count))?;
        Ok(Self {
            position: Point::new(event.x, event.y),
            timestamp_ms: event.timestamp_ms,
            contact_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manhattan_distance() {
        let a = Point::new(100.0, 100.0);
        let b = Point::new(104.0, 98.0);
        assert!((a.manhattan(b) - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn valid_event_becomes_sample() {
        let sample = PointerSample::from_event(&ContactEvent::moved(3.5, 4.0, 2, 20)).unwrap();
        assert_eq!(sample.position, Point::new(3.5, 4.0));
        assert_eq!(sample.contact_count, 2);
        assert_eq!(sample.timestamp_ms, 20);
    }

    #[test]
    fn non_finite_coordinates_rejected() {
        let err = PointerSample::from_event(&ContactEvent::moved(f64::NAN, 1.0, 1, 0)).unwrap_err();
        assert!(matches!(err, InvalidSample::NonFinite { .. }));

        let err =
            PointerSample::from_event(&ContactEvent::start(1.0, f64::INFINITY, 1, 0)).unwrap_err();
        assert!(matches!(err, InvalidSample::NonFinite { .. }));
    }

    #[test]
    fn negative_contact_count_rejected() {
        let err = PointerSample::from_event(&ContactEvent::moved(1.0, 1.0, -1, 0)).unwrap_err();
        assert_eq!(err, InvalidSample::NegativeContactCount(-1));
    }

    #[test]
    fn phase_parses_lowercase() {
        let phase: ContactPhase = serde_json::from_str("\"start\"").unwrap();
        assert_eq!(phase, ContactPhase::Start);
    }
}
