//! Touchpad gesture recognition.
//!
//! Classifies each contact lifecycle as one of: tap (left click), two-finger
//! tap (right click), drag (relative moves) or two-finger drag (vertical
//! scroll).
//!
//! - A move sample arriving sooner than the throttle interval after the last
//!   accepted sample is dropped entirely; it does not advance `last`.
//! - Drag detection measures Manhattan distance from the origin, so jitter
//!   that cancels out does not turn a tap into a drag.
//! - Once a second finger has been seen, the whole session scrolls, and a
//!   qualifying tap is a right click.

use std::time::Duration;

use tracing::{debug, trace};
use tvremote_types::{ContactEvent, ContactPhase, MouseButton, PointerSample, RemoteCommand};

use crate::config::TouchpadConfig;
use crate::sensitivity::Sensitivity;
use crate::state::{GestureSession, GestureState};

/// Thresholds for classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureTuning {
    pub throttle: Duration,
    pub move_threshold: f64,
    pub tap_max: Duration,
    pub min_delta: f64,
}

impl Default for GestureTuning {
    fn default() -> Self {
        Self::from(&TouchpadConfig::default())
    }
}

impl From<&TouchpadConfig> for GestureTuning {
    fn from(config: &TouchpadConfig) -> Self {
        Self {
            throttle: Duration::from_millis(config.throttle_ms),
            move_threshold: config.move_threshold,
            tap_max: Duration::from_millis(config.tap_max_ms),
            min_delta: config.min_delta,
        }
    }
}

/// Stateful recognizer for one input surface.
pub struct GestureRecognizer {
    tuning: GestureTuning,
    sensitivity: Sensitivity,
    state: GestureState,
}

impl GestureRecognizer {
    pub fn new(tuning: GestureTuning, sensitivity: Sensitivity) -> Self {
        Self {
            tuning,
            sensitivity,
            state: GestureState::Idle,
        }
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    pub fn is_tracking(&self) -> bool {
        self.state.is_tracking()
    }

    /// Feed one raw contact event; returns the command to emit, if any.
    pub fn handle(&mut self, event: &ContactEvent) -> Option<RemoteCommand> {
        let sample = match PointerSample::from_event(event) {
            Ok(sample) => sample,
            Err(e) => {
                debug!(error = %e, phase = ?event.phase, "dropping invalid sample");
                return None;
            }
        };

        match event.phase {
            ContactPhase::Start => {
                self.contact_start(&sample);
                None
            }
            ContactPhase::Move => self.contact_move(&sample),
            ContactPhase::End => self.contact_end(&sample),
        }
    }

    fn contact_start(&mut self, sample: &PointerSample) {
        if self.state.is_tracking() {
            debug!("contact start while tracking, restarting session");
        }
        trace!(
            x = sample.position.x,
            y = sample.position.y,
            contacts = sample.contact_count,
            "contact start"
        );
        self.state = GestureState::Tracking(GestureSession::begin(sample));
    }

    fn contact_move(&mut self, sample: &PointerSample) -> Option<RemoteCommand> {
        let GestureState::Tracking(session) = &mut self.state else {
            return None;
        };

        let elapsed = sample.timestamp_ms.saturating_sub(session.last_sample_ms);
        if u128::from(elapsed) < self.tuning.throttle.as_millis() {
            trace!(elapsed, "move sample throttled");
            return None;
        }

        let multiplier = self.sensitivity.multiplier();
        let dx = (sample.position.x - session.last.x) * multiplier;
        let dy = (sample.position.y - session.last.y) * multiplier;

        if sample.position.manhattan(session.origin) > self.tuning.move_threshold {
            session.moved_beyond_threshold = true;
        }
        session.max_contact_count = session.max_contact_count.max(sample.contact_count);

        let command = if dx.abs() > self.tuning.min_delta || dy.abs() > self.tuning.min_delta {
            if session.is_multi_contact() {
                let dy = round_half_up(dy);
                (dy != 0).then_some(RemoteCommand::Scroll { dy })
            } else {
                let (dx, dy) = (round_half_up(dx), round_half_up(dy));
                (dx != 0 || dy != 0).then_some(RemoteCommand::Move { dx, dy })
            }
        } else {
            None
        };

        session.last = sample.position;
        session.last_sample_ms = sample.timestamp_ms;
        command
    }

    fn contact_end(&mut self, sample: &PointerSample) -> Option<RemoteCommand> {
        let GestureState::Tracking(session) = std::mem::take(&mut self.state) else {
            trace!("contact end while idle ignored");
            return None;
        };

        let duration = sample.timestamp_ms.saturating_sub(session.start_ms);
        let is_tap = u128::from(duration) < self.tuning.tap_max.as_millis()
            && !session.moved_beyond_threshold;
        debug!(
            duration_ms = duration,
            moved = session.moved_beyond_threshold,
            contacts = session.max_contact_count,
            is_tap,
            "contact end"
        );

        is_tap.then(|| {
            let button = if session.is_multi_contact() {
                MouseButton::Right
            } else {
                MouseButton::Left
            };
            RemoteCommand::Click(button)
        })
    }
}

/// Round to the nearest integer, ties toward positive infinity.
#[allow(clippy::cast_possible_truncation)]
fn round_half_up(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}
