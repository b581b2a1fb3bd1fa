//! Core engine orchestration.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use tvremote_channel::{CommandChannel, Connectivity, Emitter, LinkStatus};
use tvremote_types::{ContactEvent, KeyEvent, KeyId, MouseButton, RemoteCommand};

use crate::config::Config;
use crate::error::EngineError;
use crate::gesture::{GestureRecognizer, GestureTuning};
use crate::repeat::{KeyRepeatDispatcher, RepeatTiming};
use crate::sensitivity::SensitivityControl;

/// Events processed by the engine's main loop.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// A raw touchpad contact sample.
    Contact(ContactEvent),
    /// A held key control changed state.
    Key(KeyEvent),
    /// A single-shot key control was activated.
    KeyTap(KeyId),
    /// An explicit on-screen mouse button was pressed.
    MouseButton(MouseButton),
    /// The pointer sensitivity control moved.
    SetSensitivity(f64),
    /// Shutdown signal.
    Shutdown,
}

/// Observable engine state, published after every processed event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineStatus {
    pub connectivity: Connectivity,
    /// Remote cursor position from the most recent move reply.
    pub cursor: Option<(i32, i32)>,
    /// A touchpad contact lifecycle is in progress.
    pub tracking: bool,
    pub held_key: Option<KeyId>,
    pub sensitivity: f64,
    pub commands_issued: u64,
    pub delivery_failures: u64,
}

/// Single-task event loop driving the recognizer and the key dispatcher.
pub struct Engine {
    config: Config,
    emitter: Emitter,
    recognizer: GestureRecognizer,
    dispatcher: KeyRepeatDispatcher,
    sensitivity: SensitivityControl,
    event_tx: mpsc::Sender<EngineEvent>,
    event_rx: mpsc::Receiver<EngineEvent>,
    status_tx: watch::Sender<EngineStatus>,
}

impl Engine {
    /// Create an engine emitting through `channel`.
    pub fn new(config: Config, channel: Arc<dyn CommandChannel>) -> Result<Self, EngineError> {
        config.validate()?;

        let sensitivity = SensitivityControl::new(config.touchpad.sensitivity)?;
        let emitter = Emitter::new(channel);
        let recognizer =
            GestureRecognizer::new(GestureTuning::from(&config.touchpad), sensitivity.subscribe());
        let dispatcher = KeyRepeatDispatcher::new(emitter.clone(), RepeatTiming::from(&config.keys));
        let (event_tx, event_rx) = mpsc::channel(1024);
        let (status_tx, _) = watch::channel(EngineStatus {
            sensitivity: config.touchpad.sensitivity,
            ..EngineStatus::default()
        });

        Ok(Self {
            config,
            emitter,
            recognizer,
            dispatcher,
            sensitivity,
            event_tx,
            event_rx,
            status_tx,
        })
    }

    /// Get a clone of the event sender for feeding events into the engine.
    pub fn event_sender(&self) -> mpsc::Sender<EngineEvent> {
        self.event_tx.clone()
    }

    /// Subscribe to status updates.
    pub fn status_receiver(&self) -> watch::Receiver<EngineStatus> {
        self.status_tx.subscribe()
    }

    /// Run the engine event loop until shutdown.
    pub async fn run(&mut self) -> Result<(), EngineError> {
        let mut link_rx = self.emitter.status_receiver();
        let mut heartbeat = self.heartbeat_interval();

        info!(
            sensitivity = self.sensitivity.get(),
            heartbeat_interval_ms = self.config.engine.heartbeat_interval_ms,
            "engine running"
        );

        loop {
            tokio::select! {
                event = self.event_rx.recv() => {
                    match event {
                        Some(EngineEvent::Shutdown) | None => {
                            info!("shutting down");
                            break;
                        }
                        Some(event) => self.handle_event(event),
                    }
                }
                () = next_heartbeat(&mut heartbeat) => {
                    debug!("connectivity heartbeat");
                    self.emitter.fire(RemoteCommand::Move { dx: 0, dy: 0 });
                }
                changed = link_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let link = link_rx.borrow_and_update().clone();
                    self.log_link_change(&link);
                }
            }
            self.publish_status();
        }

        self.shutdown();
        Ok(())
    }

    fn handle_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Contact(contact) => {
                if let Some(command) = self.recognizer.handle(&contact) {
                    self.emitter.fire(command);
                }
            }
            EngineEvent::Key(key_event) => self.dispatcher.handle(key_event),
            EngineEvent::KeyTap(key) => self.dispatcher.tap(key),
            EngineEvent::MouseButton(button) => {
                debug!(?button, "mouse button");
                self.emitter.fire(RemoteCommand::Click(button));
            }
            EngineEvent::SetSensitivity(multiplier) => {
                match self.sensitivity.set(multiplier) {
                    Ok(()) => info!(multiplier, "sensitivity changed"),
                    Err(e) => warn!(error = %e, "sensitivity change rejected"),
                }
            }
            EngineEvent::Shutdown => {}
        }
    }

    fn log_link_change(&self, link: &LinkStatus) {
        let previous = self.status_tx.borrow().connectivity;
        if previous == link.connectivity {
            return;
        }
        match link.connectivity {
            Connectivity::Connected => info!("remote connected"),
            Connectivity::Disconnected => {
                warn!(failures = link.failures, "remote unreachable");
            }
            Connectivity::Unknown => {}
        }
    }

    fn heartbeat_interval(&self) -> Option<Interval> {
        let period_ms = self.config.engine.heartbeat_interval_ms;
        if period_ms == 0 {
            return None;
        }
        let mut interval = tokio::time::interval(Duration::from_millis(period_ms));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Some(interval)
    }

    fn publish_status(&self) {
        let link = self.emitter.status();
        let status = EngineStatus {
            connectivity: link.connectivity,
            cursor: link.cursor,
            tracking: self.recognizer.is_tracking(),
            held_key: self.dispatcher.held_key(),
            sensitivity: self.sensitivity.get(),
            commands_issued: self.emitter.issued(),
            delivery_failures: link.failures,
        };
        self.status_tx.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
    }

    fn shutdown(&self) {
        if let Some(key) = self.dispatcher.release_all() {
            info!(key = %key, "released held key on shutdown");
        }
        self.publish_status();
        info!(commands = self.emitter.issued(), "engine stopped");
    }
}

async fn next_heartbeat(heartbeat: &mut Option<Interval>) {
    match heartbeat {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use tvremote_channel::mock::MockChannel;

    use super::*;

    fn quiet_config() -> Config {
        let mut config = Config::default();
        config.engine.heartbeat_interval_ms = 0;
        config
    }

    #[test]
    fn invalid_config_rejected() {
        let mut config = quiet_config();
        config.touchpad.sensitivity = -1.0;
        let result = Engine::new(config, Arc::new(MockChannel::new()));
        assert!(matches!(result, Err(EngineError::InvalidSensitivity(_))));
    }

    #[test]
    fn initial_status_carries_configured_sensitivity() {
        let engine = Engine::new(quiet_config(), Arc::new(MockChannel::new())).unwrap();
        let status = engine.status_receiver().borrow().clone();
        assert!((status.sensitivity - 1.5).abs() < f64::EPSILON);
        assert_eq!(status.connectivity, Connectivity::Unknown);
        assert!(!status.tracking);
    }

    #[tokio::test(start_paused = true)]
    async fn mouse_button_issues_click() {
        let channel = MockChannel::new();
        let handle = channel.handle();
        let mut engine = Engine::new(quiet_config(), Arc::new(channel)).unwrap();
        engine.handle_event(EngineEvent::MouseButton(MouseButton::Middle));
        assert_eq!(handle.commands(), vec![RemoteCommand::Click(MouseButton::Middle)]);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_sensitivity_keeps_previous_value() {
        let mut engine = Engine::new(quiet_config(), Arc::new(MockChannel::new())).unwrap();
        engine.handle_event(EngineEvent::SetSensitivity(0.0));
        assert!((engine.sensitivity.get() - 1.5).abs() < f64::EPSILON);
        engine.handle_event(EngineEvent::SetSensitivity(3.0));
        assert!((engine.sensitivity.get() - 3.0).abs() < f64::EPSILON);
    }
}
