//! Replay scripts: timed input events fed through the engine into a loopback
//! remote.
//!
//! ```toml
//! [[event]]
//! at_ms = 0
//! contact = { phase = "start", x = 100.0, y = 100.0 }
//!
//! [[event]]
//! at_ms = 400
//! key = { key = "19", action = "down" }
//! ```
//!
//! Each `[[event]]` sets exactly one of `contact`, `key`, `tap`, `button` or
//! `sensitivity`. Contact timestamps are taken from `at_ms`.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use serde::Deserialize;
use tokio::time::Instant;
use tracing::debug;
use tvremote_channel::{LoopbackTransport, RemoteChannel, WireRequest};
use tvremote_engine::config::Config;
use tvremote_engine::{Engine, EngineEvent, EngineStatus};
use tvremote_types::{ContactEvent, ContactPhase, KeyEvent, KeyId, MouseButton};

#[derive(Debug, Deserialize)]
struct ScriptFile {
    #[serde(default, rename = "event")]
    events: Vec<ScriptEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScriptEntry {
    #[serde(default)]
    at_ms: u64,
    contact: Option<ContactStep>,
    key: Option<KeyEvent>,
    tap: Option<KeyId>,
    button: Option<MouseButton>,
    sensitivity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ContactStep {
    phase: ContactPhase,
    x: f64,
    y: f64,
    #[serde(default = "default_contacts")]
    contacts: i32,
}

fn default_contacts() -> i32 {
    1
}

impl ScriptEntry {
    fn into_event(self, index: usize) -> anyhow::Result<EngineEvent> {
        let at_ms = self.at_ms;
        let mut events = Vec::new();
        if let Some(step) = self.contact {
            let contact = ContactEvent {
                phase: step.phase,
                x: step.x,
                y: step.y,
                contact_count: step.contacts,
                timestamp_ms: at_ms,
            };
            events.push(EngineEvent::Contact(contact));
        }
        if let Some(key) = self.key {
            events.push(EngineEvent::Key(key));
        }
        if let Some(key) = self.tap {
            events.push(EngineEvent::KeyTap(key));
        }
        if let Some(button) = self.button {
            events.push(EngineEvent::MouseButton(button));
        }
        if let Some(multiplier) = self.sensitivity {
            events.push(EngineEvent::SetSensitivity(multiplier));
        }

        match events.len() {
            1 => Ok(events.remove(0)),
            0 => bail!("event {index} (at {at_ms}ms) has no action"),
            n => bail!("event {index} (at {at_ms}ms) has {n} actions, expected one"),
        }
    }
}

/// One scheduled event.
#[derive(Debug, Clone)]
pub struct TimedEvent {
    pub at: Duration,
    pub event: EngineEvent,
}

/// A parsed script, ordered by time.
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub events: Vec<TimedEvent>,
}

impl Script {
    /// Parse a script from TOML text.
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let file: ScriptFile = toml::from_str(text).context("failed to parse script")?;
        let mut events = file
            .events
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                let at = Duration::from_millis(entry.at_ms);
                entry.into_event(index).map(|event| TimedEvent { at, event })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        events.sort_by_key(|e| e.at);
        Ok(Self { events })
    }

    /// Read and parse a script file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?;
        Self::parse(&text)
    }

    /// Time of the last event.
    pub fn duration(&self) -> Duration {
        self.events.last().map_or(Duration::ZERO, |e| e.at)
    }
}

/// What the loopback remote saw during a replay.
#[derive(Debug, Clone)]
pub struct ReplayReport {
    pub requests: Vec<WireRequest>,
    pub cursor: (i32, i32),
    pub status: EngineStatus,
}

/// Loopback surface and timing for a replay.
#[derive(Debug, Clone, Copy)]
pub struct ReplayOptions {
    pub width: u32,
    pub height: u32,
    /// Time to keep running after the last event.
    pub linger: Duration,
}

/// Run `script` through a fresh engine wired to a loopback remote.
pub async fn replay(
    config: Config,
    script: &Script,
    options: ReplayOptions,
) -> anyhow::Result<ReplayReport> {
    let channel = Arc::new(RemoteChannel::new(LoopbackTransport::new(
        options.width,
        options.height,
    )));
    let transport = channel.transport();

    let mut engine = Engine::new(config, channel)?;
    let events = engine.event_sender();
    let status = engine.status_receiver();
    let task = tokio::spawn(async move { engine.run().await });

    let start = Instant::now();
    for timed in &script.events {
        tokio::time::sleep_until(start + timed.at).await;
        debug!(at_ms = timed.at.as_millis(), event = ?timed.event, "replaying event");
        events
            .send(timed.event.clone())
            .await
            .context("engine stopped before the script finished")?;
    }

    tokio::time::sleep(options.linger).await;
    // A send error means the engine already stopped; the join below reports why.
    let _ = events.send(EngineEvent::Shutdown).await;
    task.await.context("engine task failed")??;

    // Let deliveries spawned during shutdown reach the transport.
    tokio::task::yield_now().await;

    let status = status.borrow().clone();
    Ok(ReplayReport {
        requests: transport.requests(),
        cursor: transport.cursor(),
        status,
    })
}
