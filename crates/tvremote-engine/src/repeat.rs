//! Held-key repeat dispatch.
//!
//! One slot is shared by every key control. A press issues a key-down
//! immediately and spawns a repeat task that, after each acknowledgment (or
//! after the ack timeout), waits one interval and issues the next key-down.
//! A release or a press of another key aborts the task and empties the slot.
//!
//! Every key-down is issued while the slot lock is held and only after the
//! repeat task has confirmed it still owns the slot, so no key-down can follow
//! the key-up that terminated its stream.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, trace, warn};
use tvremote_channel::{Ack, Emitter};
use tvremote_types::{KeyAction, KeyEvent, KeyId, RemoteCommand};

use crate::config::KeyConfig;

/// Reply to one key-down, observed in its own task so that aborting the
/// repeat chain never loses it.
type PendingReply = JoinHandle<Option<Ack>>;

/// Repeat cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatTiming {
    /// Delay between an acknowledgment and the next key-down.
    pub interval: Duration,
    /// Longest wait for an acknowledgment before repeating anyway.
    pub ack_timeout: Duration,
}

impl Default for RepeatTiming {
    fn default() -> Self {
        Self::from(&KeyConfig::default())
    }
}

impl From<&KeyConfig> for RepeatTiming {
    fn from(config: &KeyConfig) -> Self {
        Self {
            interval: Duration::from_millis(config.repeat_interval_ms),
            ack_timeout: Duration::from_millis(config.ack_timeout_ms),
        }
    }
}

struct HeldKey {
    key: KeyId,
    generation: u64,
    repeat: AbortHandle,
}

#[derive(Default)]
struct KeyHoldState {
    held: Option<HeldKey>,
    /// Bumped on every press; a repeat task only fires for its own generation.
    generation: u64,
}

impl KeyHoldState {
    fn is_current(&self, generation: u64) -> bool {
        self.held
            .as_ref()
            .is_some_and(|held| held.generation == generation)
    }
}

/// Turns key press/release intents into a repeating key-down stream.
#[derive(Clone)]
pub struct KeyRepeatDispatcher {
    emitter: Emitter,
    timing: RepeatTiming,
    slot: Arc<Mutex<KeyHoldState>>,
}

impl KeyRepeatDispatcher {
    pub fn new(emitter: Emitter, timing: RepeatTiming) -> Self {
        Self {
            emitter,
            timing,
            slot: Arc::new(Mutex::new(KeyHoldState::default())),
        }
    }

    /// Route a key event to [`press`](Self::press) or [`release`](Self::release).
    pub fn handle(&self, event: KeyEvent) {
        match event.action {
            KeyAction::Down => self.press(event.key),
            KeyAction::Up => self.release(event.key),
        }
    }

    /// Start holding `key`, superseding whatever key was held before.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn press(&self, key: KeyId) {
        let mut slot = self.lock();
        if let Some(previous) = slot.held.take() {
            previous.repeat.abort();
            debug!(previous = %previous.key, key = %key, "held key superseded");
        }

        slot.generation += 1;
        let generation = slot.generation;

        debug!(key = %key, generation, "key down");
        let reply = self.emitter.spawn_issue(RemoteCommand::KeyDown(key.clone()));
        let task = tokio::spawn(self.clone().repeat_loop(key.clone(), generation, reply));

        slot.held = Some(HeldKey {
            key,
            generation,
            repeat: task.abort_handle(),
        });
    }

    /// Stop holding and send exactly one key-up for `key`.
    ///
    /// A release with nothing held is a no-op.
    pub fn release(&self, key: KeyId) {
        let mut slot = self.lock();
        let Some(held) = slot.held.take() else {
            debug!(key = %key, "key up with no held key ignored");
            return;
        };

        held.repeat.abort();
        if held.key != key {
            debug!(held = %held.key, key = %key, "released key differs from held key");
        }
        debug!(key = %key, "key up");
        self.emitter.fire(RemoteCommand::KeyUp(key));
    }

    /// Issue a single key press without touching the hold slot.
    pub fn tap(&self, key: KeyId) {
        debug!(key = %key, "key tap");
        self.emitter.fire(RemoteCommand::KeyPress(key));
    }

    /// The key currently held, if any.
    pub fn held_key(&self) -> Option<KeyId> {
        self.lock().held.as_ref().map(|held| held.key.clone())
    }

    /// Release whatever key is held. Returns the released key.
    pub fn release_all(&self) -> Option<KeyId> {
        let key = self.held_key()?;
        self.release(key.clone());
        Some(key)
    }

    async fn repeat_loop(self, key: KeyId, generation: u64, mut reply: PendingReply) {
        loop {
            if tokio::time::timeout(self.timing.ack_timeout, &mut reply)
                .await
                .is_err()
            {
                warn!(
                    key = %key,
                    timeout = ?self.timing.ack_timeout,
                    "no ack for key down, repeating anyway"
                );
            }

            tokio::time::sleep(self.timing.interval).await;

            reply = {
                let slot = self.lock();
                if !slot.is_current(generation) {
                    trace!(key = %key, generation, "repeat stream ended");
                    return;
                }
                trace!(key = %key, generation, "key repeat");
                self.emitter.spawn_issue(RemoteCommand::KeyDown(key.clone()))
            };
        }
    }

    fn lock(&self) -> MutexGuard<'_, KeyHoldState> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use tvremote_channel::mock::{MockChannel, MockChannelHandle, MockReply};

    use super::*;

    fn dispatcher() -> (KeyRepeatDispatcher, MockChannelHandle) {
        let channel = MockChannel::new();
        let handle = channel.handle();
        let emitter = Emitter::new(Arc::new(channel));
        (KeyRepeatDispatcher::new(emitter, RepeatTiming::default()), handle)
    }

    fn key(id: &str) -> KeyId {
        KeyId::from(id)
    }

    fn key_downs(handle: &MockChannelHandle, id: &str) -> usize {
        handle
            .commands()
            .iter()
            .filter(|c| **c == RemoteCommand::KeyDown(key(id)))
            .count()
    }

    async fn advance(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn press_emits_key_down_immediately() {
        let (dispatcher, handle) = dispatcher();
        dispatcher.press(key("19"));
        assert_eq!(handle.commands(), vec![RemoteCommand::KeyDown(key("19"))]);
        assert_eq!(dispatcher.held_key(), Some(key("19")));
    }

    #[tokio::test(start_paused = true)]
    async fn held_key_repeats_no_sooner_than_interval() {
        let (dispatcher, handle) = dispatcher();
        dispatcher.press(key("19"));
        advance(350).await;

        let issued = handle.issued();
        assert_eq!(issued.len(), 4);
        for pair in issued.windows(2) {
            assert!(pair[1].at - pair[0].at >= Duration::from_millis(100));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn release_sends_one_key_up_and_stops() {
        let (dispatcher, handle) = dispatcher();
        dispatcher.press(key("19"));
        advance(150).await;
        dispatcher.release(key("19"));
        advance(1_000).await;

        let commands = handle.commands();
        assert_eq!(commands.last(), Some(&RemoteCommand::KeyUp(key("19"))));
        assert_eq!(
            commands
                .iter()
                .filter(|c| matches!(c, RemoteCommand::KeyUp(_)))
                .count(),
            1
        );
        assert_eq!(key_downs(&handle, "19"), 2);
        assert_eq!(dispatcher.held_key(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn new_key_supersedes_held_key() {
        let (dispatcher, handle) = dispatcher();
        dispatcher.press(key("A"));
        advance(10).await;
        dispatcher.press(key("B"));
        advance(500).await;

        assert_eq!(key_downs(&handle, "A"), 1);
        assert!(key_downs(&handle, "B") >= 5);
        assert!(!handle
            .commands()
            .contains(&RemoteCommand::KeyUp(key("A"))));
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_down_up_down_runs_single_chain() {
        let (dispatcher, handle) = dispatcher();
        handle.set_reply(MockReply::Delay(Duration::from_millis(50)));

        dispatcher.press(key("K"));
        dispatcher.release(key("K"));
        dispatcher.press(key("K"));
        advance(1_000).await;

        // Two initial key-downs, then one chain: ack after 50ms, repeat 100ms
        // later, so one repeat every 150ms.
        let downs = key_downs(&handle, "K");
        assert_eq!(downs, 2 + 6);

        let issued = handle.issued();
        let repeats: Vec<_> = issued.iter().skip(3).collect();
        for pair in repeats.windows(2) {
            assert!(pair[1].at - pair[0].at >= Duration::from_millis(150));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn failed_ack_does_not_stop_repeat() {
        let (dispatcher, handle) = dispatcher();
        handle.set_reply(MockReply::Fail("accessibility_not_enabled".to_string()));
        dispatcher.press(key("19"));
        advance(250).await;
        assert_eq!(key_downs(&handle, "19"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_ack_repeats_after_timeout() {
        let (dispatcher, handle) = dispatcher();
        handle.set_reply(MockReply::Never);
        dispatcher.press(key("19"));

        advance(1_050).await;
        assert_eq!(key_downs(&handle, "19"), 1);
        advance(100).await;
        assert_eq!(key_downs(&handle, "19"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn quick_press_release_records_both_failures() {
        let channel = MockChannel::new();
        let handle = channel.handle();
        handle.set_reply(MockReply::Fail("accessibility_not_enabled".to_string()));
        let emitter = Emitter::new(Arc::new(channel));
        let dispatcher = KeyRepeatDispatcher::new(emitter.clone(), RepeatTiming::default());

        dispatcher.press(key("19"));
        dispatcher.release(key("19"));
        advance(500).await;

        assert_eq!(
            handle.commands(),
            vec![
                RemoteCommand::KeyDown(key("19")),
                RemoteCommand::KeyUp(key("19")),
            ]
        );
        assert_eq!(emitter.issued(), 2);
        assert_eq!(emitter.status().failures, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn release_without_hold_is_noop() {
        let (dispatcher, handle) = dispatcher();
        dispatcher.release(key("19"));
        advance(10).await;
        assert!(handle.commands().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn release_of_other_key_ends_held_stream() {
        let (dispatcher, handle) = dispatcher();
        dispatcher.press(key("A"));
        dispatcher.release(key("B"));
        advance(500).await;
        assert_eq!(
            handle.commands(),
            vec![
                RemoteCommand::KeyDown(key("A")),
                RemoteCommand::KeyUp(key("B")),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn tap_does_not_touch_hold_slot() {
        let (dispatcher, handle) = dispatcher();
        dispatcher.press(key("A"));
        dispatcher.tap(key("ok"));
        advance(5).await;
        assert_eq!(dispatcher.held_key(), Some(key("A")));
        assert!(handle.commands().contains(&RemoteCommand::KeyPress(key("ok"))));
    }

    #[tokio::test(start_paused = true)]
    async fn release_all_reports_released_key() {
        let (dispatcher, handle) = dispatcher();
        assert_eq!(dispatcher.release_all(), None);
        dispatcher.press(key("A"));
        assert_eq!(dispatcher.release_all(), Some(key("A")));
        advance(5).await;
        assert_eq!(handle.commands().last(), Some(&RemoteCommand::KeyUp(key("A"))));
    }
}
