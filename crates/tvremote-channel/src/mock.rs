//! Mock command channel for testing.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;
use tvremote_types::RemoteCommand;

use crate::error::ChannelError;
use crate::wire::Ack;
use crate::{CommandChannel, PendingAck};

/// How the mock answers issued commands.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Acknowledge immediately.
    Ok,
    /// Fail immediately with a remote error.
    Fail(String),
    /// Acknowledge after a delay.
    Delay(Duration),
    /// Never answer.
    Never,
}

/// Recorded command for test observation.
#[derive(Debug, Clone)]
pub struct IssuedCommand {
    pub command: RemoteCommand,
    pub at: Instant,
}

#[derive(Debug)]
struct MockChannelState {
    issued: Vec<IssuedCommand>,
    reply: MockReply,
}

/// Mock channel that records every issued command.
pub struct MockChannel {
    state: Arc<Mutex<MockChannelState>>,
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChannel {
    /// Create a mock that acknowledges everything immediately.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockChannelState {
                issued: Vec::new(),
                reply: MockReply::Ok,
            })),
        }
    }

    /// Get a clonable handle for observing the channel from tests.
    pub fn handle(&self) -> MockChannelHandle {
        MockChannelHandle {
            state: Arc::clone(&self.state),
        }
    }
}

/// Clonable observer handle for `MockChannel`.
#[derive(Clone)]
pub struct MockChannelHandle {
    state: Arc<Mutex<MockChannelState>>,
}

impl MockChannelHandle {
    /// Snapshot of all issued commands with their issue instants.
    pub fn issued(&self) -> Vec<IssuedCommand> {
        self.state.lock().unwrap().issued.clone()
    }

    /// Snapshot of all issued commands.
    pub fn commands(&self) -> Vec<RemoteCommand> {
        self.issued().into_iter().map(|i| i.command).collect()
    }

    /// Change how subsequent commands are answered.
    pub fn set_reply(&self, reply: MockReply) {
        self.state.lock().unwrap().reply = reply;
    }
}

impl CommandChannel for MockChannel {
    fn issue(&self, command: RemoteCommand) -> PendingAck {
        let mut state = self.state.lock().unwrap();
        state.issued.push(IssuedCommand {
            command,
            at: Instant::now(),
        });
        let reply = state.reply.clone();

        Box::pin(async move {
            match reply {
                MockReply::Ok => Ok(Ack::Ok),
                MockReply::Fail(reason) => Err(ChannelError::Remote(reason)),
                MockReply::Delay(delay) => {
                    tokio::time::sleep(delay).await;
                    Ok(Ack::Ok)
                }
                MockReply::Never => std::future::pending().await,
            }
        })
    }
}
