//! Fire-and-forget command emission.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};
use tvremote_types::RemoteCommand;

use crate::status::LinkStatus;
use crate::wire::Ack;
use crate::CommandChannel;

/// Shared front end to a [`CommandChannel`].
///
/// Emission never blocks and never fails from the caller's point of view:
/// delivery failures are logged and folded into the [`LinkStatus`].
#[derive(Clone)]
pub struct Emitter {
    channel: Arc<dyn CommandChannel>,
    status: Arc<watch::Sender<LinkStatus>>,
    issued: Arc<AtomicU64>,
}

impl Emitter {
    pub fn new(channel: Arc<dyn CommandChannel>) -> Self {
        let (status, _) = watch::channel(LinkStatus::default());
        Self {
            channel,
            status: Arc::new(status),
            issued: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Subscribe to link status updates.
    pub fn status_receiver(&self) -> watch::Receiver<LinkStatus> {
        self.status.subscribe()
    }

    /// Current link status.
    pub fn status(&self) -> LinkStatus {
        self.status.borrow().clone()
    }

    /// Number of commands issued so far.
    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::Relaxed)
    }

    /// Issue a command now and return a future observing its reply.
    ///
    /// Delivery has started by the time this returns. The future resolves to
    /// `None` when delivery failed.
    pub fn issue(
        &self,
        command: RemoteCommand,
    ) -> impl Future<Output = Option<Ack>> + Send + 'static {
        debug!(%command, "issuing command");
        self.issued.fetch_add(1, Ordering::Relaxed);
        let pending = self.channel.issue(command.clone());
        let status = Arc::clone(&self.status);

        async move {
            let outcome = pending.await;
            status.send_modify(|s| s.record(&outcome));
            match outcome {
                Ok(ack) => {
                    trace!(%command, ?ack, "command acknowledged");
                    Some(ack)
                }
                Err(e) => {
                    warn!(%command, error = %e, "command delivery failed");
                    None
                }
            }
        }
    }

    /// Issue a command and observe its reply in a task of its own.
    ///
    /// Dropping or aborting whoever awaits the returned handle does not stop
    /// the reply from being logged and recorded.
    pub fn spawn_issue(&self, command: RemoteCommand) -> JoinHandle<Option<Ack>> {
        tokio::spawn(self.issue(command))
    }

    /// Issue a command without waiting for its reply.
    pub fn fire(&self, command: RemoteCommand) {
        drop(self.spawn_issue(command));
    }
}
