//! Command channel on top of a request/response transport.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;
use tvremote_types::RemoteCommand;

use crate::error::ChannelError;
use crate::wire::{self, WireRequest};
use crate::{CommandChannel, PendingAck};

/// Request/response transport to the remote backend.
///
/// Implementations post one request and return the raw reply body. They do
/// not retry.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Post a request and wait for the reply body.
    async fn post(&self, request: WireRequest) -> Result<String, ChannelError>;
}

/// [`CommandChannel`] that encodes commands and posts them over a [`Transport`].
///
/// Each delivery runs in its own task, so `issue` must be called from within
/// a tokio runtime.
pub struct RemoteChannel<T> {
    transport: Arc<T>,
}

impl<T: Transport> RemoteChannel<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    /// Shared handle to the underlying transport.
    pub fn transport(&self) -> Arc<T> {
        Arc::clone(&self.transport)
    }
}

impl<T: Transport> CommandChannel for RemoteChannel<T> {
    fn issue(&self, command: RemoteCommand) -> PendingAck {
        let request = wire::encode_command(&command);
        trace!(path = request.path, body = %request.body(), "posting request");

        let transport = Arc::clone(&self.transport);
        let delivery = tokio::spawn(async move { transport.post(request).await });

        Box::pin(async move {
            let body = delivery.await.map_err(|_| ChannelError::Aborted)??;
            wire::decode_reply(&command, &body)
        })
    }
}
