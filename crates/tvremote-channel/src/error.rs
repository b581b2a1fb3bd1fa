//! Command delivery errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("remote reported error: {0}")]
    Remote(String),

    #[error("malformed reply to {command}: {reply:?}")]
    MalformedReply { command: String, reply: String },

    #[error("transport failed: {0}")]
    Transport(String),

    #[error("delivery task aborted")]
    Aborted,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
