//! Engine errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid sensitivity {0}: must be finite and greater than zero")]
    InvalidSensitivity(f64),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
