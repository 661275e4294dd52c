//! Typed failure values for the enrichment pipeline.

use thiserror::Error;

/// Raised when an upstream provider reports quota exhaustion.
///
/// This is the one retryable failure in the pipeline, and it is a value,
/// not a generic error: callers match on it to decide retryability, and the
/// message is suitable for direct user display.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct RateLimited {
    pub message: String,
}

impl RateLimited {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors surfaced by the detail cache.
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    RateLimited(#[from] RateLimited),

    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),
}
