//! LLM provider trait and error types.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors from an LLM backend.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Rate limited by LLM provider")]
    RateLimited,

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Options for a completion request.
#[derive(Debug, Clone)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub timeout: Duration,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: Some(64),
            timeout: Duration::from_secs(30),
        }
    }
}

/// A text-completion backend.
///
/// The classifier only needs single-shot system+user prompting, so the
/// contract is deliberately small: one call, one assistant text back.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    fn model(&self) -> &str;

    async fn complete(
        &self,
        system: &str,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, LlmError>;
}
