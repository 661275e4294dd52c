//! LLM provider abstraction layer.
//!
//! Trait-based so the genre deducer can be tested against scripted
//! backends; the real backend is any OpenAI-compatible service.

mod openai;
mod provider;

pub use openai::OpenAiProvider;
pub use provider::{CompletionOptions, LlmError, LlmProvider};
