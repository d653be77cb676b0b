//! # recall-llm — LLM Abstraction Layer for RECALL
//!
//! Provides a unified interface for LLM inference across multiple backends:
//!   - **Ollama** (local, recommended default)
//!   - **OpenAI-compatible API**
//!
//! Feedback synthesis goes through this crate:
//!   - File-backed prompt templates with built-in defaults
//!   - Single-shot, non-streaming requests with an optional timeout
//!   - Sanitization of the generated sentence
//!
//! Nothing here retries. A failed call is reported to the caller, which
//! decides whether to abort.

pub mod client;
pub mod error;
pub mod prompt;
pub mod sanitize;
pub mod types;

pub use client::{InferenceBackend, LlmClient, LlmProvider};
pub use error::LlmError;
pub use prompt::{PromptId, PromptStore};
pub use types::{LlmRequest, LlmResponse};
