//! Ingestion error types.

use recall_core::RecallError;
use recall_llm::LlmError;
use thiserror::Error;

/// Errors raised while ingesting one feedback payload.
///
/// None of these escape [`crate::FeedbackIngestionService::ingest`]; they are
/// logged and turned into a `success: false` descriptor.
#[derive(Debug, Error)]
pub enum FeedbackError {
    /// The payload is missing something mandatory (e.g. the agent name).
    #[error("{0}")]
    Validation(String),

    /// The payload does not have the expected shape.
    #[error("malformed payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// The LLM did not answer successfully.
    #[error("LLM unavailable: {0}")]
    LlmUnavailable(#[from] LlmError),

    /// A configured value cannot be used (e.g. an unrenderable time format).
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The blocking store task panicked or was cancelled.
    #[error("store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Embedding or persistence failed.
    #[error(transparent)]
    Store(#[from] RecallError),
}

/// Convenience type alias for ingestion results.
pub type Result<T> = std::result::Result<T, FeedbackError>;
