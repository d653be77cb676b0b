//! Error types for the RECALL core library.

use thiserror::Error;

/// Top-level error type for all RECALL core operations.
#[derive(Error, Debug)]
pub enum RecallError {
    /// A memory with the given ID was not found for the agent.
    #[error("Memory not found: agent '{agent}', id '{memory_id}'")]
    MemoryNotFound {
        /// Agent whose bucket was searched.
        agent: String,
        /// The missing memory ID.
        memory_id: crate::MemoryId,
    },

    /// The agent's bucket already holds the highest representable numeric id.
    #[error("No memory id left to allocate for agent '{agent}'")]
    IdSpaceExhausted {
        /// Agent whose bucket is full.
        agent: String,
    },

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// SQLite persistence error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The embedding collaborator failed to produce a vector.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for RecallError {
    fn from(err: serde_json::Error) -> Self {
        RecallError::Serialization(err.to_string())
    }
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, RecallError>;
