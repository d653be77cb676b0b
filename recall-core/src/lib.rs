//! # RECALL Core Library
//!
//! Memory & feedback record store for simulated agents.
//!
//! Every agent gets an [`AgentBucket`] of memory records plus one
//! [`EmbeddingBundle`] per record. After an agent attempts an action, its
//! change in needs ([`NeedsDiff`]) is turned into a feedback sentence and
//! merged into (or appended to) its memories:
//!
//! - [`needs`] — verbose and terse interpretation of a needs diff
//! - [`feedback`] — deterministic rule-based feedback text
//! - [`store`] — id allocation, lookup, upsert over whole-store load/save
//! - [`persistence`] — JSON file, SQLite and in-memory backends
//! - [`embedding`] — the embedding collaborator interface
//!
//! LLM-assisted feedback and payload ingestion live in `recall-llm` and
//! `recall-feedback`.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod embedding;
pub mod error;
pub mod feedback;
pub mod memory;
pub mod needs;
pub mod persistence;
pub mod store;
pub mod types;

pub use config::RecallConfig;
pub use error::RecallError;
pub use memory::{AgentBucket, AgentStore, EmbeddingBundle, MemoryRecord};
pub use store::{FeedbackFields, MemoryRecordStore, UpsertKind, UpsertOutcome};
pub use types::*;
