//! # recall-feedback — Feedback Ingestion for RECALL
//!
//! Turns "an agent tried something and its needs changed" into a stored
//! memory record with natural-language feedback and an embedding.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │               recall-feedback                 │
//! │  ┌──────────┐  ┌─────────────┐  ┌──────────┐ │
//! │  │ payload  │─►│   service   │─►│  synth   │ │
//! │  └──────────┘  └──────┬──────┘  └────┬─────┘ │
//! │                       ▼              ▼       │
//! │            ┌──────────────┐  ┌────────────┐  │
//! │            │ recall-core  │  │ recall-llm │  │
//! │            └──────────────┘  └────────────┘  │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `payload` — inbound JSON shape
//! - `synth` — rule-based and LLM-backed feedback synthesizers
//! - `service` — validation, embedding, upsert, result descriptor

#![deny(clippy::unwrap_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod payload;
pub mod service;
pub mod synth;

pub use error::FeedbackError;
pub use service::{FeedbackIngestionService, IngestionResult};
pub use synth::{FeedbackSynthesizer, PromptFeedbackSynthesizer, RuleBasedSynthesizer};
