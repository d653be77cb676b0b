//! Feedback ingestion — payload in, result descriptor out.
//!
//! ```text
//! payload ─► validate agent ─► synthesize ─► embed ─► upsert (load/mutate/save)
//!                                                         │
//!                                   IngestionResult ◄─────┘
//! ```
//!
//! Synthesis and embedding run before the store is touched, so a failure in
//! either leaves the store exactly as it was.

use std::sync::Arc;

use recall_core::config::FeedbackConfig;
use recall_core::embedding::EmbeddingProvider;
use recall_core::feedback::ActionOutcome;
use recall_core::{FeedbackFields, Importance, MemoryRecordStore};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::{FeedbackError, Result};
use crate::payload::FeedbackPayload;
use crate::synth::{FeedbackSynthesizer, SynthesisInput};

/// What the caller gets back from one ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionResult {
    /// Whether the feedback was stored.
    pub success: bool,
    /// Id of the created or merged record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_id: Option<String>,
    /// Stored feedback text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    /// Human-readable summary of what happened.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Failure reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IngestionResult {
    /// A failure descriptor.
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            memory_id: None,
            feedback: None,
            message: None,
            error: Some(error.into()),
        }
    }
}

/// Ingests feedback payloads into a [`MemoryRecordStore`].
///
/// The synthesizer type picks the variant: rule-based or LLM-backed.
pub struct FeedbackIngestionService<S> {
    store: Arc<MemoryRecordStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    synthesizer: S,
    config: FeedbackConfig,
}

impl<S: FeedbackSynthesizer> FeedbackIngestionService<S> {
    /// Create a service.
    #[must_use]
    pub fn new(
        store: Arc<MemoryRecordStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        synthesizer: S,
        config: FeedbackConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            synthesizer,
            config,
        }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<MemoryRecordStore> {
        &self.store
    }

    /// Ingest one raw JSON payload. Never fails; errors become descriptors.
    pub async fn ingest(&self, payload: &serde_json::Value) -> IngestionResult {
        match self.try_ingest(payload).await {
            Ok(result) => result,
            Err(FeedbackError::Validation(reason)) => {
                warn!(reason = %reason, "Rejected feedback payload");
                IngestionResult::failure(reason)
            }
            Err(e) => {
                error!(synthesizer = self.synthesizer.name(), error = %e, "Feedback ingestion failed");
                IngestionResult::failure(e.to_string())
            }
        }
    }

    async fn try_ingest(&self, raw: &serde_json::Value) -> Result<IngestionResult> {
        let payload = FeedbackPayload::deserialize(raw)?;
        let agent = payload.agent;

        let agent_name = agent
            .resolved_name()
            .ok_or_else(|| FeedbackError::Validation("agent_name is required".into()))?
            .to_string();

        let section = agent.feedback;
        let memory_id = section.memory_id();
        let importance = Importance::resolve(
            section.importance,
            self.config.default_importance,
            self.config.max_importance,
        );
        let time = match agent.time {
            Some(time) => time,
            None => local_timestamp(&self.config.time_format)?,
        };

        let input = SynthesisInput {
            agent_name,
            outcome: ActionOutcome {
                action: agent.action_name,
                interactable: agent.interactable_name,
                location: agent.current_location_name,
                success: agent.success,
                failure_description: section
                    .feedback_description
                    .unwrap_or_else(|| self.synthesizer.default_description().to_string()),
            },
            needs_diff: section.needs_diff,
        };

        let synthesis = self.synthesizer.synthesize(&input).await?;
        let embedding = self.embedder.embed(&synthesis.feedback)?;

        let fields = FeedbackFields {
            action: input.outcome.action,
            event: String::new(),
            time,
            feedback: synthesis.feedback,
            feedback_negative: synthesis.feedback_negative,
            importance,
        };
        // Store I/O blocks; keep it off the async workers.
        let store = Arc::clone(&self.store);
        let agent_name = input.agent_name.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            store.upsert(&agent_name, memory_id.as_ref(), fields, embedding)
        })
        .await??;

        let message = self.synthesizer.outcome_message(outcome.kind, &outcome.memory_id);
        info!(
            agent = %input.agent_name,
            memory_id = %outcome.memory_id,
            kind = ?outcome.kind,
            importance = importance.value(),
            "Feedback stored"
        );

        Ok(IngestionResult {
            success: true,
            memory_id: Some(outcome.memory_id.to_string()),
            feedback: Some(outcome.feedback),
            message: Some(message),
            error: None,
        })
    }
}

/// Current local time rendered with `format`.
fn local_timestamp(format: &str) -> Result<String> {
    use std::fmt::Write;

    let mut out = String::new();
    write!(out, "{}", chrono::Local::now().format(format))
        .map_err(|_| FeedbackError::Config(format!("invalid time_format '{format}'")))?;
    Ok(out)
}
