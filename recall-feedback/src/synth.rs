//! Feedback synthesizers — turn an action outcome into a feedback sentence.
//!
//! Two strategies share one trait:
//!
//! | Synthesizer | Source | Stores `feedback_negative` |
//! |---|---|---|
//! | [`RuleBasedSynthesizer`] | terse phrase tables, deterministic | yes |
//! | [`PromptFeedbackSynthesizer`] | LLM over a file-backed template | no |

use std::future::Future;

use recall_core::config::LlmConfig;
use recall_core::feedback::{self, ActionOutcome};
use recall_core::needs;
use recall_core::{MemoryId, Need, NeedsDiff, UpsertKind};
use recall_llm::prompt::{render_template, PromptId, PromptStore};
use recall_llm::sanitize::sanitize_feedback;
use recall_llm::{InferenceBackend, LlmRequest};
use tracing::{debug, warn};

use crate::error::Result;

/// Everything a synthesizer may look at.
#[derive(Debug, Clone)]
pub struct SynthesisInput {
    /// Agent the feedback is for.
    pub agent_name: String,
    /// What was attempted and whether it worked.
    pub outcome: ActionOutcome,
    /// How the agent's needs moved.
    pub needs_diff: NeedsDiff,
}

/// Synthesizer output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Synthesis {
    /// Full feedback sentence.
    pub feedback: String,
    /// Negative clause, when the strategy produces one separately.
    pub feedback_negative: Option<String>,
}

/// Strategy for producing feedback text.
pub trait FeedbackSynthesizer: Send + Sync {
    /// Produce the feedback for one outcome.
    fn synthesize(&self, input: &SynthesisInput) -> impl Future<Output = Result<Synthesis>> + Send;

    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Failure description used when the payload carries none.
    fn default_description(&self) -> &'static str {
        ""
    }

    /// Result message reported for a stored record.
    fn outcome_message(&self, kind: UpsertKind, memory_id: &MemoryId) -> String {
        match kind {
            UpsertKind::Merged => format!("Combined feedback added to memory_id {memory_id}"),
            UpsertKind::CreatedWithId | UpsertKind::CreatedAllocated => {
                "New memory created with combined feedback".to_string()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Rule-based
// ---------------------------------------------------------------------------

/// Deterministic synthesis from the terse phrase tables. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedSynthesizer;

impl FeedbackSynthesizer for RuleBasedSynthesizer {
    async fn synthesize(&self, input: &SynthesisInput) -> Result<Synthesis> {
        let composed = feedback::compose(&input.outcome, &input.needs_diff);
        Ok(Synthesis {
            feedback: composed.text(),
            feedback_negative: Some(composed.negative),
        })
    }

    fn name(&self) -> &'static str {
        "rule"
    }

    fn default_description(&self) -> &'static str {
        ","
    }
}

// ---------------------------------------------------------------------------
// LLM-backed
// ---------------------------------------------------------------------------

/// Synthesis through an LLM prompted with the verbose need interpretation.
pub struct PromptFeedbackSynthesizer<B> {
    backend: B,
    prompts: PromptStore,
    model: String,
    timeout_ms: Option<u64>,
}

impl<B: InferenceBackend> PromptFeedbackSynthesizer<B> {
    /// Create a synthesizer using `backend` and the LLM settings.
    #[must_use]
    pub fn new(backend: B, config: &LlmConfig) -> Self {
        Self {
            backend,
            prompts: PromptStore::new(&config.prompt_dir),
            model: config.model.clone(),
            timeout_ms: config.timeout_ms,
        }
    }

    /// The template store in use.
    #[must_use]
    pub fn prompts(&self) -> &PromptStore {
        &self.prompts
    }

    /// Build the request for one input (templates are read from disk here).
    #[must_use]
    pub fn build_request(&self, input: &SynthesisInput) -> LlmRequest {
        let system = self.prompts.load(PromptId::FeedbackSystem);
        let template = self.prompts.load(PromptId::FeedbackPrompt);
        let prompt = render_prompt(&template, input);
        LlmRequest::new(&self.model, system, prompt).with_timeout(self.timeout_ms)
    }
}

/// `"Success"`, `"Failed"`, or `"Failed: {description}"`.
#[must_use]
pub fn success_status(outcome: &ActionOutcome) -> String {
    if outcome.success {
        "Success".to_string()
    } else if outcome.failure_description.is_empty() {
        "Failed".to_string()
    } else {
        format!("Failed: {}", outcome.failure_description)
    }
}

/// Fill the feedback template for `input`.
#[must_use]
pub fn render_prompt(template: &str, input: &SynthesisInput) -> String {
    let outcome = &input.outcome;
    let action = if outcome.action.is_empty() { "go to" } else { outcome.action.as_str() };
    let interactable = if outcome.interactable.is_empty() {
        "location"
    } else {
        outcome.interactable.as_str()
    };
    let status = success_status(outcome);
    let feelings = needs::interpret_verbose(&input.needs_diff);

    let mut owned: Vec<(String, String)> = Vec::with_capacity(Need::ALL.len() * 2);
    for need in Need::ALL {
        owned.push((format!("{}_diff", need.name()), input.needs_diff.get(need).to_string()));
        owned.push((format!("{}_feeling", need.name()), feelings.get(need).to_string()));
    }

    let mut vars: Vec<(&str, &str)> = vec![
        ("agent_name", input.agent_name.as_str()),
        ("action", action),
        ("interactable", interactable),
        ("location", outcome.location.as_str()),
        ("success_status", status.as_str()),
        ("feedback_description", outcome.failure_description.as_str()),
    ];
    vars.extend(owned.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    render_template(template, &vars)
}

impl<B: InferenceBackend> FeedbackSynthesizer for PromptFeedbackSynthesizer<B> {
    async fn synthesize(&self, input: &SynthesisInput) -> Result<Synthesis> {
        let request = self.build_request(input);
        let response = self.backend.infer(&request).await.map_err(|e| {
            warn!(agent = %input.agent_name, error = %e, "Feedback generation failed");
            e
        })?;

        let feedback = sanitize_feedback(&response.text);
        debug!(
            agent = %input.agent_name,
            latency_ms = response.latency_ms,
            feedback = %feedback,
            "Generated feedback"
        );
        Ok(Synthesis {
            feedback,
            feedback_negative: None,
        })
    }

    fn name(&self) -> &'static str {
        "llm"
    }

    fn outcome_message(&self, kind: UpsertKind, memory_id: &MemoryId) -> String {
        match kind {
            UpsertKind::Merged => format!("Feedback added to memory_id {memory_id}"),
            UpsertKind::CreatedWithId => format!("New memory created with ID {memory_id}"),
            UpsertKind::CreatedAllocated => "New memory created with feedback".to_string(),
        }
    }
}
