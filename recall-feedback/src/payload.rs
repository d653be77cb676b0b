//! Inbound feedback payload.
//!
//! Every field is optional on the wire; missing values take the defaults a
//! game client would expect (empty strings, `success = false`, zero deltas).

use recall_core::{MemoryId, NeedsDiff};
use serde::Deserialize;

/// Top-level payload: `{ "agent": { ... } }`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedbackPayload {
    /// The agent the feedback is about.
    #[serde(default)]
    pub agent: AgentPayload,
}

/// What the agent did and how it went.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AgentPayload {
    /// Preferred agent identifier.
    pub agent_name: Option<String>,
    /// Fallback identifier used by older clients.
    pub name: Option<String>,
    /// Where the action happened.
    pub current_location_name: String,
    /// Object acted upon.
    pub interactable_name: String,
    /// Verb of the action.
    pub action_name: String,
    /// Whether the action succeeded.
    pub success: bool,
    /// Pre-formatted timestamp; "now" when absent.
    pub time: Option<String>,
    /// Feedback details.
    pub feedback: FeedbackSection,
}

impl AgentPayload {
    /// `agent_name`, else `name`. Empty strings count as missing.
    #[must_use]
    pub fn resolved_name(&self) -> Option<&str> {
        [self.agent_name.as_deref(), self.name.as_deref()]
            .into_iter()
            .flatten()
            .find(|n| !n.is_empty())
    }
}

/// The `agent.feedback` object.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FeedbackSection {
    /// Free-text description, used as the opening of failure feedback.
    /// When absent the synthesizer's default applies.
    pub feedback_description: Option<String>,
    /// Record to merge into; string or integer on the wire.
    pub memory_id: Option<WireMemoryId>,
    /// Per-need deltas; unknown keys are ignored.
    pub needs_diff: NeedsDiff,
    /// Caller-requested importance before clamping.
    pub importance: Option<i64>,
}

impl FeedbackSection {
    /// The target id, if one was supplied and is non-empty.
    #[must_use]
    pub fn memory_id(&self) -> Option<MemoryId> {
        self.memory_id
            .as_ref()
            .map(WireMemoryId::to_memory_id)
            .filter(|id| !id.is_empty())
    }
}

/// A memory id as clients send it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum WireMemoryId {
    /// `"12"`
    Text(String),
    /// `12`
    Number(serde_json::Number),
}

impl WireMemoryId {
    /// Coerce to the stored string form.
    #[must_use]
    pub fn to_memory_id(&self) -> MemoryId {
        match self {
            Self::Text(s) => MemoryId::new(s.clone()),
            Self::Number(n) => MemoryId::new(n.to_string()),
        }
    }
}
