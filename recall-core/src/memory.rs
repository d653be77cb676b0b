//! Memory records and the per-agent aggregate.
//!
//! The persisted layout is:
//!
//! ```text
//! { "<agent>": { "memories":   { "<id>": MemoryRecord, ... },
//!                "embeddings": { "<id>": EmbeddingBundle, ... } } }
//! ```
//!
//! [`AgentBucket`] keeps both maps private so that an embedding bundle can
//! only ever be attached to an id that has a record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::{Embedding, Importance, MemoryId};

/// One stored experiential entry for an agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryRecord {
    /// Role the agent played in the event.
    pub event_role: String,
    /// Event description.
    pub event: String,
    /// Action taken.
    pub action: String,
    /// Feedback sentence (positive and negative clauses combined).
    pub feedback: String,
    /// Negative clause of the feedback, kept separately.
    pub feedback_negative: String,
    /// Conversation transcript, if the memory came from a conversation.
    pub conversation_detail: String,
    /// Formatted timestamp.
    pub time: String,
    /// Event category.
    pub event_type: String,
    /// Where the event happened.
    pub event_location: String,
    /// Significance on a 0–10 scale.
    pub importance: Importance,
}

/// Vector representations of one record's fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingBundle {
    /// Embedding of the event text.
    pub event: Embedding,
    /// Embedding of the action text.
    pub action: Embedding,
    /// Embedding of the feedback text.
    pub feedback: Embedding,
}

/// All memories and embeddings of a single agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentBucket {
    #[serde(default)]
    memories: BTreeMap<MemoryId, MemoryRecord>,
    #[serde(default)]
    embeddings: BTreeMap<MemoryId, EmbeddingBundle>,
}

impl AgentBucket {
    /// Create an empty bucket.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.memories.len()
    }

    /// Whether the bucket holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.memories.is_empty()
    }

    /// Whether a record exists under `id`.
    #[must_use]
    pub fn contains(&self, id: &MemoryId) -> bool {
        self.memories.contains_key(id)
    }

    /// Look up a record.
    #[must_use]
    pub fn record(&self, id: &MemoryId) -> Option<&MemoryRecord> {
        self.memories.get(id)
    }

    /// Look up a record mutably.
    pub fn record_mut(&mut self, id: &MemoryId) -> Option<&mut MemoryRecord> {
        self.memories.get_mut(id)
    }

    /// Look up the embedding bundle of a record.
    #[must_use]
    pub fn bundle(&self, id: &MemoryId) -> Option<&EmbeddingBundle> {
        self.embeddings.get(id)
    }

    /// Iterate over records in id order.
    pub fn records(&self) -> impl Iterator<Item = (&MemoryId, &MemoryRecord)> {
        self.memories.iter()
    }

    /// Insert or replace a record, returning the previous one.
    pub fn insert_record(&mut self, id: MemoryId, record: MemoryRecord) -> Option<MemoryRecord> {
        self.memories.insert(id, record)
    }

    /// Mutable access to the bundle of an existing record, creating an empty
    /// bundle if needed. Returns `None` when no record exists under `id`.
    pub fn bundle_mut(&mut self, id: &MemoryId) -> Option<&mut EmbeddingBundle> {
        if !self.memories.contains_key(id) {
            return None;
        }
        Some(self.embeddings.entry(id.clone()).or_default())
    }

    /// Highest numeric id in the bucket.
    #[must_use]
    pub fn max_numeric_id(&self) -> Option<u64> {
        self.memories.keys().filter_map(MemoryId::as_number).max()
    }

    /// Drop bundles whose record does not exist. Returns how many were dropped.
    pub fn prune_orphaned_embeddings(&mut self) -> usize {
        let before = self.embeddings.len();
        let memories = &self.memories;
        self.embeddings.retain(|id, _| memories.contains_key(id));
        before - self.embeddings.len()
    }

    /// Number of embedding bundles.
    #[must_use]
    pub fn bundle_count(&self) -> usize {
        self.embeddings.len()
    }
}

/// The whole store: agent name → bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentStore {
    agents: BTreeMap<String, AgentBucket>,
}

impl AgentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bucket of an agent, if any write has happened for it.
    #[must_use]
    pub fn agent(&self, name: &str) -> Option<&AgentBucket> {
        self.agents.get(name)
    }

    /// Bucket of an agent, created on first access.
    pub fn agent_mut(&mut self, name: &str) -> &mut AgentBucket {
        self.agents.entry(name.to_string()).or_default()
    }

    /// Agent names in sorted order.
    pub fn agent_names(&self) -> impl Iterator<Item = &str> {
        self.agents.keys().map(String::as_str)
    }

    /// Number of agents.
    #[must_use]
    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Total number of records across all agents.
    #[must_use]
    pub fn total_records(&self) -> usize {
        self.agents.values().map(AgentBucket::len).sum()
    }

    /// Whether the store holds no agents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Drop orphaned embedding bundles in every bucket, logging each agent
    /// that had any. Returns the total dropped.
    pub fn prune_orphaned_embeddings(&mut self) -> usize {
        let mut total = 0;
        for (agent, bucket) in &mut self.agents {
            let dropped = bucket.prune_orphaned_embeddings();
            if dropped > 0 {
                warn!(agent = %agent, dropped, "Dropped embedding bundles without a memory record");
            }
            total += dropped;
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundle_requires_record() {
        let mut bucket = AgentBucket::new();
        assert!(bucket.bundle_mut(&MemoryId::from("1")).is_none());

        bucket.insert_record(MemoryId::from("1"), MemoryRecord::default());
        bucket.bundle_mut(&MemoryId::from("1")).expect("bundle").feedback = Embedding(vec![1.0]);
        assert_eq!(bucket.bundle(&MemoryId::from("1")).expect("bundle").feedback.len(), 1);
    }

    #[test]
    fn max_numeric_id_ignores_words() {
        let mut bucket = AgentBucket::new();
        for id in ["2", "10", "intro"] {
            bucket.insert_record(MemoryId::from(id), MemoryRecord::default());
        }
        assert_eq!(bucket.max_numeric_id(), Some(10));
    }

    #[test]
    fn json_layout() {
        let json = r#"{
            "Mira": {
                "memories": { "1": { "action": "eat", "importance": 8 } },
                "embeddings": { "1": { "feedback": [0.5] }, "9": {} }
            }
        }"#;
        let mut store: AgentStore = serde_json::from_str(json).expect("parse");
        let bucket = store.agent("Mira").expect("agent");
        let record = bucket.record(&MemoryId::from("1")).expect("record");
        assert_eq!(record.action, "eat");
        assert_eq!(record.importance.value(), 8);
        assert!(bucket.bundle(&MemoryId::from("1")).expect("bundle").event.is_empty());

        assert_eq!(store.prune_orphaned_embeddings(), 1);
        assert_eq!(store.agent("Mira").expect("agent").bundle_count(), 1);
    }
}
