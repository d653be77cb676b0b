//! The memory record store.
//!
//! [`MemoryRecordStore`] owns a [`StoreBackend`] and implements id
//! allocation, lookup and upsert on top of whole-store load/save. Every
//! mutation is a full load → mutate → save cycle.
//!
//! When `serialize_writes` is on, each cycle runs under a store-wide lock, so
//! concurrent ingestions cannot lose each other's updates.
//! With it off, two overlapping cycles race and the later save wins.

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::error::{RecallError, Result};
use crate::memory::{AgentBucket, AgentStore, EmbeddingBundle, MemoryRecord};
use crate::persistence::{self, StoreBackend};
use crate::types::{Embedding, Importance, MemoryId};

/// Id given to the first record of an agent.
pub const FIRST_MEMORY_ID: u64 = 1;

/// Fields written by a feedback upsert.
///
/// On a merge only `feedback`, `feedback_negative` (when `Some`) and
/// `importance` (when non-zero) are applied. On creation every field is used.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedbackFields {
    /// Action taken (creation only).
    pub action: String,
    /// Event description (creation only).
    pub event: String,
    /// Formatted timestamp (creation only).
    pub time: String,
    /// Feedback sentence.
    pub feedback: String,
    /// Negative clause, if the synthesis path produced one.
    pub feedback_negative: Option<String>,
    /// Importance after the ingestion rule was applied.
    pub importance: Importance,
}

impl FeedbackFields {
    fn into_record(self) -> MemoryRecord {
        MemoryRecord {
            action: self.action,
            event: self.event,
            time: self.time,
            feedback: self.feedback,
            feedback_negative: self.feedback_negative.unwrap_or_default(),
            importance: self.importance,
            ..MemoryRecord::default()
        }
    }

    fn merge_into(self, record: &mut MemoryRecord) {
        record.feedback = self.feedback;
        if let Some(negative) = self.feedback_negative {
            record.feedback_negative = negative;
        }
        if !self.importance.is_zero() {
            record.importance = self.importance;
        }
    }
}

/// How an upsert resolved its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertKind {
    /// Fields were merged into an existing record.
    Merged,
    /// A new record was created under the caller-supplied id.
    CreatedWithId,
    /// A new record was created under a freshly allocated id.
    CreatedAllocated,
}

impl UpsertKind {
    /// Whether a new record was created.
    #[must_use]
    pub fn created(self) -> bool {
        !matches!(self, Self::Merged)
    }
}

/// Result of [`MemoryRecordStore::upsert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// Id the fields were written under.
    pub memory_id: MemoryId,
    /// Which branch was taken.
    pub kind: UpsertKind,
    /// Feedback text now stored on the record.
    pub feedback: String,
}

/// Per-agent memory records backed by a whole-store backend.
pub struct MemoryRecordStore {
    backend: Box<dyn StoreBackend>,
    write_lock: Option<Mutex<()>>,
}

impl std::fmt::Debug for MemoryRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryRecordStore")
            .field("backend", &self.backend.name())
            .field("serialize_writes", &self.write_lock.is_some())
            .finish()
    }
}

/// Next id for a bucket: one past the highest numeric id.
fn next_id_in(agent: &str, bucket: Option<&AgentBucket>) -> Result<MemoryId> {
    let next = match bucket.and_then(AgentBucket::max_numeric_id) {
        None => FIRST_MEMORY_ID,
        Some(max) => max.checked_add(1).ok_or_else(|| RecallError::IdSpaceExhausted {
            agent: agent.to_string(),
        })?,
    };
    Ok(MemoryId::from_number(next))
}

impl MemoryRecordStore {
    /// Wrap a backend.
    #[must_use]
    pub fn new(backend: Box<dyn StoreBackend>, serialize_writes: bool) -> Self {
        Self {
            backend,
            write_lock: serialize_writes.then(|| Mutex::new(())),
        }
    }

    /// Open the backend described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be opened.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let backend = persistence::open_backend(config)?;
        info!(
            backend = backend.name(),
            path = %config.path.display(),
            serialize_writes = config.serialize_writes,
            "Memory record store ready"
        );
        Ok(Self::new(backend, config.serialize_writes))
    }

    /// Load the full store, dropping any orphaned embedding bundles.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot read or decode the store.
    pub fn load(&self) -> Result<AgentStore> {
        let mut store = self.backend.load()?;
        store.prune_orphaned_embeddings();
        Ok(store)
    }

    /// Persist the full store.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend write fails.
    pub fn save(&self, store: &AgentStore) -> Result<()> {
        self.backend.save(store)
    }

    /// A fresh id guaranteed unused within the agent's bucket.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be loaded, or
    /// [`RecallError::IdSpaceExhausted`] once the bucket holds `u64::MAX`.
    pub fn next_id(&self, agent: &str) -> Result<MemoryId> {
        let store = self.load()?;
        next_id_in(agent, store.agent(agent))
    }

    /// Look up a record by id.
    ///
    /// # Errors
    ///
    /// Returns [`RecallError::MemoryNotFound`] if the agent or id is unknown,
    /// or a load error.
    pub fn get(&self, agent: &str, id: &MemoryId) -> Result<MemoryRecord> {
        let store = self.load()?;
        store
            .agent(agent)
            .and_then(|bucket| bucket.record(id))
            .cloned()
            .ok_or_else(|| RecallError::MemoryNotFound {
                agent: agent.to_string(),
                memory_id: id.clone(),
            })
    }

    /// Look up the embedding bundle of a record.
    ///
    /// # Errors
    ///
    /// Returns [`RecallError::MemoryNotFound`] if no bundle exists, or a
    /// load error.
    pub fn bundle(&self, agent: &str, id: &MemoryId) -> Result<EmbeddingBundle> {
        let store = self.load()?;
        store
            .agent(agent)
            .and_then(|bucket| bucket.bundle(id))
            .cloned()
            .ok_or_else(|| RecallError::MemoryNotFound {
                agent: agent.to_string(),
                memory_id: id.clone(),
            })
    }

    /// Create or merge a record and set its feedback embedding.
    ///
    /// - `id` names an existing record → merge.
    /// - `id` names an unknown record → create under that id.
    /// - `id` is `None` or empty → create under [`Self::next_id`].
    ///
    /// Exactly one save happens per call. Nothing is saved if loading fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be loaded or saved, or
    /// [`RecallError::IdSpaceExhausted`] when no fresh id can be allocated.
    /// An existing record is never overwritten by an allocation.
    pub fn upsert(
        &self,
        agent: &str,
        id: Option<&MemoryId>,
        fields: FeedbackFields,
        feedback_embedding: Embedding,
    ) -> Result<UpsertOutcome> {
        let _guard = self.write_lock.as_ref().map(|lock| lock.lock());

        let mut store = self.load()?;
        let bucket = store.agent_mut(agent);

        let requested = id.filter(|id| !id.is_empty());
        let (memory_id, kind) = match requested {
            Some(id) if bucket.contains(id) => (id.clone(), UpsertKind::Merged),
            Some(id) => (id.clone(), UpsertKind::CreatedWithId),
            None => (next_id_in(agent, Some(&*bucket))?, UpsertKind::CreatedAllocated),
        };
        if kind == UpsertKind::CreatedAllocated && bucket.contains(&memory_id) {
            return Err(RecallError::IdSpaceExhausted {
                agent: agent.to_string(),
            });
        }

        let feedback = fields.feedback.clone();
        match kind {
            UpsertKind::Merged => {
                if let Some(record) = bucket.record_mut(&memory_id) {
                    fields.merge_into(record);
                }
            }
            UpsertKind::CreatedWithId | UpsertKind::CreatedAllocated => {
                bucket.insert_record(memory_id.clone(), fields.into_record());
            }
        }
        if let Some(bundle) = bucket.bundle_mut(&memory_id) {
            bundle.feedback = feedback_embedding;
        }

        self.save(&store)?;

        debug!(agent = %agent, memory_id = %memory_id, kind = ?kind, "Upserted memory record");
        Ok(UpsertOutcome {
            memory_id,
            kind,
            feedback,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::InMemoryBackend;

    fn store() -> MemoryRecordStore {
        MemoryRecordStore::new(Box::new(InMemoryBackend::new()), true)
    }

    fn fields(feedback: &str, action: &str) -> FeedbackFields {
        FeedbackFields {
            action: action.into(),
            time: format!("t-{action}"),
            feedback: feedback.into(),
            feedback_negative: Some(String::new()),
            importance: Importance::from_request(None),
            ..FeedbackFields::default()
        }
    }

    #[test]
    fn first_id_is_one() {
        let s = store();
        assert_eq!(s.next_id("Mira").expect("id").as_str(), "1");
        assert_eq!(s.next_id("Mira").expect("id").as_str(), "1");
    }

    #[test]
    fn allocated_ids_increase() {
        let s = store();
        let a = s.upsert("Mira", None, fields("a", "eat"), Embedding::default()).expect("a");
        let b = s.upsert("Mira", None, fields("b", "eat"), Embedding::default()).expect("b");
        assert_eq!(a.memory_id.as_str(), "1");
        assert_eq!(b.memory_id.as_str(), "2");
        assert_eq!(a.kind, UpsertKind::CreatedAllocated);
        assert_eq!(s.next_id("Mira").expect("id").as_str(), "3");
    }

    #[test]
    fn empty_id_allocates() {
        let s = store();
        let empty = MemoryId::from("");
        let out = s.upsert("Mira", Some(&empty), fields("a", "eat"), Embedding::default()).expect("a");
        assert_eq!(out.memory_id.as_str(), "1");
    }

    #[test]
    fn supplied_id_is_kept_and_gaps_not_reused() {
        let s = store();
        let id = MemoryId::from("41");
        let out = s.upsert("Mira", Some(&id), fields("a", "eat"), Embedding::default()).expect("a");
        assert_eq!(out.kind, UpsertKind::CreatedWithId);
        assert_eq!(out.memory_id, id);
        assert_eq!(s.next_id("Mira").expect("id").as_str(), "42");
    }

    #[test]
    fn merge_keeps_creation_fields() {
        let s = store();
        let id = MemoryId::from("5");
        s.upsert("Mira", Some(&id), fields("first", "eat"), Embedding(vec![1.0])).expect("first");

        let mut second = fields("second", "sleep");
        second.feedback_negative = None;
        second.importance = Importance::from_request(Some(3));
        let out = s.upsert("Mira", Some(&id), second, Embedding(vec![2.0])).expect("second");
        assert_eq!(out.kind, UpsertKind::Merged);

        let record = s.get("Mira", &id).expect("record");
        assert_eq!(record.feedback, "second");
        assert_eq!(record.action, "eat");
        assert_eq!(record.time, "t-eat");
        assert_eq!(record.importance.value(), 3);

        let bundle = s.bundle("Mira", &id).expect("bundle");
        assert_eq!(bundle.feedback, Embedding(vec![2.0]));
        assert_eq!(s.load().expect("load").agent("Mira").expect("agent").len(), 1);
    }

    #[test]
    fn merge_with_zero_importance_keeps_existing() {
        let s = store();
        let id = MemoryId::from("1");
        s.upsert("Mira", Some(&id), fields("a", "eat"), Embedding::default()).expect("a");
        let second = FeedbackFields { feedback: "b".into(), ..FeedbackFields::default() };
        s.upsert("Mira", Some(&id), second, Embedding::default()).expect("b");
        assert_eq!(s.get("Mira", &id).expect("record").importance.value(), 8);
    }

    #[test]
    fn agents_are_independent() {
        let s = store();
        s.upsert("Mira", None, fields("a", "eat"), Embedding::default()).expect("a");
        let out = s.upsert("mira", None, fields("b", "eat"), Embedding::default()).expect("b");
        assert_eq!(out.memory_id.as_str(), "1", "agent names are case-sensitive");
    }

    #[test]
    fn allocation_past_max_id_fails_without_overwrite() {
        let s = store();
        let top = MemoryId::from_number(u64::MAX);
        s.upsert("Mira", Some(&top), fields("kept", "eat"), Embedding::default()).expect("top");

        let err = s
            .upsert("Mira", None, fields("clobber", "sleep"), Embedding::default())
            .expect_err("no id left");
        assert!(matches!(err, RecallError::IdSpaceExhausted { ref agent } if agent == "Mira"));
        assert!(s.next_id("Mira").is_err());

        let record = s.get("Mira", &top).expect("record");
        assert_eq!(record.feedback, "kept");
        assert_eq!(record.action, "eat");
        assert_eq!(s.load().expect("load").agent("Mira").expect("agent").len(), 1);
    }

    #[test]
    fn get_unknown_is_not_found() {
        let err = store().get("Mira", &MemoryId::from("9")).expect_err("missing");
        assert!(matches!(err, RecallError::MemoryNotFound { .. }));
    }
}
