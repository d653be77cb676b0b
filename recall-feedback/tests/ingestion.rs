//! End-to-end ingestion: payload → synthesis → embedding → store on disk.
//!
//! The LLM is replaced with a scripted backend so the tests are hermetic.

use std::future::Future;
use std::sync::{Arc, Mutex};

use recall_core::config::{FeedbackConfig, LlmConfig, StoreConfig};
use recall_core::embedding::{EmbeddingProvider, HashEmbeddingProvider};
use recall_core::{MemoryId, MemoryRecordStore};
use recall_feedback::{
    FeedbackIngestionService, IngestionResult, PromptFeedbackSynthesizer, RuleBasedSynthesizer,
};
use recall_llm::{InferenceBackend, LlmError, LlmRequest, LlmResponse};
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Replies with a fixed text (or fails) and remembers every request.
struct ScriptedBackend {
    reply: Option<String>,
    seen: Arc<Mutex<Vec<LlmRequest>>>,
}

impl ScriptedBackend {
    fn replying(text: &str) -> (Self, Arc<Mutex<Vec<LlmRequest>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                reply: Some(text.to_string()),
                seen: Arc::clone(&seen),
            },
            seen,
        )
    }

    fn failing() -> Self {
        Self {
            reply: None,
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl InferenceBackend for ScriptedBackend {
    fn infer(&self, request: &LlmRequest) -> impl Future<Output = Result<LlmResponse, LlmError>> + Send {
        self.seen.lock().expect("lock").push(request.clone());
        let result = match &self.reply {
            Some(text) => Ok(LlmResponse {
                text: text.clone(),
                tokens_generated: 0,
                latency_ms: 1,
                model: request.model.clone(),
            }),
            None => Err(LlmError::Status {
                status: 503,
                body: "model loading".into(),
            }),
        };
        async move { result }
    }
}

struct Fixture {
    _dir: tempfile::TempDir,
    store: Arc<MemoryRecordStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: LlmConfig,
    store_path: std::path::PathBuf,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().expect("tempdir");
    let store_cfg = StoreConfig {
        path: dir.path().join("memories").join("agents_memories.json"),
        ..StoreConfig::default()
    };
    let llm = LlmConfig {
        prompt_dir: dir.path().join("prompts").join("feedback"),
        ..LlmConfig::default()
    };
    Fixture {
        store: Arc::new(MemoryRecordStore::open(&store_cfg).expect("open")),
        embedder: Arc::new(HashEmbeddingProvider::new(16)),
        llm,
        store_path: store_cfg.path,
        _dir: dir,
    }
}

impl Fixture {
    fn rule(&self) -> FeedbackIngestionService<RuleBasedSynthesizer> {
        FeedbackIngestionService::new(
            Arc::clone(&self.store),
            Arc::clone(&self.embedder),
            RuleBasedSynthesizer,
            FeedbackConfig::default(),
        )
    }

    fn llm(&self, backend: ScriptedBackend) -> FeedbackIngestionService<PromptFeedbackSynthesizer<ScriptedBackend>> {
        FeedbackIngestionService::new(
            Arc::clone(&self.store),
            Arc::clone(&self.embedder),
            PromptFeedbackSynthesizer::new(backend, &self.llm),
            FeedbackConfig::default(),
        )
    }

    fn snapshot(&self) -> Option<Vec<u8>> {
        std::fs::read(&self.store_path).ok()
    }
}

fn mira_eats_apple(memory_id: Option<Value>, importance: i64) -> Value {
    let mut feedback = json!({
        "feedback_description": "",
        "needs_diff": {"hunger": -45, "sleepiness": 0, "loneliness": 0, "stress": -25},
        "importance": importance,
    });
    if let Some(id) = memory_id {
        feedback["memory_id"] = id;
    }
    json!({
        "agent": {
            "agent_name": "Mira",
            "current_location_name": "kitchen",
            "interactable_name": "apple",
            "action_name": "eat",
            "success": true,
            "time": "2026.10.18.12:00",
            "feedback": feedback,
        }
    })
}

fn mira_fridge_locked(memory_id: Value) -> Value {
    json!({
        "agent": {
            "name": "Mira",
            "current_location_name": "kitchen",
            "interactable_name": "fridge",
            "action_name": "open",
            "success": false,
            "time": "2026.10.18.12:05",
            "feedback": {
                "feedback_description": "the fridge is locked",
                "needs_diff": {"hunger": 5, "stress": 15},
                "memory_id": memory_id,
                "importance": 0,
            }
        }
    })
}

// ---------------------------------------------------------------------------
// Rule-based variant
// ---------------------------------------------------------------------------

#[tokio::test]
async fn rule_success_creates_first_record() {
    let fx = fixture();
    let res = fx.rule().ingest(&mira_eats_apple(None, 15)).await;

    assert_eq!(
        res,
        IngestionResult {
            success: true,
            memory_id: Some("1".into()),
            feedback: Some("I eat apple,  feeling much less hungry and a bit less stressed".into()),
            message: Some("New memory created with combined feedback".into()),
            error: None,
        }
    );

    let record = fx.store.get("Mira", &MemoryId::from("1")).expect("record");
    assert_eq!(record.action, "eat");
    assert_eq!(record.time, "2026.10.18.12:00");
    assert_eq!(record.importance.value(), 10);
    assert_eq!(record.feedback_negative, "");
    assert_eq!(record.event, "");
    assert_eq!(record.event_location, "");

    let bundle = fx.store.bundle("Mira", &MemoryId::from("1")).expect("bundle");
    assert_eq!(
        bundle.feedback,
        fx.embedder
            .embed("I eat apple,  feeling much less hungry and a bit less stressed")
            .expect("embed")
    );
}

#[tokio::test]
async fn rule_failure_merges_into_existing_record() {
    let fx = fixture();
    let svc = fx.rule();
    svc.ingest(&mira_eats_apple(None, 7)).await;

    let res = svc.ingest(&mira_fridge_locked(json!(1))).await;
    assert!(res.success);
    assert_eq!(res.memory_id.as_deref(), Some("1"));
    assert_eq!(res.message.as_deref(), Some("Combined feedback added to memory_id 1"));
    assert_eq!(
        res.feedback.as_deref(),
        Some("the fridge is locked  feeling much more stressed")
    );

    let record = fx.store.get("Mira", &MemoryId::from("1")).expect("record");
    // First write's identity fields survive the merge.
    assert_eq!(record.action, "eat");
    assert_eq!(record.time, "2026.10.18.12:00");
    assert_eq!(record.feedback, "the fridge is locked  feeling much more stressed");
    assert_eq!(record.feedback_negative, " feeling much more stressed");
    // 0 resolves to the default 8, which replaces 7.
    assert_eq!(record.importance.value(), 8);
    assert_eq!(fx.store.load().expect("load").agent("Mira").expect("bucket").len(), 1);
}

#[tokio::test]
async fn unknown_id_creates_record_under_that_id() {
    let fx = fixture();
    let res = fx.rule().ingest(&mira_eats_apple(Some(json!("42")), 7)).await;
    assert!(res.success);
    assert_eq!(res.memory_id.as_deref(), Some("42"));
    assert_eq!(res.message.as_deref(), Some("New memory created with combined feedback"));

    let next = fx.rule().ingest(&mira_eats_apple(None, 7)).await;
    assert_eq!(next.memory_id.as_deref(), Some("43"));
}

#[tokio::test]
async fn validation_error_leaves_store_untouched() {
    let fx = fixture();
    fx.rule().ingest(&mira_eats_apple(None, 7)).await;
    let before = fx.snapshot();

    let mut payload = mira_eats_apple(None, 7);
    payload["agent"]["agent_name"] = json!("");
    let res = fx.rule().ingest(&payload).await;

    assert_eq!(res, IngestionResult::failure("agent_name is required"));
    assert_eq!(fx.snapshot(), before);
}

// ---------------------------------------------------------------------------
// LLM variant
// ---------------------------------------------------------------------------

#[tokio::test]
async fn llm_success_stores_sanitized_sentence() {
    let fx = fixture();
    let (backend, seen) = ScriptedBackend::replying("\"I ate a crisp apple and feel calmer.\"");
    let res = fx.llm(backend).ingest(&mira_eats_apple(None, 3)).await;

    assert!(res.success, "{res:?}");
    assert_eq!(res.feedback.as_deref(), Some("I ate a crisp apple and feel calmer."));
    let record = fx.store.get("Mira", &MemoryId::from("1")).expect("record");
    assert_eq!(record.feedback, "I ate a crisp apple and feel calmer.");
    assert_eq!(record.importance.value(), 3);

    let requests = seen.lock().expect("lock");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].model, "gemma3");
    assert!(requests[0].prompt.contains("I am Mira, and I just tried to eat apple at kitchen."));
    assert!(requests[0].prompt.contains("- Hunger: -45 I feel much less hungry now."));
    assert!(requests[0].system.contains("first-person"));
}

#[tokio::test]
async fn llm_creates_prompt_files_on_first_use() {
    let fx = fixture();
    let (backend, _) = ScriptedBackend::replying("'ok then'");
    fx.llm(backend).ingest(&mira_eats_apple(None, 3)).await;

    assert!(fx.llm.prompt_dir.join("feedback_prompt.txt").exists());
    assert!(fx.llm.prompt_dir.join("feedback_system.txt").exists());
}

#[tokio::test]
async fn llm_uses_edited_template() {
    let fx = fixture();
    std::fs::create_dir_all(&fx.llm.prompt_dir).expect("mkdir");
    std::fs::write(
        fx.llm.prompt_dir.join("feedback_prompt.txt"),
        "{agent_name}|{success_status}|{stress_diff}",
    )
    .expect("write");

    let (backend, seen) = ScriptedBackend::replying("\"fine\"");
    fx.llm(backend).ingest(&mira_fridge_locked(json!("9"))).await;
    assert_eq!(
        seen.lock().expect("lock")[0].prompt,
        "Mira|Failed: the fridge is locked|15"
    );
}

#[tokio::test]
async fn llm_merge_keeps_negative_clause() {
    let fx = fixture();
    fx.rule().ingest(&mira_fridge_locked(json!(1))).await;

    let (backend, _) = ScriptedBackend::replying("\"The fridge would not open.\"");
    let res = fx.llm(backend).ingest(&mira_fridge_locked(json!(1))).await;
    assert_eq!(res.message.as_deref(), Some("Feedback added to memory_id 1"));

    let record = fx.store.get("Mira", &MemoryId::from("1")).expect("record");
    assert_eq!(record.feedback, "The fridge would not open.");
    assert_eq!(record.feedback_negative, " feeling much more stressed");
}

#[tokio::test]
async fn llm_create_messages_name_the_id_when_supplied() {
    let fx = fixture();
    let (backend, _) = ScriptedBackend::replying("\"Locked out again.\"");
    let svc = fx.llm(backend);

    let supplied = svc.ingest(&mira_fridge_locked(json!("9"))).await;
    assert_eq!(supplied.memory_id.as_deref(), Some("9"));
    assert_eq!(supplied.message.as_deref(), Some("New memory created with ID 9"));

    let allocated = svc.ingest(&mira_eats_apple(None, 5)).await;
    assert_eq!(allocated.memory_id.as_deref(), Some("10"));
    assert_eq!(allocated.message.as_deref(), Some("New memory created with feedback"));
}

#[tokio::test]
async fn llm_missing_description_renders_bare_failure() {
    let fx = fixture();
    std::fs::create_dir_all(&fx.llm.prompt_dir).expect("mkdir");
    std::fs::write(fx.llm.prompt_dir.join("feedback_prompt.txt"), "[{success_status}]").expect("write");

    let mut payload = mira_fridge_locked(json!("3"));
    payload["agent"]["feedback"]
        .as_object_mut()
        .expect("object")
        .remove("feedback_description");
    let (backend, seen) = ScriptedBackend::replying("\"fine\"");
    fx.llm(backend).ingest(&payload).await;
    assert_eq!(seen.lock().expect("lock")[0].prompt, "[Failed]");
}

#[tokio::test]
async fn llm_failure_aborts_without_mutation() {
    let fx = fixture();
    fx.rule().ingest(&mira_eats_apple(None, 7)).await;
    let before = fx.snapshot();

    let res = fx.llm(ScriptedBackend::failing()).ingest(&mira_eats_apple(Some(json!(1)), 2)).await;
    assert!(!res.success);
    assert!(res.error.expect("error").starts_with("LLM unavailable"));
    assert_eq!(fx.snapshot(), before);
}

#[tokio::test]
async fn llm_short_reply_becomes_empty_feedback() {
    let fx = fixture();
    let (backend, _) = ScriptedBackend::replying("x");
    let res = fx.llm(backend).ingest(&mira_eats_apple(None, 7)).await;
    assert!(res.success);
    assert_eq!(res.feedback.as_deref(), Some(""));
}
