//! Configuration for the RECALL record store.
//!
//! Maps directly to `recall.toml`. Every field has a serde default, so an
//! empty file (or no file) yields a working configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level RECALL configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecallConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Store backend and write serialization.
    #[serde(default)]
    pub store: StoreConfig,
    /// Embedding provider settings.
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    /// Feedback ingestion rules.
    #[serde(default)]
    pub feedback: FeedbackConfig,
    /// LLM integration settings.
    #[serde(default)]
    pub llm: LlmConfig,
}

impl RecallConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `RecallError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| crate::RecallError::Config(e.to_string()))?;
        config.feedback.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General system settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Which persistence backend holds the agent store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// One JSON document on disk.
    Json,
    /// One row in an SQLite database.
    Sqlite,
    /// Process memory only (nothing survives a restart).
    Memory,
}

/// Store backend and write serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend kind.
    #[serde(default = "default_backend")]
    pub backend: BackendKind,
    /// Path of the store resource (JSON file or SQLite database).
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    /// Serialize load→mutate→save sequences behind a store-wide lock.
    #[serde(default = "default_true")]
    pub serialize_writes: bool,
    /// Pretty-print the JSON document.
    #[serde(default = "default_true")]
    pub pretty: bool,
    /// Store and verify a CRC-32 of the SQLite blob.
    #[serde(default = "default_true")]
    pub checksum_enabled: bool,
    /// Use WAL journaling for SQLite.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Json,
            path: default_store_path(),
            serialize_writes: true,
            pretty: true,
            checksum_enabled: true,
            wal_mode: true,
        }
    }
}

/// Embedding provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider: "hash" or "stub".
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    /// Embedding vector dimensions.
    #[serde(default = "default_384")]
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "hash".to_string(),
            dimensions: 384,
        }
    }
}

/// Feedback ingestion rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackConfig {
    /// Importance stored when the caller supplies 0 or nothing.
    #[serde(default = "default_importance")]
    pub default_importance: u8,
    /// Upper clamp for caller-supplied importance.
    #[serde(default = "default_max_importance")]
    pub max_importance: u8,
    /// `chrono` format used when the payload has no timestamp.
    #[serde(default = "default_time_format")]
    pub time_format: String,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            default_importance: 8,
            max_importance: 10,
            time_format: default_time_format(),
        }
    }
}

impl FeedbackConfig {
    /// Reject a `time_format` that `chrono` cannot render.
    ///
    /// # Errors
    ///
    /// Returns [`RecallError::Config`](crate::RecallError::Config) naming the
    /// bad format string.
    pub fn validate(&self) -> crate::error::Result<()> {
        use chrono::format::{Item, StrftimeItems};

        if StrftimeItems::new(&self.time_format).any(|item| matches!(item, Item::Error)) {
            return Err(crate::RecallError::Config(format!(
                "invalid feedback.time_format '{}'",
                self.time_format
            )));
        }
        Ok(())
    }
}

/// LLM integration configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider: "ollama", "openai", "none".
    #[serde(default = "default_ollama")]
    pub provider: String,
    /// Base URL for the LLM API.
    #[serde(default = "default_ollama_url")]
    pub base_url: String,
    /// API key (OpenAI-compatible providers only).
    #[serde(default)]
    pub api_key: String,
    /// Model identifier sent with every request.
    #[serde(default = "default_model")]
    pub model: String,
    /// Directory holding `feedback_prompt.txt` and `feedback_system.txt`.
    #[serde(default = "default_prompt_dir")]
    pub prompt_dir: PathBuf,
    /// Optional request timeout; unset means wait indefinitely.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            base_url: "http://localhost:11434".to_string(),
            api_key: String::new(),
            model: "gemma3".to_string(),
            prompt_dir: default_prompt_dir(),
            timeout_ms: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_backend() -> BackendKind { BackendKind::Json }
fn default_store_path() -> PathBuf { PathBuf::from("memories/agents_memories.json") }
fn default_embedding_provider() -> String { "hash".to_string() }
fn default_384() -> usize { 384 }
fn default_importance() -> u8 { 8 }
fn default_max_importance() -> u8 { 10 }
fn default_time_format() -> String { "%Y.%m.%d.%H:%M".to_string() }
fn default_ollama() -> String { "ollama".to_string() }
fn default_ollama_url() -> String { "http://localhost:11434".to_string() }
fn default_model() -> String { "gemma3".to_string() }
fn default_prompt_dir() -> PathBuf { PathBuf::from("prompts/feedback") }
