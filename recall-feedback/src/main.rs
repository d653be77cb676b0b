//! recall-ingest — run one feedback ingestion from the command line.
//!
//! Reads a JSON payload from a file (or stdin), prints the result descriptor
//! as JSON on stdout. Logs go to stderr.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use recall_core::embedding::provider_from_config;
use recall_core::{MemoryRecordStore, RecallConfig};
use recall_feedback::{
    FeedbackIngestionService, IngestionResult, PromptFeedbackSynthesizer, RuleBasedSynthesizer,
};
use recall_llm::{LlmClient, LlmProvider};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Deterministic phrase tables
    Rule,
    /// LLM over the prompt templates
    Llm,
}

#[derive(Parser)]
#[command(name = "recall-ingest")]
#[command(about = "Ingest one agent feedback payload into the memory store", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML config file
    #[arg(short, long, env = "RECALL_CONFIG")]
    config: Option<PathBuf>,

    /// Synthesis strategy
    #[arg(short, long, value_enum, default_value_t = Mode::Rule)]
    mode: Mode,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    /// Payload file; stdin when omitted
    payload: Option<PathBuf>,
}

fn read_payload(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(p) => std::fs::read_to_string(p).with_context(|| format!("reading {}", p.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).context("reading stdin")?;
            Ok(buf)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => RecallConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RecallConfig::default(),
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let store = Arc::new(MemoryRecordStore::open(&config.store).context("opening memory store")?);
    let embedder: Arc<dyn recall_core::embedding::EmbeddingProvider> =
        Arc::from(provider_from_config(&config.embedding)?);

    let raw = read_payload(cli.payload.as_ref())?;
    let result = match serde_json::from_str::<serde_json::Value>(&raw) {
        Err(e) => IngestionResult::failure(format!("malformed payload: {e}")),
        Ok(payload) => match cli.mode {
            Mode::Rule => {
                FeedbackIngestionService::new(store, embedder, RuleBasedSynthesizer, config.feedback.clone())
                    .ingest(&payload)
                    .await
            }
            Mode::Llm => {
                let provider =
                    LlmProvider::from_name(&config.llm.provider, &config.llm.base_url, &config.llm.api_key)?;
                let synthesizer = PromptFeedbackSynthesizer::new(LlmClient::new(provider), &config.llm);
                FeedbackIngestionService::new(store, embedder, synthesizer, config.feedback.clone())
                    .ingest(&payload)
                    .await
            }
        },
    };

    info!(success = result.success, mode = ?cli.mode, "Ingestion finished");
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
