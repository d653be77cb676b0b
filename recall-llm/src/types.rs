//! Core types for LLM requests and responses.

use serde::{Deserialize, Serialize};

/// A single-shot, non-streaming generation request.
#[derive(Debug, Clone, Serialize)]
pub struct LlmRequest {
    /// System instruction.
    pub system: String,
    /// Rendered user prompt.
    pub prompt: String,
    /// Model identifier (e.g. `gemma3`).
    pub model: String,
    /// Optional sampling temperature; the provider default when unset.
    pub temperature: Option<f32>,
    /// Optional request timeout in milliseconds; no timeout when unset.
    pub timeout_ms: Option<u64>,
}

impl LlmRequest {
    /// Create a request for `model` with no timeout and default sampling.
    #[must_use]
    pub fn new(model: impl Into<String>, system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            model: model.into(),
            temperature: None,
            timeout_ms: None,
        }
    }

    /// Set the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout_ms: Option<u64>) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set the sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// A successful response from the LLM.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmResponse {
    /// The generated text, unmodified.
    pub text: String,
    /// How many tokens were generated, when the provider reports it.
    pub tokens_generated: u32,
    /// Latency in milliseconds.
    pub latency_ms: u64,
    /// Which model answered.
    pub model: String,
}
