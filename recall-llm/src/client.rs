//! LLM Client — unified interface for Ollama and OpenAI-compatible backends.
//!
//! Every call is a single attempt: no retries, no streaming. A request
//! without `timeout_ms` waits for as long as the endpoint takes.

use std::future::Future;
use std::time::{Duration, Instant};

use reqwest::Client;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::LlmError;
use crate::types::{LlmRequest, LlmResponse};

/// Anything that can answer an [`LlmRequest`].
///
/// [`LlmClient`] is the HTTP implementation; tests and embedders can plug in
/// their own.
pub trait InferenceBackend: Send + Sync {
    /// Run one generation.
    ///
    /// Any `Err` means the endpoint did not report success; callers must not
    /// use partial output.
    fn infer(&self, request: &LlmRequest) -> impl Future<Output = Result<LlmResponse, LlmError>> + Send;
}

/// Provider backend for LLM inference.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    /// Ollama running locally (recommended).
    Ollama { base_url: String },
    /// OpenAI-compatible API.
    OpenAiCompatible { base_url: String, api_key: String },
    /// No LLM available — all calls return [`LlmError::Unavailable`].
    None,
}

impl LlmProvider {
    /// Build a provider from its configured name.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::ConfigError`] for an unknown provider name.
    pub fn from_name(name: &str, base_url: &str, api_key: &str) -> Result<Self, LlmError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        match name {
            "ollama" => Ok(Self::Ollama { base_url }),
            "openai" => Ok(Self::OpenAiCompatible {
                base_url,
                api_key: api_key.to_string(),
            }),
            "none" => Ok(Self::None),
            other => Err(LlmError::ConfigError(format!("unknown LLM provider '{other}'"))),
        }
    }
}

/// The HTTP LLM client.
pub struct LlmClient {
    provider: LlmProvider,
    http: Client,
}

impl LlmClient {
    /// Create a new LLM client.
    #[must_use]
    pub fn new(provider: LlmProvider) -> Self {
        Self {
            provider,
            http: Client::new(),
        }
    }

    /// Create a client with no LLM backend (all calls fail).
    #[must_use]
    pub fn none() -> Self {
        Self::new(LlmProvider::None)
    }

    /// Check if the LLM client has a backend configured.
    #[must_use]
    pub fn is_available(&self) -> bool {
        !matches!(self.provider, LlmProvider::None)
    }

    /// Generate a response from the LLM.
    ///
    /// # Errors
    ///
    /// Returns `Err` if no provider is configured, the request fails, the
    /// endpoint answers with a non-success status, or the body is malformed.
    pub async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        match &self.provider {
            LlmProvider::None => Err(LlmError::Unavailable("No LLM provider configured".into())),
            LlmProvider::Ollama { base_url } => self.generate_ollama(base_url, request).await,
            LlmProvider::OpenAiCompatible { base_url, api_key } => {
                self.generate_openai(base_url, api_key, request).await
            }
        }
    }

    /// POST `body` to `url` and decode the JSON answer.
    async fn post_json(
        &self,
        url: &str,
        bearer: Option<&str>,
        body: &serde_json::Value,
        timeout_ms: Option<u64>,
    ) -> Result<(serde_json::Value, u64), LlmError> {
        let mut builder = self.http.post(url).json(body);
        if let Some(key) = bearer {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }
        if let Some(ms) = timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }

        let start = Instant::now();
        let resp = builder.send().await.map_err(|e| match LlmError::from(e) {
            LlmError::Timeout(_) => LlmError::Timeout(timeout_ms.unwrap_or(0)),
            other => other,
        })?;
        let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(url, status = status.as_u16(), "LLM endpoint returned error");
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let json = resp
            .json::<serde_json::Value>()
            .await
            .map_err(|e| LlmError::ParseError(e.to_string()))?;
        Ok((json, latency_ms))
    }

    /// Generate using Ollama's API.
    async fn generate_ollama(
        &self,
        base_url: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse, LlmError> {
        let url = format!("{base_url}/api/generate");
        let mut body = json!({
            "model": request.model,
            "prompt": request.prompt,
            "system": request.system,
            "stream": false,
        });
        if let Some(t) = request.temperature {
            body["options"] = json!({ "temperature": t });
        }

        let (json, latency_ms) = self.post_json(&url, None, &body, request.timeout_ms).await?;
        let text = json["response"]
            .as_str()
            .ok_or_else(|| LlmError::ParseError(format!("missing 'response' field: {json}")))?
            .to_string();

        debug!(model = %request.model, latency_ms, "Ollama generation complete");
        Ok(LlmResponse {
            text,
            tokens_generated: u32::try_from(json["eval_count"].as_u64().unwrap_or(0)).unwrap_or(u32::MAX),
            latency_ms,
            model: request.model.clone(),
        })
    }

    /// Generate using OpenAI-compatible API.
    async fn generate_openai(
        &self,
        base_url: &str,
        api_key: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse, LlmError> {
        let url = format!("{base_url}/v1/chat/completions");
        let mut body = json!({
            "model": request.model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.prompt },
            ],
            "stream": false,
        });
        if let Some(t) = request.temperature {
            body["temperature"] = json!(t);
        }

        let (json, latency_ms) = self
            .post_json(&url, Some(api_key), &body, request.timeout_ms)
            .await?;
        let text = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| LlmError::ParseError(format!("missing message content: {json}")))?
            .to_string();

        debug!(model = %request.model, latency_ms, "OpenAI-compatible generation complete");
        Ok(LlmResponse {
            text,
            tokens_generated: u32::try_from(json["usage"]["completion_tokens"].as_u64().unwrap_or(0))
                .unwrap_or(u32::MAX),
            latency_ms,
            model: request.model.clone(),
        })
    }
}

impl InferenceBackend for LlmClient {
    fn infer(&self, request: &LlmRequest) -> impl Future<Output = Result<LlmResponse, LlmError>> + Send {
        self.generate(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_from_name() {
        assert!(matches!(
            LlmProvider::from_name("ollama", "http://localhost:11434/", ""),
            Ok(LlmProvider::Ollama { base_url }) if base_url == "http://localhost:11434"
        ));
        assert!(matches!(LlmProvider::from_name("none", "", ""), Ok(LlmProvider::None)));
        assert!(matches!(
            LlmProvider::from_name("llama_cpp", "", ""),
            Err(LlmError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn none_provider_is_unavailable() {
        let client = LlmClient::none();
        assert!(!client.is_available());
        let err = client
            .infer(&LlmRequest::new("gemma3", "system", "prompt"))
            .await
            .expect_err("no provider");
        assert!(matches!(err, LlmError::Unavailable(_)));
    }
}
