use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use async_trait::async_trait;
use log::error;

use super::{ChatReply, ChatRequest, Engine, classify_status, classify_transport};
use crate::errors::EngineError;

/// Client for a local Ollama server.
///
/// Typically registered as the designated stable fallback: a local model
/// never rate limits and keeps the pipeline moving when remote engines
/// degrade.
#[derive(Debug)]
pub struct OllamaEngine {
    /// Registry name of this engine instance
    name: String,
    /// Model identifier
    model: String,
    /// Base URL of the Ollama server
    base_url: String,
    /// HTTP client for making requests
    client: Client,
    /// Transport timeout in milliseconds, for error classification
    timeout_ms: u64,
}

/// Generate request for the Ollama API
#[derive(Debug, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    system: String,
    stream: bool,
    options: GenerateOptions,
}

/// Model options for generation
#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

/// Generate response from the Ollama API
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    prompt_eval_count: Option<u64>,
    #[serde(default)]
    eval_count: Option<u64>,
}

/// Version response used as a connectivity probe
#[derive(Debug, Deserialize)]
struct VersionResponse {
    #[allow(dead_code)]
    version: String,
}

impl OllamaEngine {
    /// Create a new Ollama engine client
    pub fn new(
        name: impl Into<String>,
        model: impl Into<String>,
        endpoint: impl Into<String>,
        timeout_ms: u64,
    ) -> Self {
        let endpoint = endpoint.into();
        let base_url = if endpoint.is_empty() {
            "http://localhost:11434".to_string()
        } else {
            endpoint.trim_end_matches('/').to_string()
        };

        Self {
            name: name.into(),
            model: model.into(),
            base_url,
            client: Client::builder()
                .timeout(Duration::from_millis(timeout_ms))
                // Ollama uses HTTP/1.1; keep connections alive for
                // sequential batch calls
                .http1_only()
                .pool_idle_timeout(Duration::from_secs(90))
                .tcp_keepalive(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            timeout_ms,
        }
    }
}

#[async_trait]
impl Engine for OllamaEngine {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: ChatRequest) -> Result<ChatReply, EngineError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model: self.model.clone(),
            prompt: request.user,
            system: request.system,
            stream: false,
            options: GenerateOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_transport(&self.name, &e, self.timeout_ms))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Ollama API error ({}): {}", status, error_text);
            return Err(classify_status(&self.name, status.as_u16(), error_text, None));
        }

        let generated = response
            .json::<GenerateResponse>()
            .await
            .map_err(|e| EngineError::Decode {
                engine: self.name.clone(),
                message: e.to_string(),
            })?;

        Ok(ChatReply {
            text: generated.response,
            prompt_tokens: generated.prompt_eval_count,
            completion_tokens: generated.eval_count,
        })
    }

    async fn check_connection(&self) -> Result<(), EngineError> {
        let url = format!("{}/api/version", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| classify_transport(&self.name, &e, self.timeout_ms))?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(
                &self.name,
                status.as_u16(),
                "version probe failed".to_string(),
                None,
            ));
        }

        response
            .json::<VersionResponse>()
            .await
            .map_err(|e| EngineError::Decode {
                engine: self.name.clone(),
                message: e.to_string(),
            })?;

        Ok(())
    }
}
