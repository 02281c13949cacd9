use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use async_trait::async_trait;
use log::error;

use super::{ChatReply, ChatRequest, Engine, classify_status, classify_transport, parse_retry_after};
use crate::errors::EngineError;

/// Client for the Anthropic messages API.
#[derive(Debug)]
pub struct AnthropicEngine {
    /// Registry name of this engine instance
    name: String,
    /// Model identifier
    model: String,
    /// API key for authentication
    api_key: String,
    /// API endpoint URL (empty = public API)
    endpoint: String,
    /// HTTP client for API requests
    client: Client,
    /// Transport timeout in milliseconds, for error classification
    timeout_ms: u64,
}

/// Anthropic messages request
#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    messages: Vec<ApiMessage>,
    system: String,
    temperature: f32,
    max_tokens: u32,
}

/// Message in the Anthropic format
#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    content: String,
}

/// Anthropic messages response
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: ApiUsage,
}

/// Individual content block in a response
#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}

/// Token usage information
#[derive(Debug, Deserialize)]
struct ApiUsage {
    input_tokens: u64,
    output_tokens: u64,
}

impl AnthropicEngine {
    /// Create a new Anthropic engine client
    pub fn new(
        name: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        timeout_ms: u64,
    ) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            client: Client::builder()
                .timeout(Duration::from_millis(timeout_ms))
                .build()
                .unwrap_or_default(),
            timeout_ms,
        }
    }

    fn api_url(&self) -> String {
        if self.endpoint.is_empty() {
            "https://api.anthropic.com/v1/messages".to_string()
        } else {
            format!("{}/v1/messages", self.endpoint.trim_end_matches('/'))
        }
    }
}

#[async_trait]
impl Engine for AnthropicEngine {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: ChatRequest) -> Result<ChatReply, EngineError> {
        let body = MessagesRequest {
            model: self.model.clone(),
            messages: vec![ApiMessage {
                role: "user".to_string(),
                content: request.user,
            }],
            system: request.system,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(self.api_url())
            .header("Content-Type", "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_transport(&self.name, &e, self.timeout_ms))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_ms = parse_retry_after(response.headers());
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Anthropic API error ({}): {}", status, error_text);
            return Err(classify_status(
                &self.name,
                status.as_u16(),
                error_text,
                retry_after_ms,
            ));
        }

        let messages = response
            .json::<MessagesResponse>()
            .await
            .map_err(|e| EngineError::Decode {
                engine: self.name.clone(),
                message: e.to_string(),
            })?;

        let text: String = messages
            .content
            .iter()
            .filter(|c| c.content_type == "text")
            .map(|c| c.text.as_str())
            .collect();

        Ok(ChatReply {
            text,
            prompt_tokens: Some(messages.usage.input_tokens),
            completion_tokens: Some(messages.usage.output_tokens),
        })
    }

    async fn check_connection(&self) -> Result<(), EngineError> {
        let probe = ChatRequest {
            system: "You are a connectivity probe.".to_string(),
            user: "Reply with OK.".to_string(),
            temperature: 0.0,
            max_tokens: 4,
        };
        self.complete(probe).await.map(|_| ())
    }
}
