use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use async_trait::async_trait;
use log::error;

use super::{ChatReply, ChatRequest, Engine, classify_status, classify_transport, parse_retry_after};
use crate::errors::EngineError;

/// Client for OpenAI-compatible chat completion APIs.
///
/// Works against the public OpenAI API and any compatible self-hosted
/// server (LM Studio, vLLM, ...) via the endpoint setting.
#[derive(Debug)]
pub struct OpenAIEngine {
    /// Registry name of this engine instance
    name: String,
    /// Model identifier
    model: String,
    /// API key for authentication
    api_key: String,
    /// API endpoint base URL (empty = public API)
    endpoint: String,
    /// HTTP client for API requests
    client: Client,
    /// Transport timeout in milliseconds, for error classification
    timeout_ms: u64,
}

/// OpenAI chat completion request
#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
}

/// Chat message
#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

/// OpenAI chat completion response
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

/// One completion choice
#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

/// Token usage information
#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

impl OpenAIEngine {
    /// Create a new OpenAI-compatible engine client
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
            "https://api.openai.com/v1/chat/completions".to_string()
        } else {
            format!(
                "{}/chat/completions",
                self.endpoint.trim_end_matches('/')
            )
        }
    }
}

#[async_trait]
impl Engine for OpenAIEngine {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: ChatRequest) -> Result<ChatReply, EngineError> {
        let body = CompletionRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: request.system,
                },
                Message {
                    role: "user".to_string(),
                    content: request.user,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(self.api_url())
            .bearer_auth(&self.api_key)
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
            error!("OpenAI-compatible API error ({}): {}", status, error_text);
            return Err(classify_status(
                &self.name,
                status.as_u16(),
                error_text,
                retry_after_ms,
            ));
        }

        let completion = response
            .json::<CompletionResponse>()
            .await
            .map_err(|e| EngineError::Decode {
                engine: self.name.clone(),
                message: e.to_string(),
            })?;

        let text = completion
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| EngineError::Decode {
                engine: self.name.clone(),
                message: "response contained no choices".to_string(),
            })?;

        let (prompt_tokens, completion_tokens) = completion
            .usage
            .map(|u| (Some(u.prompt_tokens), Some(u.completion_tokens)))
            .unwrap_or((None, None));

        Ok(ChatReply {
            text,
            prompt_tokens,
            completion_tokens,
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
