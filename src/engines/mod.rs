/*!
 * Engine implementations for remote text-generation backends.
 *
 * This module contains the common `Engine` trait, the registry resolving
 * engine names to implementations, and transport clients:
 * - OpenAI-compatible chat completion APIs
 * - Anthropic messages API
 * - Ollama local server
 * - An in-process mock engine for dry runs and tests
 *
 * Engines are interchangeable named capabilities; everything above this
 * module only ever sees the trait.
 */

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::{Config, EngineConfig, EngineKind};
use crate::errors::EngineError;

pub mod anthropic;
pub mod mock;
pub mod ollama;
pub mod openai;

/// One prompt exchange sent to an engine.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// System message
    pub system: String,

    /// User message
    pub user: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Completion token ceiling
    pub max_tokens: u32,
}

/// Raw engine output plus whatever usage accounting the API reported.
#[derive(Debug, Clone)]
pub struct ChatReply {
    /// Generated text
    pub text: String,

    /// Prompt token count, when the API reports one
    pub prompt_tokens: Option<u64>,

    /// Completion token count, when the API reports one
    pub completion_tokens: Option<u64>,
}

/// Common trait for all text-generation engines.
///
/// Implementations own engine-specific transport details; error
/// classification into transient/permanent happens via `EngineError`.
#[async_trait]
pub trait Engine: Send + Sync + Debug {
    /// Registry name of this engine instance
    fn name(&self) -> &str;

    /// Complete a chat request
    async fn complete(&self, request: ChatRequest) -> Result<ChatReply, EngineError>;

    /// Cheap connectivity probe
    async fn check_connection(&self) -> Result<(), EngineError>;
}

/// Classify a non-success HTTP status into an `EngineError`.
pub(crate) fn classify_status(
    engine: &str,
    status_code: u16,
    message: String,
    retry_after_ms: Option<u64>,
) -> EngineError {
    match status_code {
        401 | 403 => EngineError::Authentication {
            engine: engine.to_string(),
            message,
        },
        429 => EngineError::RateLimited {
            engine: engine.to_string(),
            message,
            retry_after_ms,
        },
        _ => EngineError::Api {
            engine: engine.to_string(),
            status_code,
            message,
        },
    }
}

/// Classify a reqwest transport error into an `EngineError`.
pub(crate) fn classify_transport(engine: &str, error: &reqwest::Error, timeout_ms: u64) -> EngineError {
    if error.is_timeout() {
        EngineError::Timeout {
            engine: engine.to_string(),
            timeout_ms,
        }
    } else {
        EngineError::Connection {
            engine: engine.to_string(),
            message: error.to_string(),
        }
    }
}

/// Parse a Retry-After header value in seconds to milliseconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(|secs| secs * 1000)
}

/// Per-kind concurrency profile with tuned defaults.
#[derive(Debug, Clone)]
pub struct EngineProfile {
    /// Concurrent batch workers this kind handles comfortably
    pub max_concurrent_requests: usize,

    /// Recommended items per batch
    pub recommended_batch_size: usize,
}

impl EngineProfile {
    /// Get the tuned profile for an engine kind.
    pub fn for_kind(kind: EngineKind) -> Self {
        match kind {
            EngineKind::Ollama => Self {
                // Local server, no rate limits
                max_concurrent_requests: 8,
                recommended_batch_size: 5,
            },
            EngineKind::OpenAI => Self {
                max_concurrent_requests: 10,
                recommended_batch_size: 8,
            },
            EngineKind::Anthropic => Self {
                // Lower rate limits, larger context
                max_concurrent_requests: 5,
                recommended_batch_size: 8,
            },
            EngineKind::Mock => Self {
                max_concurrent_requests: 16,
                recommended_batch_size: 8,
            },
        }
    }

    /// Effective worker count, respecting a user override.
    pub fn effective_concurrency(&self, user_override: Option<usize>) -> usize {
        user_override.unwrap_or(self.max_concurrent_requests)
    }
}

/// One registered engine plus its call settings.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    /// Engine implementation
    pub engine: Arc<dyn Engine>,

    /// Transport kind, for profile lookups
    pub kind: EngineKind,

    /// Per-call timeout enforced by the adapter
    pub timeout: Duration,

    /// Temperature used when the caller does not override it
    pub base_temperature: f32,

    /// Completion token ceiling per call
    pub max_output_tokens: u32,
}

/// Registry of named engines, resolved once at startup.
#[derive(Debug)]
pub struct EngineRegistry {
    engines: HashMap<String, EngineHandle>,
    fallback: String,
}

impl EngineRegistry {
    /// Create an empty registry with a designated fallback engine name.
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            engines: HashMap::new(),
            fallback: fallback.into(),
        }
    }

    /// Build a registry from configuration.
    pub fn from_config(config: &Config) -> Result<Self, EngineError> {
        let mut registry = Self::new(config.routing.fallback.clone());
        for engine_config in &config.engines {
            registry.register(build_engine(engine_config), engine_config);
        }
        // The fallback must resolve even for a Config that skipped validate()
        if !registry.engines.contains_key(&registry.fallback) {
            return Err(EngineError::UnknownEngine(registry.fallback.clone()));
        }
        Ok(registry)
    }

    /// Register an engine with the settings from its configuration.
    pub fn register(&mut self, engine: Arc<dyn Engine>, config: &EngineConfig) {
        self.engines.insert(
            engine.name().to_string(),
            EngineHandle {
                engine,
                kind: config.kind,
                timeout: Duration::from_millis(config.timeout_ms),
                base_temperature: config.temperature,
                max_output_tokens: config.max_output_tokens,
            },
        );
    }

    /// Resolve an engine handle by name.
    pub fn get(&self, name: &str) -> Result<&EngineHandle, EngineError> {
        self.engines
            .get(name)
            .ok_or_else(|| EngineError::UnknownEngine(name.to_string()))
    }

    /// Name of the designated stable fallback engine.
    pub fn fallback_name(&self) -> &str {
        &self.fallback
    }

    /// All registered engine names, sorted for stable output.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.engines.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

/// Construct the transport client for one engine definition.
fn build_engine(config: &EngineConfig) -> Arc<dyn Engine> {
    match config.kind {
        EngineKind::OpenAI => Arc::new(openai::OpenAIEngine::new(
            &config.name,
            &config.model,
            &config.api_key,
            &config.endpoint,
            config.timeout_ms,
        )),
        EngineKind::Anthropic => Arc::new(anthropic::AnthropicEngine::new(
            &config.name,
            &config.model,
            &config.api_key,
            &config.endpoint,
            config.timeout_ms,
        )),
        EngineKind::Ollama => Arc::new(ollama::OllamaEngine::new(
            &config.name,
            &config.model,
            &config.endpoint,
            config.timeout_ms,
        )),
        EngineKind::Mock => Arc::new(mock::MockEngine::echo(&config.name)),
    }
}
