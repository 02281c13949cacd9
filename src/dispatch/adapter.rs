/*!
 * Uniform call interface to a named engine.
 *
 * The adapter is the only place that knows how to turn a rendered prompt
 * into a trait-level engine call: it resolves the engine handle, applies
 * the per-engine timeout as a cancellable timer, and times the call.
 * Timeouts are classified transient; everything else keeps the
 * classification assigned by the transport client.
 */

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::debug;

use crate::engines::{ChatRequest, EngineRegistry};
use crate::errors::EngineError;
use crate::prompts::RenderedPrompt;

/// Timed, classified output of one engine call attempt.
#[derive(Debug, Clone)]
pub struct EngineResponse {
    /// Raw generated text
    pub text: String,

    /// Engine that produced the response
    pub engine: String,

    /// Wall-clock time of the call
    pub latency: Duration,

    /// Prompt token count, when reported
    pub prompt_tokens: Option<u64>,

    /// Completion token count, when reported
    pub completion_tokens: Option<u64>,
}

/// Adapter resolving engine names and enforcing per-call timeouts.
#[derive(Debug, Clone)]
pub struct EngineAdapter {
    registry: Arc<EngineRegistry>,
}

impl EngineAdapter {
    /// Create an adapter over a registry.
    pub fn new(registry: Arc<EngineRegistry>) -> Self {
        Self { registry }
    }

    /// The registry this adapter resolves names against.
    pub fn registry(&self) -> &EngineRegistry {
        &self.registry
    }

    /// Base sampling temperature configured for an engine.
    pub fn base_temperature(&self, engine_name: &str) -> Result<f32, EngineError> {
        Ok(self.registry.get(engine_name)?.base_temperature)
    }

    /// Call a named engine with a rendered prompt.
    ///
    /// `temperature` of `None` uses the engine's configured base
    /// temperature. The call is aborted once the engine's timeout elapses
    /// and reported as a transient `EngineError::Timeout`.
    pub async fn call(
        &self,
        engine_name: &str,
        prompt: &RenderedPrompt,
        temperature: Option<f32>,
    ) -> Result<EngineResponse, EngineError> {
        let handle = self.registry.get(engine_name)?;

        let request = ChatRequest {
            system: prompt.system.clone(),
            user: prompt.user.clone(),
            temperature: temperature.unwrap_or(handle.base_temperature),
            max_tokens: handle.max_output_tokens,
        };

        let start = Instant::now();
        let reply = match tokio::time::timeout(handle.timeout, handle.engine.complete(request)).await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(EngineError::Timeout {
                    engine: engine_name.to_string(),
                    timeout_ms: handle.timeout.as_millis() as u64,
                });
            }
        };

        let latency = start.elapsed();
        debug!(
            "Engine '{}' responded in {:?} ({} chars)",
            engine_name,
            latency,
            reply.text.len()
        );

        Ok(EngineResponse {
            text: reply.text,
            engine: engine_name.to_string(),
            latency,
            prompt_tokens: reply.prompt_tokens,
            completion_tokens: reply.completion_tokens,
        })
    }
}
