/*!
 * Retry, backoff and engine fallback around the adapter.
 *
 * Control flow is kept linear: after every failed attempt a pure decision
 * function inspects the error classification and returns the next action
 * (retry with a delay, switch to the fallback engine, or give up). The
 * dispatcher just executes those decisions.
 */

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use rand::Rng;

use super::adapter::{EngineAdapter, EngineResponse};
use crate::errors::EngineError;
use crate::metrics::PipelineMetrics;
use crate::prompts::RenderedPrompt;

/// Temperature scale applied when switching to the fallback engine.
const FALLBACK_TEMPERATURE_SCALE: f32 = 0.9;

/// Metrics reason label for fallback transitions.
const FALLBACK_REASON: &str = "transient_exhausted";

/// Bounded retry schedule.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts per engine (including the first one)
    pub max_attempts: u32,

    /// Base delay for exponential backoff
    pub backoff_base: Duration,

    /// Delay cap
    pub backoff_cap: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_millis(500),
            backoff_cap: Duration::from_secs(15),
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff delay for a 1-based attempt number, before jitter.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        let delay_ms = self
            .backoff_base
            .as_millis()
            .saturating_mul(1u128 << exp);
        Duration::from_millis(delay_ms.min(self.backoff_cap.as_millis()) as u64)
    }

    /// Wait time after a failed attempt: the error's explicit retry-after
    /// hint when present, otherwise the backoff schedule; jitter applied
    /// either way.
    pub fn delay_for(&self, error: &EngineError, attempt: u32) -> Duration {
        let base = error
            .retry_after()
            .unwrap_or_else(|| self.backoff_delay(attempt));
        apply_jitter(base)
    }
}

/// Scale a delay by a random factor in [0.85, 1.15].
fn apply_jitter(delay: Duration) -> Duration {
    let scale: f64 = rand::rng().random_range(0.85..=1.15);
    Duration::from_millis((delay.as_millis() as f64 * scale) as u64)
}

/// The next move after a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextAction {
    /// Wait, then try the same engine again
    Retry {
        /// How long to wait before the next attempt
        delay: Duration,
    },
    /// Switch to the designated fallback engine
    SwitchToFallback,
    /// Propagate the error
    GiveUp,
}

/// Pure decision function choosing the next action after a failure.
///
/// `engine_attempt` is the 1-based attempt count on the current engine;
/// `fallback_available` is false once we are already on the fallback (or no
/// distinct fallback exists).
pub fn next_action(
    error: &EngineError,
    engine_attempt: u32,
    policy: &RetryPolicy,
    fallback_available: bool,
) -> NextAction {
    if !error.is_transient() {
        return NextAction::GiveUp;
    }
    if engine_attempt < policy.max_attempts {
        return NextAction::Retry {
            delay: policy.delay_for(error, engine_attempt),
        };
    }
    if fallback_available {
        return NextAction::SwitchToFallback;
    }
    NextAction::GiveUp
}

/// Successful dispatch plus how it was achieved.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    /// The engine response
    pub response: EngineResponse,

    /// Total attempts across primary and fallback engines
    pub attempts: u32,

    /// Engine that produced the delivered response
    pub engine_used: String,

    /// Whether the fallback engine was used
    pub fell_back: bool,
}

/// Retry/backoff wrapper around `EngineAdapter` with engine-level fallback.
#[derive(Debug, Clone)]
pub struct RetryingDispatcher {
    adapter: EngineAdapter,
    policy: RetryPolicy,
    fallback_engine: String,
    metrics: Arc<PipelineMetrics>,
}

impl RetryingDispatcher {
    /// Create a dispatcher.
    pub fn new(
        adapter: EngineAdapter,
        policy: RetryPolicy,
        fallback_engine: impl Into<String>,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            adapter,
            policy,
            fallback_engine: fallback_engine.into(),
            metrics,
        }
    }

    /// The adapter used for individual call attempts.
    pub fn adapter(&self) -> &EngineAdapter {
        &self.adapter
    }

    /// Dispatch a prompt to a named engine with retry, backoff and fallback.
    ///
    /// `temperature` of `None` uses the engine's configured base
    /// temperature. Permanent errors propagate immediately; transient ones
    /// are retried up to the policy's attempt budget, then the designated
    /// fallback engine gets its own budget at a slightly reduced
    /// temperature before the last error is propagated.
    pub async fn dispatch(
        &self,
        engine_name: &str,
        prompt: &RenderedPrompt,
        temperature: Option<f32>,
    ) -> Result<DispatchOutcome, EngineError> {
        let mut engine = engine_name.to_string();
        let mut on_fallback = false;
        let mut temperature = temperature;
        let mut engine_attempt: u32 = 0;
        let mut total_attempts: u32 = 0;

        loop {
            engine_attempt += 1;
            total_attempts += 1;

            match self.adapter.call(&engine, prompt, temperature).await {
                Ok(response) => {
                    self.metrics.record_usage(
                        response.prompt_tokens,
                        response.completion_tokens,
                        response.latency,
                    );
                    return Ok(DispatchOutcome {
                        response,
                        attempts: total_attempts,
                        engine_used: engine,
                        fell_back: on_fallback,
                    });
                }
                Err(error) => {
                    let fallback_available = !on_fallback && self.fallback_engine != engine;
                    match next_action(&error, engine_attempt, &self.policy, fallback_available) {
                        NextAction::Retry { delay } => {
                            debug!(
                                "Engine '{}' attempt {}/{} failed ({}), retrying in {:?}",
                                engine, engine_attempt, self.policy.max_attempts, error, delay
                            );
                            tokio::time::sleep(delay).await;
                        }
                        NextAction::SwitchToFallback => {
                            warn!(
                                "Engine '{}' exhausted {} attempts ({}), falling back to '{}'",
                                engine, engine_attempt, error, self.fallback_engine
                            );
                            self.metrics.record_escalation(
                                &engine,
                                &self.fallback_engine,
                                FALLBACK_REASON,
                            );
                            // Reduce the temperature the fallback runs at
                            let base = temperature
                                .or_else(|| self.adapter.base_temperature(&engine).ok())
                                .unwrap_or(0.3);
                            temperature = Some(base * FALLBACK_TEMPERATURE_SCALE);
                            engine = self.fallback_engine.clone();
                            on_fallback = true;
                            engine_attempt = 0;
                        }
                        NextAction::GiveUp => {
                            return Err(error);
                        }
                    }
                }
            }
        }
    }
}
