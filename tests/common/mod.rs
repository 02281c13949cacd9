/*!
 * Common test utilities for the lingorelay test suite
 *
 * Pipelines under test run entirely against in-process mock engines; no
 * test ever reaches the network.
 */

use std::sync::Arc;

use lingorelay::app_config::{Config, EngineConfig, EngineKind, EngineRouting, PipelineTunables};
use lingorelay::dispatch::{EngineAdapter, RetryPolicy, RetryingDispatcher};
use lingorelay::engines::mock::{MockEngine, ScriptedReply};
use lingorelay::engines::EngineRegistry;
use lingorelay::metrics::PipelineMetrics;
use lingorelay::prompts::{RESULT_BEGIN, RESULT_END};
use lingorelay::segment::Segment;

/// Engine definition for a named mock engine
pub fn mock_engine_config(name: &str) -> EngineConfig {
    EngineConfig {
        name: name.to_string(),
        kind: EngineKind::Mock,
        model: "mock-model".to_string(),
        api_key: String::new(),
        endpoint: String::new(),
        timeout_ms: 5_000,
        temperature: 0.3,
        max_output_tokens: 1024,
    }
}

/// Full config over three mock engines (fast/careful/stable)
pub fn mock_config() -> Config {
    Config {
        engines: vec![
            mock_engine_config("fast"),
            mock_engine_config("careful"),
            mock_engine_config("stable"),
        ],
        routing: EngineRouting {
            primary: "fast".to_string(),
            repair: "careful".to_string(),
            committee: ["fast".to_string(), "careful".to_string()],
            arbiter: "careful".to_string(),
            fallback: "stable".to_string(),
        },
        pipeline: PipelineTunables::default(),
        log_level: Default::default(),
    }
}

/// Registry where the primary engine replays a script and the others echo
pub fn scripted_registry(
    script: Vec<ScriptedReply>,
) -> (EngineRegistry, Arc<MockEngine>, Arc<MockEngine>) {
    let fast = Arc::new(MockEngine::scripted("fast", script));
    let careful = Arc::new(MockEngine::echo("careful"));
    let stable = Arc::new(MockEngine::echo("stable"));

    let mut registry = EngineRegistry::new("stable");
    registry.register(fast.clone(), &mock_engine_config("fast"));
    registry.register(careful.clone(), &mock_engine_config("careful"));
    registry.register(stable.clone(), &mock_engine_config("stable"));

    (registry, fast, stable)
}

/// Dispatcher over a registry with a tight test retry policy
pub fn test_dispatcher(registry: EngineRegistry, max_attempts: u32) -> RetryingDispatcher {
    RetryingDispatcher::new(
        EngineAdapter::new(Arc::new(registry)),
        RetryPolicy {
            max_attempts,
            backoff_base: std::time::Duration::from_millis(5),
            backoff_cap: std::time::Duration::from_millis(20),
        },
        "stable",
        Arc::new(PipelineMetrics::new()),
    )
}

/// Indexed segments from plain texts
pub fn segments_of(texts: &[&str]) -> Vec<Segment> {
    texts
        .iter()
        .enumerate()
        .map(|(i, t)| Segment::new(i, *t))
        .collect()
}

/// A well-formed delimited engine reply carrying the given items
pub fn delimited_reply(items: &[&str]) -> String {
    let payload = serde_json::to_string(items).expect("serializing test payload");
    format!("{}\n{}\n{}", RESULT_BEGIN, payload, RESULT_END)
}
