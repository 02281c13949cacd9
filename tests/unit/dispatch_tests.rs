/*!
 * Tests for the timed adapter and the retrying dispatcher
 */

use std::sync::Arc;
use std::time::Duration;

use lingorelay::dispatch::EngineAdapter;
use lingorelay::engines::mock::{MockEngine, ScriptedReply};
use lingorelay::engines::EngineRegistry;
use lingorelay::errors::EngineError;
use lingorelay::prompts::RenderedPrompt;

use crate::common::{mock_engine_config, scripted_registry, test_dispatcher};

fn prompt() -> RenderedPrompt {
    RenderedPrompt {
        system: "system".to_string(),
        user: "[\"hello\"]".to_string(),
    }
}

/// Two transient failures then success: the third attempt delivers and the
/// attempt count says so.
#[tokio::test]
async fn test_dispatch_withTwoTransientFailures_shouldSucceedOnThirdAttempt() {
    let (registry, fast, _stable) = scripted_registry(vec![
        ScriptedReply::Transient,
        ScriptedReply::Transient,
        ScriptedReply::Text("ok".to_string()),
    ]);
    let dispatcher = test_dispatcher(registry, 3);

    let outcome = dispatcher.dispatch("fast", &prompt(), None).await.unwrap();

    assert_eq!(outcome.attempts, 3);
    assert_eq!(outcome.response.text, "ok");
    assert_eq!(outcome.engine_used, "fast");
    assert!(!outcome.fell_back);
    assert_eq!(fast.call_count(), 3);
}

#[tokio::test]
async fn test_dispatch_withPermanentError_shouldFailImmediately() {
    let (registry, fast, stable) = scripted_registry(vec![ScriptedReply::Permanent]);
    let dispatcher = test_dispatcher(registry, 3);

    let error = dispatcher.dispatch("fast", &prompt(), None).await.unwrap_err();

    assert!(matches!(error, EngineError::Authentication { .. }));
    assert_eq!(fast.call_count(), 1);
    assert_eq!(stable.call_count(), 0);
}

/// Exhausting the transient budget on the primary switches to the stable
/// fallback engine instead of giving up.
#[tokio::test]
async fn test_dispatch_withExhaustedPrimary_shouldFallBackToStableEngine() {
    let (registry, fast, stable) = scripted_registry(vec![
        ScriptedReply::Transient,
        ScriptedReply::Transient,
    ]);
    let dispatcher = test_dispatcher(registry, 2);

    let outcome = dispatcher.dispatch("fast", &prompt(), None).await.unwrap();

    assert!(outcome.fell_back);
    assert_eq!(outcome.engine_used, "stable");
    assert_eq!(outcome.attempts, 3);
    assert_eq!(fast.call_count(), 2);
    assert_eq!(stable.call_count(), 1);
}

/// The fallback runs at a reduced temperature relative to the primary.
#[tokio::test]
async fn test_dispatch_fallback_shouldReduceTemperature() {
    let (registry, _fast, stable) = scripted_registry(vec![ScriptedReply::Transient]);
    let dispatcher = test_dispatcher(registry, 1);

    dispatcher.dispatch("fast", &prompt(), None).await.unwrap();

    let request = stable.last_request().expect("fallback engine was called");
    // Base temperature 0.3 scaled down by the fallback factor
    assert!(request.temperature < 0.3);
}

/// A rate-limit hint is honored instead of the exponential schedule.
#[tokio::test]
async fn test_dispatch_withRetryAfterHint_shouldWaitRoughlyThatLong() {
    let (registry, _fast, _stable) = scripted_registry(vec![
        ScriptedReply::RateLimited { retry_after_ms: 80 },
        ScriptedReply::Text("ok".to_string()),
    ]);
    let dispatcher = test_dispatcher(registry, 3);

    let start = std::time::Instant::now();
    let outcome = dispatcher.dispatch("fast", &prompt(), None).await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(outcome.attempts, 2);
    // 80ms hint scaled by jitter in [0.85, 1.15]
    assert!(elapsed >= Duration::from_millis(60), "waited {:?}", elapsed);
}

/// Fallback failing transiently too exhausts the whole dispatch.
#[tokio::test]
async fn test_dispatch_withFallbackAlsoFailing_shouldPropagateLastError() {
    let fast = Arc::new(MockEngine::scripted(
        "fast",
        vec![ScriptedReply::Transient],
    ));
    let stable = Arc::new(MockEngine::scripted(
        "stable",
        vec![ScriptedReply::Transient],
    ));

    let mut registry = EngineRegistry::new("stable");
    registry.register(fast.clone(), &mock_engine_config("fast"));
    registry.register(stable.clone(), &mock_engine_config("stable"));
    let dispatcher = test_dispatcher(registry, 1);

    let error = dispatcher.dispatch("fast", &prompt(), None).await.unwrap_err();

    assert!(error.is_transient());
    assert_eq!(fast.call_count(), 1);
    assert_eq!(stable.call_count(), 1);
}

/// The adapter aborts calls that outlive the engine's timeout and
/// classifies them as transient.
#[tokio::test]
async fn test_adapter_call_withSlowEngine_shouldTimeOutTransiently() {
    let slow = Arc::new(
        MockEngine::echo("slow").with_latency(Duration::from_millis(200)),
    );
    let mut config = mock_engine_config("slow");
    config.timeout_ms = 30;

    let mut registry = EngineRegistry::new("slow");
    registry.register(slow, &config);
    let adapter = EngineAdapter::new(Arc::new(registry));

    let error = adapter.call("slow", &prompt(), None).await.unwrap_err();

    assert!(matches!(error, EngineError::Timeout { .. }));
    assert!(error.is_transient());
}

#[tokio::test]
async fn test_adapter_call_withUnknownEngine_shouldFailPermanently() {
    let (registry, _, _) = scripted_registry(vec![]);
    let adapter = EngineAdapter::new(Arc::new(registry));

    let error = adapter.call("nonexistent", &prompt(), None).await.unwrap_err();

    assert!(matches!(error, EngineError::UnknownEngine(_)));
    assert!(!error.is_transient());
}
