/*!
 * Tests for the engine registry and concurrency profiles
 */

use std::sync::Arc;

use lingorelay::app_config::EngineKind;
use lingorelay::engines::mock::MockEngine;
use lingorelay::engines::{EngineProfile, EngineRegistry};
use lingorelay::errors::EngineError;

use crate::common::{mock_config, mock_engine_config};

#[test]
fn test_registry_get_withRegisteredName_shouldResolve() {
    let mut registry = EngineRegistry::new("stable");
    registry.register(Arc::new(MockEngine::echo("stable")), &mock_engine_config("stable"));

    assert!(registry.get("stable").is_ok());
    assert_eq!(registry.fallback_name(), "stable");
}

#[test]
fn test_registry_get_withUnknownName_shouldFail() {
    let registry = EngineRegistry::new("stable");
    let error = registry.get("ghost").unwrap_err();
    assert!(matches!(error, EngineError::UnknownEngine(_)));
}

#[test]
fn test_registry_from_config_shouldRegisterAllEngines() {
    let registry = EngineRegistry::from_config(&mock_config()).unwrap();
    assert_eq!(registry.names(), vec!["careful", "fast", "stable"]);
    assert!(registry.get("fast").is_ok());
}

#[test]
fn test_registry_from_config_withUnknownFallback_shouldFail() {
    let mut config = mock_config();
    config.routing.fallback = "missing".to_string();
    assert!(EngineRegistry::from_config(&config).is_err());
}

#[test]
fn test_profile_forLocalKind_shouldAllowHighConcurrency() {
    let profile = EngineProfile::for_kind(EngineKind::Ollama);
    assert_eq!(profile.max_concurrent_requests, 8);
}

#[test]
fn test_profile_forAnthropic_shouldBeConservative() {
    let profile = EngineProfile::for_kind(EngineKind::Anthropic);
    assert_eq!(profile.max_concurrent_requests, 5);
}

#[test]
fn test_profile_effectiveConcurrency_withOverride_shouldUseOverride() {
    let profile = EngineProfile::for_kind(EngineKind::OpenAI);
    assert_eq!(profile.effective_concurrency(Some(2)), 2);
    assert_eq!(profile.effective_concurrency(None), 10);
}

#[test]
fn test_registry_handle_shouldCarryConfiguredSettings() {
    let mut registry = EngineRegistry::new("fast");
    let mut config = mock_engine_config("fast");
    config.timeout_ms = 1234;
    config.temperature = 0.7;
    registry.register(Arc::new(MockEngine::echo("fast")), &config);

    let handle = registry.get("fast").unwrap();
    assert_eq!(handle.timeout.as_millis(), 1234);
    assert!((handle.base_temperature - 0.7).abs() < f32::EPSILON);
}
