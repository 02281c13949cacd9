/*!
 * Tests for configuration loading, defaults and validation
 */

use lingorelay::app_config::{Config, EngineKind};
use tempfile::TempDir;

use crate::common::mock_config;

#[test]
fn test_default_config_shouldValidate() {
    let config = Config::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.engines.len(), 3);
    assert_eq!(config.pipeline.quality_threshold, 0.72);
    assert_eq!(config.pipeline.max_attempts, 3);
}

#[test]
fn test_config_roundtrip_shouldPreserveContents() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("conf.json");

    let config = mock_config();
    config.save_to_file(&path).unwrap();
    let loaded = Config::from_file(&path).unwrap();

    assert_eq!(loaded.engines.len(), config.engines.len());
    assert_eq!(loaded.routing.primary, "fast");
    assert_eq!(loaded.routing.fallback, "stable");
}

#[test]
fn test_from_file_withMissingFile_shouldError() {
    assert!(Config::from_file("/nonexistent/path/conf.json").is_err());
}

#[test]
fn test_from_file_withPartialConfig_shouldFillDefaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("conf.json");
    std::fs::write(
        &path,
        r#"{
            "engines": [
                {"name": "fast", "type": "mock"},
                {"name": "careful", "type": "mock"},
                {"name": "stable", "type": "mock"}
            ]
        }"#,
    )
    .unwrap();

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.engines[0].kind, EngineKind::Mock);
    assert_eq!(config.engines[0].timeout_ms, 60_000);
    assert_eq!(config.pipeline.max_tokens_per_batch, 3000);
    assert_eq!(config.routing.primary, "fast");
}

#[test]
fn test_validate_withUnknownRoutingTarget_shouldFail() {
    let mut config = mock_config();
    config.routing.repair = "missing".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withDuplicateEngineNames_shouldFail() {
    let mut config = mock_config();
    let duplicate = config.engines[0].clone();
    config.engines.push(duplicate);
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withIdenticalCommitteeEngines_shouldFail() {
    let mut config = mock_config();
    config.routing.committee = ["fast".to_string(), "fast".to_string()];
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withBadThreshold_shouldFail() {
    let mut config = mock_config();
    config.pipeline.quality_threshold = 1.5;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withZeroAttempts_shouldFail() {
    let mut config = mock_config();
    config.pipeline.max_attempts = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withInvalidEndpoint_shouldFail() {
    let mut config = mock_config();
    config.engines[0].endpoint = "not a url".to_string();
    assert!(config.validate().is_err());
}
