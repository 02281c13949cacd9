/*!
 * Application configuration module.
 *
 * Handles loading, validating and saving the pipeline configuration:
 * the set of named engines, the routing of pipeline roles (primary,
 * repair, committee, arbiter, fallback) onto engine names, and the
 * planner / dispatcher / quality tunables.
 */

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::language_utils::normalize_to_part2t;

/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Named engine definitions available to the pipeline
    pub engines: Vec<EngineConfig>,

    /// Role-to-engine routing
    #[serde(default)]
    pub routing: EngineRouting,

    /// Planner, dispatcher and quality tunables
    #[serde(default)]
    pub pipeline: PipelineTunables,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Engine transport kind
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// OpenAI-compatible chat completion API
    #[default]
    OpenAI,
    /// Anthropic messages API
    Anthropic,
    /// Local Ollama server
    Ollama,
    /// In-process mock engine for dry runs and tests
    Mock,
}

impl EngineKind {
    /// Lowercase identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Anthropic => "anthropic",
            Self::Ollama => "ollama",
            Self::Mock => "mock",
        }
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EngineKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            "ollama" => Ok(Self::Ollama),
            "mock" => Ok(Self::Mock),
            _ => Err(anyhow!("Invalid engine kind: {}", s)),
        }
    }
}

/// One named engine definition
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EngineConfig {
    /// Registry name the pipeline refers to this engine by
    pub name: String,

    /// Transport kind
    #[serde(rename = "type")]
    pub kind: EngineKind,

    /// Model identifier passed to the engine
    #[serde(default = "String::new")]
    pub model: String,

    /// API key
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Service endpoint URL (empty = provider default)
    #[serde(default = "String::new")]
    pub endpoint: String,

    /// Per-call timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Sampling temperature for primary calls
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Completion token ceiling per call
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

/// Role-to-engine routing for the escalation paths
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EngineRouting {
    /// Engine handling first-pass batch translation
    #[serde(default = "default_primary_engine")]
    pub primary: String,

    /// Engine handling single-shot repairs
    #[serde(default = "default_repair_engine")]
    pub repair: String,

    /// Two engines consulted by the committee path
    #[serde(default = "default_committee_engines")]
    pub committee: [String; 2],

    /// Engine synthesizing the committee candidates
    #[serde(default = "default_repair_engine")]
    pub arbiter: String,

    /// Designated stable fallback for transient-failure streaks
    #[serde(default = "default_fallback_engine")]
    pub fallback: String,
}

impl Default for EngineRouting {
    fn default() -> Self {
        Self {
            primary: default_primary_engine(),
            repair: default_repair_engine(),
            committee: default_committee_engines(),
            arbiter: default_repair_engine(),
            fallback: default_fallback_engine(),
        }
    }
}

/// Planner, dispatcher and quality tunables
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PipelineTunables {
    /// Token ceiling per batch (overhead + input + projected output)
    #[serde(default = "default_max_tokens_per_batch")]
    pub max_tokens_per_batch: usize,

    /// Fixed prompt overhead charged against each batch
    #[serde(default = "default_overhead_tokens")]
    pub overhead_tokens: usize,

    /// Projected output tokens per input token
    #[serde(default = "default_output_factor")]
    pub output_factor: f32,

    /// Item count cap per batch
    #[serde(default = "default_max_items_per_batch")]
    pub max_items_per_batch: usize,

    /// Concurrent batch workers; None defers to the engine profile
    #[serde(default)]
    pub concurrency: Option<usize>,

    /// Attempts per engine before fallback / giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base backoff delay in milliseconds
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Backoff delay cap in milliseconds
    #[serde(default = "default_backoff_cap_ms")]
    pub backoff_cap_ms: u64,

    /// Quality gate acceptance threshold
    #[serde(default = "default_quality_threshold")]
    pub quality_threshold: f32,

    /// Use the committee-of-two path instead of single-shot repair
    #[serde(default)]
    pub committee: bool,
}

impl Default for PipelineTunables {
    fn default() -> Self {
        Self {
            max_tokens_per_batch: default_max_tokens_per_batch(),
            overhead_tokens: default_overhead_tokens(),
            output_factor: default_output_factor(),
            max_items_per_batch: default_max_items_per_batch(),
            concurrency: None,
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_cap_ms: default_backoff_cap_ms(),
            quality_threshold: default_quality_threshold(),
            committee: false,
        }
    }
}

/// Log level for the application
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Error level
    Error,
    /// Warning level
    Warn,
    /// Info level (default)
    #[default]
    Info,
    /// Debug level
    Debug,
    /// Trace level
    Trace,
}

impl LogLevel {
    /// Convert to the log crate's level filter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_timeout_ms() -> u64 {
    60_000
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_output_tokens() -> u32 {
    4096
}

fn default_primary_engine() -> String {
    "fast".to_string()
}

fn default_repair_engine() -> String {
    "careful".to_string()
}

fn default_committee_engines() -> [String; 2] {
    ["fast".to_string(), "careful".to_string()]
}

fn default_fallback_engine() -> String {
    "stable".to_string()
}

fn default_max_tokens_per_batch() -> usize {
    3000
}

fn default_overhead_tokens() -> usize {
    400
}

fn default_output_factor() -> f32 {
    1.2
}

fn default_max_items_per_batch() -> usize {
    20
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    500
}

fn default_backoff_cap_ms() -> u64 {
    15_000
}

fn default_quality_threshold() -> f32 {
    0.72
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engines: vec![
                EngineConfig {
                    name: "fast".to_string(),
                    kind: EngineKind::OpenAI,
                    model: "gpt-4o-mini".to_string(),
                    api_key: String::new(),
                    endpoint: String::new(),
                    timeout_ms: default_timeout_ms(),
                    temperature: default_temperature(),
                    max_output_tokens: default_max_output_tokens(),
                },
                EngineConfig {
                    name: "careful".to_string(),
                    kind: EngineKind::Anthropic,
                    model: "claude-3-5-sonnet-latest".to_string(),
                    api_key: String::new(),
                    endpoint: String::new(),
                    timeout_ms: default_timeout_ms(),
                    temperature: default_temperature(),
                    max_output_tokens: default_max_output_tokens(),
                },
                EngineConfig {
                    name: "stable".to_string(),
                    kind: EngineKind::Ollama,
                    model: "llama3.2:3b".to_string(),
                    api_key: String::new(),
                    endpoint: "http://localhost:11434".to_string(),
                    timeout_ms: 120_000,
                    temperature: default_temperature(),
                    max_output_tokens: default_max_output_tokens(),
                },
            ],
            routing: EngineRouting::default(),
            pipeline: PipelineTunables::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow!("Failed to read config file {:?}: {}", path.as_ref(), e))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {:?}: {}", path.as_ref(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)
            .map_err(|e| anyhow!("Failed to write config file {:?}: {}", path.as_ref(), e))?;
        Ok(())
    }

    /// Look up an engine definition by registry name
    pub fn engine(&self, name: &str) -> Option<&EngineConfig> {
        self.engines.iter().find(|e| e.name == name)
    }

    /// Validate internal consistency of the configuration
    pub fn validate(&self) -> Result<()> {
        if self.engines.is_empty() {
            return Err(anyhow!("No engines configured"));
        }

        let mut seen = std::collections::HashSet::new();
        for engine in &self.engines {
            if engine.name.trim().is_empty() {
                return Err(anyhow!("Engine with empty name in configuration"));
            }
            if !seen.insert(engine.name.as_str()) {
                return Err(anyhow!("Duplicate engine name: {}", engine.name));
            }
            if !engine.endpoint.is_empty() {
                url::Url::parse(&engine.endpoint).map_err(|e| {
                    anyhow!("Invalid endpoint for engine {}: {}", engine.name, e)
                })?;
            }
        }

        for (role, name) in [
            ("primary", &self.routing.primary),
            ("repair", &self.routing.repair),
            ("arbiter", &self.routing.arbiter),
            ("fallback", &self.routing.fallback),
            ("committee[0]", &self.routing.committee[0]),
            ("committee[1]", &self.routing.committee[1]),
        ] {
            if self.engine(name).is_none() {
                return Err(anyhow!(
                    "Routing role '{}' refers to unknown engine '{}'",
                    role,
                    name
                ));
            }
        }

        if self.routing.committee[0] == self.routing.committee[1] {
            return Err(anyhow!("Committee engines must be distinct"));
        }

        if self.pipeline.max_tokens_per_batch == 0 {
            return Err(anyhow!("max_tokens_per_batch must be positive"));
        }
        if self.pipeline.max_items_per_batch == 0 {
            return Err(anyhow!("max_items_per_batch must be positive"));
        }
        if self.pipeline.max_attempts == 0 {
            return Err(anyhow!("max_attempts must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.pipeline.quality_threshold) {
            return Err(anyhow!("quality_threshold must be within [0, 1]"));
        }
        if self.pipeline.output_factor < 0.0 {
            return Err(anyhow!("output_factor must be non-negative"));
        }

        Ok(())
    }

    /// Validate a target language code against the ISO tables
    pub fn validate_target_language(code: &str) -> Result<String> {
        normalize_to_part2t(code)
    }
}
