/*!
 * # lingorelay
 *
 * A Rust library for resilient multi-engine translation dispatch.
 *
 * ## Features
 *
 * - Token-bounded batching of ordered text segments
 * - Concurrent dispatch to interchangeable remote engines:
 *   - OpenAI-compatible APIs
 *   - Anthropic API
 *   - Ollama (local LLM)
 * - Strict 1:1 index contract between input and output
 * - Retry with jittered backoff, rate-limit hints and engine fallback
 * - Linguistic invariant enforcement (dialogue structure, numerals,
 *   capitalization, mood, ellipses)
 * - Heuristic quality gating with repair and committee escalation
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `segment`: Core data model (segments, styles, results)
 * - `prompts`: Style template registry and prompt rendering
 * - `engines`: Clients for the supported engine backends
 * - `dispatch`: Timed adapter and retrying dispatcher
 * - `pipeline`: Planner, worker pool, parser, quality gate, escalation
 *   and assembler
 * - `sanitize`: Ordered invariant-enforcing text transforms
 * - `metrics`: Counters, histograms and token usage accounting
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the library
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod dispatch;
pub mod engines;
pub mod errors;
pub mod language_utils;
pub mod metrics;
pub mod pipeline;
pub mod prompts;
pub mod sanitize;
pub mod segment;

// Re-export main types for easier usage
pub use app_config::Config;
pub use errors::{EngineError, PipelineError};
pub use language_utils::{LanguageHint, get_language_name, language_codes_match};
pub use pipeline::{CancellationFlag, PipelineReport, TranslationPipeline};
pub use segment::{Segment, StyleParams, TranslationMode, TranslationResult};
