/*!
 * Error types for the lingorelay pipeline.
 *
 * This module contains custom error types for different parts of the pipeline,
 * using the thiserror crate for ergonomic error definitions. The central
 * distinction is between transient engine failures (worth retrying) and
 * permanent ones (surfaced immediately).
 */

use std::time::Duration;
use thiserror::Error;

/// HTTP-style status codes treated as transient for retry purposes.
const TRANSIENT_STATUS_CODES: [u16; 5] = [429, 500, 502, 503, 504];

/// Errors that can occur when calling a remote text-generation engine
#[derive(Error, Debug)]
pub enum EngineError {
    /// The call exceeded its per-request timeout
    #[error("request to engine '{engine}' timed out after {timeout_ms}ms")]
    Timeout {
        /// Engine that timed out
        engine: String,
        /// Timeout budget that was exceeded
        timeout_ms: u64,
    },

    /// The engine rejected the call because of rate limiting
    #[error("engine '{engine}' rate limited the request: {message}")]
    RateLimited {
        /// Engine that rate limited us
        engine: String,
        /// Error message from the engine
        message: String,
        /// Explicit retry-after hint, when the engine provided one
        retry_after_ms: Option<u64>,
    },

    /// The engine API responded with a non-success status
    #[error("engine '{engine}' responded with error ({status_code}): {message}")]
    Api {
        /// Engine that produced the error
        engine: String,
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("connection to engine '{engine}' failed: {message}")]
    Connection {
        /// Engine we failed to reach
        engine: String,
        /// Transport-level error message
        message: String,
    },

    /// Error with authentication
    #[error("engine '{engine}' rejected the credentials: {message}")]
    Authentication {
        /// Engine that rejected us
        engine: String,
        /// Error message from the API
        message: String,
    },

    /// Error when decoding an engine response body
    #[error("failed to decode response from engine '{engine}': {message}")]
    Decode {
        /// Engine whose response could not be decoded
        engine: String,
        /// Decoder error message
        message: String,
    },

    /// A named engine is not present in the registry
    #[error("no engine registered under the name '{0}'")]
    UnknownEngine(String),
}

impl EngineError {
    /// Whether a retry with backoff has a chance of succeeding.
    ///
    /// Timeouts, connection failures, rate limits and 429/5xx API statuses
    /// are transient; everything else is permanent and propagates immediately.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::RateLimited { .. } | Self::Connection { .. } => true,
            Self::Api { status_code, .. } => TRANSIENT_STATUS_CODES.contains(status_code),
            Self::Authentication { .. } | Self::Decode { .. } | Self::UnknownEngine(_) => false,
        }
    }

    /// Explicit wait hint carried by the error, if any.
    ///
    /// Only rate-limit errors carry one; the dispatcher prefers it over its
    /// own exponential backoff schedule.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited {
                retry_after_ms: Some(ms),
                ..
            } => Some(Duration::from_millis(*ms)),
            _ => None,
        }
    }

    /// Name of the engine the error originated from, when known.
    pub fn engine_name(&self) -> Option<&str> {
        match self {
            Self::Timeout { engine, .. }
            | Self::RateLimited { engine, .. }
            | Self::Api { engine, .. }
            | Self::Connection { engine, .. }
            | Self::Authentication { engine, .. }
            | Self::Decode { engine, .. } => Some(engine),
            Self::UnknownEngine(_) => None,
        }
    }
}

/// Errors that can occur while running the translation pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Error from an engine call that exhausted its retry budget
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// The assembled output did not cover every input index
    #[error("assembled output covers {actual} of {expected} input segments")]
    IncompleteAssembly {
        /// Number of input segments
        expected: usize,
        /// Number of assembled results
        actual: usize,
    },

    /// Invalid pipeline configuration
    #[error("configuration error: {0}")]
    Config(String),
}

// Utility conversions for the application layer
impl From<std::io::Error> for PipelineError {
    fn from(error: std::io::Error) -> Self {
        Self::Config(error.to_string())
    }
}
