/*!
 * Engine call dispatch.
 *
 * Two layers sit between the pipeline and the engine transports:
 * - `adapter`: renders one call against a named engine under a cancellable
 *   timeout and returns a timed, classified response
 * - `retry`: wraps the adapter with bounded retry, jittered exponential
 *   backoff honoring explicit rate-limit hints, and engine-level fallback
 */

pub mod adapter;
pub mod retry;

pub use adapter::{EngineAdapter, EngineResponse};
pub use retry::{DispatchOutcome, NextAction, RetryPolicy, RetryingDispatcher};
