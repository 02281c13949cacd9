/*!
 * Bounded-concurrency batch execution.
 *
 * Each worker owns one batch end-to-end: dispatch to the primary engine,
 * parse, sanitize, quality-check and escalate every item, then hand the
 * batch results to the assembler. Workers share nothing but the metrics
 * sink. A cancellation flag stops the pool from starting work on batches
 * that have not been dispatched yet; batches already in flight run to
 * completion under their own timeouts and their results are still
 * delivered.
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use futures::stream::{self, StreamExt};
use log::{info, warn};
use tokio::sync::Semaphore;

use super::escalation::EscalationOrchestrator;
use super::parser::ResponseParser;
use super::planner::Batch;
use crate::dispatch::RetryingDispatcher;
use crate::language_utils::LanguageHint;
use crate::metrics::PipelineMetrics;
use crate::prompts::PromptLibrary;
use crate::sanitize::Sanitizer;
use crate::segment::{EscalationRecord, ItemOutcome, StyleParams, TranslationResult};

/// Caller-level cancellation signal shared with the pool.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    /// Create an unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; batches not yet dispatched produce failure
    /// sentinels instead of engine calls.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Results of one batch, keyed by the batch's plan position.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// Plan position of the batch
    pub batch_id: usize,

    /// One result per segment of the batch
    pub results: Vec<TranslationResult>,
}

/// Bounded-concurrency executor driving batches through the pipeline.
pub struct WorkerPool {
    dispatcher: Arc<RetryingDispatcher>,
    orchestrator: Arc<EscalationOrchestrator>,
    library: Arc<PromptLibrary>,
    sanitizer: Arc<Sanitizer>,
    metrics: Arc<PipelineMetrics>,
    primary_engine: String,
}

impl WorkerPool {
    /// Create a pool.
    pub fn new(
        dispatcher: Arc<RetryingDispatcher>,
        orchestrator: Arc<EscalationOrchestrator>,
        library: Arc<PromptLibrary>,
        sanitizer: Arc<Sanitizer>,
        metrics: Arc<PipelineMetrics>,
        primary_engine: impl Into<String>,
    ) -> Self {
        Self {
            dispatcher,
            orchestrator,
            library,
            sanitizer,
            metrics,
            primary_engine: primary_engine.into(),
        }
    }

    /// Run all batches with at most `concurrency` in flight.
    ///
    /// Output order is unspecified; the assembler re-keys everything by
    /// original segment index.
    pub async fn run(
        &self,
        batches: Vec<Batch>,
        style: &StyleParams,
        language: &LanguageHint,
        concurrency: usize,
        cancel: CancellationFlag,
        progress_callback: impl Fn(usize, usize) + Clone + Send + Sync + 'static,
    ) -> Vec<BatchOutcome> {
        let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
        let total_batches = batches.len();
        let processed_batches = Arc::new(AtomicUsize::new(0));

        stream::iter(batches.into_iter())
            .map(|batch| {
                let semaphore = semaphore.clone();
                let processed_batches = processed_batches.clone();
                let progress_callback = progress_callback.clone();
                let cancel = cancel.clone();

                async move {
                    // The semaphore is never closed; acquisition only
                    // fails on close, so the Err arm is unreachable
                    let _permit = semaphore.acquire().await;

                    let start_time = Instant::now();
                    let outcome = if cancel.is_cancelled() {
                        self.cancelled_batch(batch)
                    } else {
                        self.process_batch(batch, style, language).await
                    };

                    let current = processed_batches.fetch_add(1, Ordering::SeqCst) + 1;
                    progress_callback(current, total_batches);
                    info!(
                        "Batch {} of {} finished in {:?}",
                        outcome.batch_id + 1,
                        total_batches,
                        start_time.elapsed()
                    );

                    outcome
                }
            })
            .buffer_unordered(concurrency.max(1))
            .collect::<Vec<_>>()
            .await
    }

    /// Drive one batch through dispatch, parse, sanitize and escalation.
    async fn process_batch(
        &self,
        batch: Batch,
        style: &StyleParams,
        language: &LanguageHint,
    ) -> BatchOutcome {
        let prompt = self
            .library
            .render_batch(style, &language.name, &batch.segments);

        let dispatch = self
            .dispatcher
            .dispatch(&self.primary_engine, &prompt, None)
            .await;

        let dispatch = match dispatch {
            Ok(dispatch) => dispatch,
            Err(error) => {
                warn!(
                    "Batch {} failed after retries and fallback: {}",
                    batch.id, error
                );
                let results = batch
                    .segments
                    .iter()
                    .map(|segment| {
                        self.metrics.record_outcome(ItemOutcome::Failed);
                        TranslationResult::failed(
                            segment.index,
                            String::new(),
                            format!("batch dispatch failed: {}", error),
                        )
                    })
                    .collect();
                return BatchOutcome {
                    batch_id: batch.id,
                    results,
                };
            }
        };

        let parsed = ResponseParser::parse(&dispatch.response.text, batch.segments.len());
        if parsed.was_repaired {
            warn!(
                "Batch {} response needed repair (pad/truncate or lenient parse)",
                batch.id
            );
        }

        // Transitions that already happened at batch level carry into
        // every item's trace
        let base_trace: Vec<EscalationRecord> = if dispatch.fell_back {
            vec![EscalationRecord::now(
                &self.primary_engine,
                &dispatch.engine_used,
                "transient_exhausted",
            )]
        } else {
            Vec::new()
        };

        let mut results = Vec::with_capacity(batch.segments.len());
        for (segment, raw_candidate) in batch.segments.iter().zip(parsed.items.iter()) {
            let draft = self
                .sanitizer
                .sanitize(&segment.source_text, raw_candidate, language);

            let extra_reasons = if parsed.was_repaired {
                vec!["batch response payload was repaired".to_string()]
            } else {
                Vec::new()
            };

            let result = self
                .orchestrator
                .finalize_item(
                    segment,
                    style,
                    language,
                    draft,
                    &dispatch.engine_used,
                    base_trace.clone(),
                    extra_reasons,
                )
                .await;
            results.push(result);
        }

        BatchOutcome {
            batch_id: batch.id,
            results,
        }
    }

    /// Failure sentinels for a batch skipped due to cancellation.
    fn cancelled_batch(&self, batch: Batch) -> BatchOutcome {
        let results = batch
            .segments
            .iter()
            .map(|segment| {
                self.metrics.record_outcome(ItemOutcome::Failed);
                TranslationResult::failed(
                    segment.index,
                    String::new(),
                    "cancelled before dispatch".to_string(),
                )
            })
            .collect();
        BatchOutcome {
            batch_id: batch.id,
            results,
        }
    }
}
