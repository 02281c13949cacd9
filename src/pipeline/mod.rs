/*!
 * The resilient multi-engine translation dispatch pipeline.
 *
 * Data flows top-down: segments -> planner -> worker pool ->
 * (dispatcher -> parser -> sanitizer -> quality gate -> escalation) per
 * batch, independently and concurrently -> assembler. This module wires
 * the stages together behind `TranslationPipeline`.
 */

pub mod assembler;
pub mod escalation;
pub mod parser;
pub mod planner;
pub mod quality;
pub mod tokens;
pub mod worker_pool;

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use log::info;
use serde::Serialize;
use uuid::Uuid;

use crate::app_config::Config;
use crate::dispatch::{EngineAdapter, RetryPolicy, RetryingDispatcher};
use crate::engines::{EngineProfile, EngineRegistry};
use crate::errors::EngineError;
use crate::language_utils::LanguageHint;
use crate::metrics::{MetricsSnapshot, PipelineMetrics};
use crate::prompts::PromptLibrary;
use crate::sanitize::Sanitizer;
use crate::segment::{Segment, StyleParams, TranslationMode, TranslationResult};

pub use assembler::ResultAssembler;
pub use escalation::{EscalationConfig, EscalationOrchestrator};
pub use parser::{ParsedPayload, ResponseParser};
pub use planner::{Batch, ChunkPlanner, PlannerConfig};
pub use quality::{QualityGate, QualityVerdict};
pub use worker_pool::{BatchOutcome, CancellationFlag, WorkerPool};

/// Worker cap for modes where 1:1 fidelity risk is higher.
const HEAVY_MODE_CONCURRENCY_CAP: usize = 3;

/// Everything a pipeline run produced, for callers and reports.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    /// Unique identifier of this run
    pub run_id: String,

    /// Per-item results in input order
    pub results: Vec<TranslationResult>,

    /// Delivered strings in input order (`results[i].target_text`)
    pub outputs: Vec<String>,

    /// Metrics snapshot taken at the end of the run
    pub metrics: MetricsSnapshot,

    /// Wall-clock duration of the run in milliseconds
    pub elapsed_ms: u64,
}

/// Fully wired translation pipeline.
pub struct TranslationPipeline {
    config: Config,
    registry: Arc<EngineRegistry>,
    library: Arc<PromptLibrary>,
    metrics: Arc<PipelineMetrics>,
    planner: ChunkPlanner,
    pool: WorkerPool,
}

impl TranslationPipeline {
    /// Build a pipeline from configuration, with the built-in prompt
    /// library.
    pub fn new(config: Config) -> Result<Self> {
        Self::with_library(config, PromptLibrary::builtin())
    }

    /// Build a pipeline with a caller-provided prompt library.
    pub fn with_library(config: Config, library: PromptLibrary) -> Result<Self> {
        config.validate()?;

        let registry = Arc::new(
            EngineRegistry::from_config(&config).context("building engine registry")?,
        );
        let library = Arc::new(library);
        let metrics = Arc::new(PipelineMetrics::new());

        let adapter = EngineAdapter::new(registry.clone());
        let policy = RetryPolicy {
            max_attempts: config.pipeline.max_attempts,
            backoff_base: std::time::Duration::from_millis(config.pipeline.backoff_base_ms),
            backoff_cap: std::time::Duration::from_millis(config.pipeline.backoff_cap_ms),
        };
        let dispatcher = Arc::new(RetryingDispatcher::new(
            adapter,
            policy,
            config.routing.fallback.clone(),
            metrics.clone(),
        ));

        let sanitizer = Arc::new(Sanitizer::standard());
        let orchestrator = Arc::new(EscalationOrchestrator::new(
            dispatcher.clone(),
            sanitizer.clone(),
            library.clone(),
            EscalationConfig {
                quality_threshold: config.pipeline.quality_threshold,
                committee: config.pipeline.committee,
                repair_engine: config.routing.repair.clone(),
                committee_engines: config.routing.committee.clone(),
                arbiter_engine: config.routing.arbiter.clone(),
            },
            metrics.clone(),
        ));

        let planner = ChunkPlanner::new(PlannerConfig::from(&config.pipeline));
        let pool = WorkerPool::new(
            dispatcher,
            orchestrator,
            library.clone(),
            sanitizer,
            metrics.clone(),
            config.routing.primary.clone(),
        );

        Ok(Self {
            config,
            registry,
            library,
            metrics,
            planner,
            pool,
        })
    }

    /// The shared metrics sink of this pipeline.
    pub fn metrics(&self) -> Arc<PipelineMetrics> {
        self.metrics.clone()
    }

    /// The prompt library in use.
    pub fn library(&self) -> &PromptLibrary {
        &self.library
    }

    /// Probe connectivity of every registered engine.
    pub async fn check_engines(&self) -> Vec<(String, Result<(), EngineError>)> {
        let mut outcomes = Vec::new();
        for name in self.registry.names() {
            let result = match self.registry.get(name) {
                Ok(handle) => handle.engine.check_connection().await,
                Err(e) => Err(e),
            };
            outcomes.push((name.to_string(), result));
        }
        outcomes
    }

    /// Effective worker count for a mode: user override, else the primary
    /// engine's profile, capped for the heavier line-aligned modes.
    fn effective_concurrency(&self, mode: TranslationMode) -> usize {
        let profile = self
            .registry
            .get(&self.config.routing.primary)
            .map(|handle| EngineProfile::for_kind(handle.kind))
            .unwrap_or_else(|_| EngineProfile {
                max_concurrent_requests: 4,
                recommended_batch_size: 8,
            });

        let effective = profile.effective_concurrency(self.config.pipeline.concurrency);
        match mode {
            TranslationMode::Subtitles | TranslationMode::Dialogue => {
                effective.min(HEAVY_MODE_CONCURRENCY_CAP)
            }
            _ => effective,
        }
    }

    /// Run the pipeline over an ordered segment list.
    ///
    /// Returns a full, order-preserving result array; items that failed
    /// terminally carry explicit failure sentinels rather than being
    /// silently dropped.
    pub async fn run(
        &self,
        segments: &[Segment],
        style: &StyleParams,
        cancel: CancellationFlag,
        progress_callback: impl Fn(usize, usize) + Clone + Send + Sync + 'static,
    ) -> Result<PipelineReport> {
        let started = Instant::now();
        let run_id = Uuid::new_v4().to_string();

        let language = LanguageHint::resolve(&style.target_language)
            .with_context(|| format!("invalid target language '{}'", style.target_language))?;

        let batches = self.planner.plan(segments);
        info!(
            "Run {}: {} segments in {} batches, target {}",
            run_id,
            segments.len(),
            batches.len(),
            language.name
        );

        let concurrency = self.effective_concurrency(style.mode);
        let outcomes = self
            .pool
            .run(batches, style, &language, concurrency, cancel, progress_callback)
            .await;

        let results = ResultAssembler::assemble(segments.len(), outcomes)?;
        let outputs = ResultAssembler::output_texts(&results);

        let report = PipelineReport {
            run_id,
            outputs,
            metrics: self.metrics.snapshot(),
            elapsed_ms: started.elapsed().as_millis() as u64,
            results,
        };

        info!(
            "Run {} finished in {}ms: {} accepted, {} repaired, {} committee, {} failed",
            report.run_id,
            report.elapsed_ms,
            report.metrics.accepted,
            report.metrics.repaired,
            report.metrics.committee_finalized,
            report.metrics.failed
        );
        info!("{}", self.metrics.token_usage().summary());

        Ok(report)
    }
}
