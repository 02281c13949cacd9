/*!
 * Escalation of low-quality or failed candidates.
 *
 * Every item moves through a small state machine:
 * Draft -> QualityChecked -> {Accepted | Repaired | CommitteeFinalized |
 * Failed} -> Delivered. Items clearing the quality gate are accepted as
 * is. Items below the threshold are escalated: a single-shot repair call
 * against the secondary engine at reduced temperature, or, when the
 * committee path is enabled, two engines consulted concurrently with an
 * arbiter synthesizing the final text. Transient failures along the way go
 * through the dispatcher's retry/fallback policy before an item is marked
 * failed. Every transition lands in the metrics and in the per-item trace.
 */

use std::sync::Arc;

use log::{debug, warn};

use super::parser::ResponseParser;
use super::quality::{QualityGate, QualityVerdict};
use crate::dispatch::RetryingDispatcher;
use crate::errors::EngineError;
use crate::language_utils::LanguageHint;
use crate::metrics::PipelineMetrics;
use crate::prompts::{PromptLibrary, RenderedPrompt};
use crate::sanitize::Sanitizer;
use crate::segment::{
    EscalationRecord, ItemOutcome, Segment, StyleParams, TranslationResult,
};

/// Temperature scale applied to repair and committee calls.
const ESCALATION_TEMPERATURE_SCALE: f32 = 0.8;

/// Metrics reason label for quality-gate escalations.
const LOW_QUALITY_REASON: &str = "low_quality";

/// Metrics reason label for arbitration calls.
const ARBITRATION_REASON: &str = "arbitration";

/// Routing and threshold configuration for the escalation paths.
#[derive(Debug, Clone)]
pub struct EscalationConfig {
    /// Quality gate acceptance threshold
    pub quality_threshold: f32,

    /// Use the committee path instead of single-shot repair
    pub committee: bool,

    /// Engine handling single-shot repairs
    pub repair_engine: String,

    /// Engines consulted by the committee path
    pub committee_engines: [String; 2],

    /// Engine synthesizing the committee candidates
    pub arbiter_engine: String,
}

/// Orchestrator driving one item from draft to delivery.
pub struct EscalationOrchestrator {
    dispatcher: Arc<RetryingDispatcher>,
    sanitizer: Arc<Sanitizer>,
    gate: QualityGate,
    library: Arc<PromptLibrary>,
    config: EscalationConfig,
    metrics: Arc<PipelineMetrics>,
}

impl EscalationOrchestrator {
    /// Create an orchestrator.
    pub fn new(
        dispatcher: Arc<RetryingDispatcher>,
        sanitizer: Arc<Sanitizer>,
        library: Arc<PromptLibrary>,
        config: EscalationConfig,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            dispatcher,
            sanitizer,
            gate: QualityGate::new(),
            library,
            config,
            metrics,
        }
    }

    /// Drive a sanitized draft through quality check and escalation.
    ///
    /// `draft_engine` names the engine that produced the draft; `trace`
    /// carries transitions that already happened at the batch level
    /// (dispatcher fallback); `extra_reasons` carries batch-level
    /// observations such as parser repairs.
    pub async fn finalize_item(
        &self,
        segment: &Segment,
        style: &StyleParams,
        language: &LanguageHint,
        draft: String,
        draft_engine: &str,
        mut trace: Vec<EscalationRecord>,
        extra_reasons: Vec<String>,
    ) -> TranslationResult {
        // Draft -> QualityChecked
        let verdict = self.gate.score(&segment.source_text, &draft);
        self.metrics.record_score(verdict.score);

        if verdict.passes(self.config.quality_threshold) {
            // QualityChecked -> Accepted -> Delivered
            return self.deliver(
                segment.index,
                draft,
                verdict,
                ItemOutcome::Accepted,
                trace,
                extra_reasons,
            );
        }

        debug!(
            "Segment {} scored {:.2} (threshold {:.2}), escalating",
            segment.index, verdict.score, self.config.quality_threshold
        );

        if self.config.committee {
            self.committee_finalize(segment, style, language, draft, draft_engine, verdict, trace, extra_reasons)
                .await
        } else {
            // Single-shot repair via the secondary engine
            let reason = format!(
                "quality score {:.2} below threshold {:.2}",
                verdict.score, self.config.quality_threshold
            );
            self.metrics.record_escalation(
                draft_engine,
                &self.config.repair_engine,
                LOW_QUALITY_REASON,
            );
            trace.push(EscalationRecord::now(
                draft_engine,
                &self.config.repair_engine,
                reason,
            ));

            let prompt = self
                .library
                .render_single(style, &language.name, segment);
            match self
                .call_for_candidate(&self.config.repair_engine, &prompt, segment, language)
                .await
            {
                Ok((candidate, fell_back)) => {
                    if fell_back {
                        trace.push(EscalationRecord::now(
                            &self.config.repair_engine,
                            self.fallback_name(),
                            "transient_exhausted",
                        ));
                    }
                    let repaired_verdict = self.gate.score(&segment.source_text, &candidate);
                    self.metrics.record_score(repaired_verdict.score);
                    self.deliver(
                        segment.index,
                        candidate,
                        repaired_verdict,
                        ItemOutcome::Repaired,
                        trace,
                        extra_reasons,
                    )
                }
                Err(error) => {
                    self.fail(segment.index, draft, verdict, error, trace, extra_reasons)
                }
            }
        }
    }

    /// Committee-of-two plus arbiter synthesis.
    #[allow(clippy::too_many_arguments)]
    async fn committee_finalize(
        &self,
        segment: &Segment,
        style: &StyleParams,
        language: &LanguageHint,
        draft: String,
        draft_engine: &str,
        verdict: QualityVerdict,
        mut trace: Vec<EscalationRecord>,
        extra_reasons: Vec<String>,
    ) -> TranslationResult {
        let [engine_a, engine_b] = &self.config.committee_engines;
        let reason = format!("quality score {:.2}, committee consulted", verdict.score);

        for engine in [engine_a, engine_b] {
            self.metrics
                .record_escalation(draft_engine, engine, LOW_QUALITY_REASON);
            trace.push(EscalationRecord::now(draft_engine, engine, reason.clone()));
        }

        let prompt = self.library.render_single(style, &language.name, segment);
        let (result_a, result_b) = futures::join!(
            self.call_for_candidate(engine_a, &prompt, segment, language),
            self.call_for_candidate(engine_b, &prompt, segment, language),
        );

        let candidate_a = result_a.map(|(text, _)| text);
        let candidate_b = result_b.map(|(text, _)| text);

        match (candidate_a, candidate_b) {
            (Ok(a), Ok(b)) => {
                self.metrics
                    .record_escalation(engine_a, &self.config.arbiter_engine, ARBITRATION_REASON);
                trace.push(EscalationRecord::now(
                    engine_a.as_str(),
                    &self.config.arbiter_engine,
                    "arbiter synthesis over two candidates",
                ));

                let arbiter_prompt = self.library.render_arbiter(
                    style,
                    &language.name,
                    segment,
                    &a,
                    &b,
                );
                match self
                    .call_for_candidate(&self.config.arbiter_engine, &arbiter_prompt, segment, language)
                    .await
                {
                    Ok((synthesized, _)) => {
                        let final_verdict = self.gate.score(&segment.source_text, &synthesized);
                        self.metrics.record_score(final_verdict.score);
                        self.deliver(
                            segment.index,
                            synthesized,
                            final_verdict,
                            ItemOutcome::CommitteeFinalized,
                            trace,
                            extra_reasons,
                        )
                    }
                    Err(error) => {
                        // Arbiter down: deliver the better-scoring candidate
                        warn!(
                            "Arbiter '{}' failed ({}), delivering best committee candidate",
                            self.config.arbiter_engine, error
                        );
                        let verdict_a = self.gate.score(&segment.source_text, &a);
                        let verdict_b = self.gate.score(&segment.source_text, &b);
                        let (text, best) = if verdict_a.score >= verdict_b.score {
                            (a, verdict_a)
                        } else {
                            (b, verdict_b)
                        };
                        self.metrics.record_score(best.score);
                        let mut reasons = extra_reasons;
                        reasons.push(format!("arbiter unavailable: {}", error));
                        self.deliver(segment.index, text, best, ItemOutcome::Repaired, trace, reasons)
                    }
                }
            }
            (Ok(only), Err(error)) | (Err(error), Ok(only)) => {
                // One committee member down: degrade to its candidate
                warn!(
                    "Committee member failed ({}), delivering surviving candidate",
                    error
                );
                let surviving_verdict = self.gate.score(&segment.source_text, &only);
                self.metrics.record_score(surviving_verdict.score);
                let mut reasons = extra_reasons;
                reasons.push(format!("committee member unavailable: {}", error));
                self.deliver(
                    segment.index,
                    only,
                    surviving_verdict,
                    ItemOutcome::Repaired,
                    trace,
                    reasons,
                )
            }
            (Err(error), Err(_)) => {
                self.fail(segment.index, draft, verdict, error, trace, extra_reasons)
            }
        }
    }

    /// Dispatch one single-segment prompt and sanitize the candidate.
    async fn call_for_candidate(
        &self,
        engine: &str,
        prompt: &RenderedPrompt,
        segment: &Segment,
        language: &LanguageHint,
    ) -> Result<(String, bool), EngineError> {
        let base = self
            .dispatcher
            .adapter()
            .base_temperature(engine)
            .unwrap_or(0.3);
        let outcome = self
            .dispatcher
            .dispatch(engine, prompt, Some(base * ESCALATION_TEMPERATURE_SCALE))
            .await?;

        let parsed = ResponseParser::parse(&outcome.response.text, 1);
        let raw = parsed.items.into_iter().next().unwrap_or_default();
        let candidate = self
            .sanitizer
            .sanitize(&segment.source_text, &raw, language);
        Ok((candidate, outcome.fell_back))
    }

    /// Terminal success: {Accepted | Repaired | CommitteeFinalized} -> Delivered.
    fn deliver(
        &self,
        index: usize,
        target_text: String,
        verdict: QualityVerdict,
        outcome: ItemOutcome,
        trace: Vec<EscalationRecord>,
        extra_reasons: Vec<String>,
    ) -> TranslationResult {
        self.metrics.record_outcome(outcome);
        let mut reasons = verdict.reasons;
        reasons.extend(extra_reasons);
        TranslationResult {
            index,
            target_text,
            quality_score: verdict.score,
            reasons,
            outcome,
            escalation_trace: trace,
        }
    }

    /// Terminal failure: the draft is kept as best effort, the last
    /// classified error attached.
    fn fail(
        &self,
        index: usize,
        draft: String,
        verdict: QualityVerdict,
        error: EngineError,
        trace: Vec<EscalationRecord>,
        extra_reasons: Vec<String>,
    ) -> TranslationResult {
        warn!("Segment {} failed all escalation paths: {}", index, error);
        self.metrics.record_outcome(ItemOutcome::Failed);
        let mut reasons = verdict.reasons;
        reasons.extend(extra_reasons);
        reasons.push(format!("escalation failed: {}", error));
        TranslationResult {
            index,
            target_text: draft,
            quality_score: verdict.score,
            reasons,
            outcome: ItemOutcome::Failed,
            escalation_trace: trace,
        }
    }

    fn fallback_name(&self) -> &str {
        self.dispatcher.adapter().registry().fallback_name()
    }
}
