/*!
 * Tests for the escalation orchestrator state machine
 */

use std::sync::Arc;

use lingorelay::engines::mock::{MockEngine, ScriptedReply};
use lingorelay::engines::EngineRegistry;
use lingorelay::language_utils::LanguageHint;
use lingorelay::metrics::PipelineMetrics;
use lingorelay::pipeline::{EscalationConfig, EscalationOrchestrator};
use lingorelay::dispatch::{EngineAdapter, RetryPolicy, RetryingDispatcher};
use lingorelay::prompts::PromptLibrary;
use lingorelay::sanitize::Sanitizer;
use lingorelay::segment::{ItemOutcome, Segment, StyleParams, TranslationMode};

use crate::common::{delimited_reply, mock_engine_config};

struct Fixture {
    orchestrator: EscalationOrchestrator,
    metrics: Arc<PipelineMetrics>,
    repair: Arc<MockEngine>,
    arbiter_committee: Arc<MockEngine>,
}

/// Build an orchestrator over mock engines.
///
/// "fast" is primary/committee[0], "careful" is repair/committee[1]/arbiter,
/// "stable" is the fallback.
fn fixture(committee: bool, careful_script: Vec<ScriptedReply>) -> Fixture {
    let fast = Arc::new(MockEngine::echo("fast"));
    let careful = Arc::new(MockEngine::scripted("careful", careful_script));
    let stable = Arc::new(MockEngine::echo("stable"));

    let mut registry = EngineRegistry::new("stable");
    registry.register(fast.clone(), &mock_engine_config("fast"));
    registry.register(careful.clone(), &mock_engine_config("careful"));
    registry.register(stable.clone(), &mock_engine_config("stable"));

    let metrics = Arc::new(PipelineMetrics::new());
    let dispatcher = Arc::new(RetryingDispatcher::new(
        EngineAdapter::new(Arc::new(registry)),
        RetryPolicy {
            max_attempts: 1,
            backoff_base: std::time::Duration::from_millis(5),
            backoff_cap: std::time::Duration::from_millis(10),
        },
        "stable",
        metrics.clone(),
    ));

    let orchestrator = EscalationOrchestrator::new(
        dispatcher,
        Arc::new(Sanitizer::standard()),
        Arc::new(PromptLibrary::builtin()),
        EscalationConfig {
            quality_threshold: 0.72,
            committee,
            repair_engine: "careful".to_string(),
            committee_engines: ["fast".to_string(), "careful".to_string()],
            arbiter_engine: "careful".to_string(),
        },
        metrics.clone(),
    );

    Fixture {
        orchestrator,
        metrics,
        repair: careful,
        arbiter_committee: fast,
    }
}

fn style() -> StyleParams {
    StyleParams::new(TranslationMode::Generic, "en")
}

fn english() -> LanguageHint {
    LanguageHint::resolve("en").unwrap()
}

#[tokio::test]
async fn test_finalize_withGoodDraft_shouldAcceptWithoutEscalation() {
    let fx = fixture(false, vec![]);
    let segment = Segment::new(0, "5 ships left.");

    let result = fx
        .orchestrator
        .finalize_item(
            &segment,
            &style(),
            &english(),
            "5 ships departed.".to_string(),
            "fast",
            vec![],
            vec![],
        )
        .await;

    assert_eq!(result.outcome, ItemOutcome::Accepted);
    assert!(result.quality_score >= 0.72);
    assert!(result.escalation_trace.is_empty());
    assert_eq!(fx.repair.call_count(), 0);
    assert_eq!(fx.metrics.snapshot().accepted, 1);
}

/// A low-quality draft triggers the single-shot repair path against the
/// secondary engine, and the repaired text is delivered.
#[tokio::test]
async fn test_finalize_withLowQualityDraft_shouldRepairViaSecondaryEngine() {
    let fx = fixture(
        false,
        vec![ScriptedReply::Text(delimited_reply(&["2 apples?"]))],
    );
    let segment = Segment::new(0, "2 apples?");

    let result = fx
        .orchestrator
        .finalize_item(
            &segment,
            &style(),
            &english(),
            // Numeric + question drift: 0.55, below the 0.72 threshold
            "two apples".to_string(),
            "fast",
            vec![],
            vec![],
        )
        .await;

    assert_eq!(result.outcome, ItemOutcome::Repaired);
    assert_eq!(result.target_text, "2 apples?");
    assert_eq!(fx.repair.call_count(), 1);
    assert_eq!(result.escalation_trace.len(), 1);
    assert_eq!(result.escalation_trace[0].from_engine, "fast");
    assert_eq!(result.escalation_trace[0].to_engine, "careful");

    let snapshot = fx.metrics.snapshot();
    assert_eq!(snapshot.repaired, 1);
    assert_eq!(snapshot.escalations.len(), 1);
    assert_eq!(snapshot.escalations[0].reason, "low_quality");
}

/// Repair engine dead (permanent error, fallback also unavailable):
/// the item fails carrying the draft and the classified error.
#[tokio::test]
async fn test_finalize_withRepairFailure_shouldDeliverFailedSentinel() {
    let fx = fixture(false, vec![ScriptedReply::Permanent]);
    let segment = Segment::new(3, "2 apples?");

    let result = fx
        .orchestrator
        .finalize_item(
            &segment,
            &style(),
            &english(),
            "two apples".to_string(),
            "fast",
            vec![],
            vec![],
        )
        .await;

    assert_eq!(result.outcome, ItemOutcome::Failed);
    assert_eq!(result.index, 3);
    // Best-effort draft survives alongside the failure marker
    assert_eq!(result.target_text, "two apples");
    assert!(result
        .reasons
        .iter()
        .any(|r| r.contains("escalation failed")));
    assert_eq!(fx.metrics.snapshot().failed, 1);
}

/// Committee path: both engines consulted concurrently, arbiter output
/// delivered as CommitteeFinalized.
#[tokio::test]
async fn test_finalize_withCommittee_shouldSynthesizeViaArbiter() {
    // "careful" serves committee[1] first, then the arbiter call
    let fx = fixture(
        true,
        vec![
            ScriptedReply::Text(delimited_reply(&["candidate B"])),
            ScriptedReply::Text(delimited_reply(&["2 apples?"])),
        ],
    );
    let segment = Segment::new(0, "2 apples?");

    let result = fx
        .orchestrator
        .finalize_item(
            &segment,
            &style(),
            &english(),
            "two apples".to_string(),
            "fast",
            vec![],
            vec![],
        )
        .await;

    assert_eq!(result.outcome, ItemOutcome::CommitteeFinalized);
    assert_eq!(result.target_text, "2 apples?");
    // committee[0] echo engine served one committee call
    assert_eq!(fx.arbiter_committee.call_count(), 1);
    // committee[1] + arbiter
    assert_eq!(fx.repair.call_count(), 2);

    let snapshot = fx.metrics.snapshot();
    assert_eq!(snapshot.committee_finalized, 1);
    assert!(snapshot
        .escalations
        .iter()
        .any(|e| e.reason == "arbitration"));
}

/// Arbiter down: the better-scoring committee candidate is delivered as a
/// repair instead of failing the item.
#[tokio::test]
async fn test_finalize_withArbiterDown_shouldDeliverBestCommitteeCandidate() {
    let fx = fixture(
        true,
        vec![
            // committee[1] candidate preserves the numerals and question
            ScriptedReply::Text(delimited_reply(&["2 apples?"])),
            // arbiter call fails permanently
            ScriptedReply::Permanent,
        ],
    );
    let segment = Segment::new(0, "2 apples?");

    let result = fx
        .orchestrator
        .finalize_item(
            &segment,
            &style(),
            &english(),
            "two apples".to_string(),
            "fast",
            vec![],
            vec![],
        )
        .await;

    assert_eq!(result.outcome, ItemOutcome::Repaired);
    assert_eq!(result.target_text, "2 apples?");
    assert!(result
        .reasons
        .iter()
        .any(|r| r.contains("arbiter unavailable")));
}
