/*!
 * Tests for order-preserving result assembly
 */

use lingorelay::pipeline::worker_pool::BatchOutcome;
use lingorelay::pipeline::ResultAssembler;
use lingorelay::segment::{ItemOutcome, TranslationResult};

fn result(index: usize, text: &str) -> TranslationResult {
    TranslationResult {
        index,
        target_text: text.to_string(),
        quality_score: 0.95,
        reasons: vec![],
        outcome: ItemOutcome::Accepted,
        escalation_trace: vec![],
    }
}

/// Completion order is irrelevant: output order follows original indices.
#[test]
fn test_assemble_withReversedCompletionOrder_shouldFollowInputIndices() {
    let outcomes = vec![
        BatchOutcome {
            batch_id: 2,
            results: vec![result(4, "e")],
        },
        BatchOutcome {
            batch_id: 0,
            results: vec![result(0, "a"), result(1, "b")],
        },
        BatchOutcome {
            batch_id: 1,
            results: vec![result(2, "c"), result(3, "d")],
        },
    ];

    let assembled = ResultAssembler::assemble(5, outcomes).unwrap();
    assert_eq!(
        ResultAssembler::output_texts(&assembled),
        vec!["a", "b", "c", "d", "e"]
    );
}

#[test]
fn test_assemble_withFailedItems_shouldKeepTheirSlots() {
    let mut failed = result(1, "");
    failed.outcome = ItemOutcome::Failed;
    failed.reasons.push("batch dispatch failed".to_string());

    let outcomes = vec![BatchOutcome {
        batch_id: 0,
        results: vec![result(0, "ok"), failed, result(2, "ok")],
    }];

    let assembled = ResultAssembler::assemble(3, outcomes).unwrap();
    assert_eq!(assembled.len(), 3);
    assert_eq!(assembled[1].outcome, ItemOutcome::Failed);
    assert_eq!(assembled[1].target_text, "");
}

#[test]
fn test_assemble_withTooFewResults_shouldError() {
    let outcomes = vec![BatchOutcome {
        batch_id: 0,
        results: vec![result(0, "a")],
    }];
    assert!(ResultAssembler::assemble(2, outcomes).is_err());
}

#[test]
fn test_assemble_withDuplicateIndex_shouldError() {
    let outcomes = vec![BatchOutcome {
        batch_id: 0,
        results: vec![result(0, "a"), result(0, "a again"), result(2, "c")],
    }];
    assert!(ResultAssembler::assemble(3, outcomes).is_err());
}
