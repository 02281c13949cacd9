/*!
 * Tests for the heuristic quality gate
 */

use lingorelay::pipeline::quality::QualityGate;

/// Numeric-token and question-mark mismatches stack: 0.95 - 0.25 - 0.15.
#[test]
fn test_score_withNumericAndQuestionMismatch_shouldScoreBelowThreshold() {
    let gate = QualityGate::new();
    let verdict = gate.score("2 apples?", "two apples");

    assert!((verdict.score - 0.55).abs() < 1e-6);
    assert_eq!(verdict.reasons.len(), 2);
    assert!(!verdict.passes(0.72));
}

#[test]
fn test_score_withMatchingStructure_shouldPassDefaultThreshold() {
    let gate = QualityGate::new();
    let verdict = gate.score(
        "The 3 ships arrived at dawn. Did you see them?",
        "Les 3 navires sont arrives a l'aube. Les as-tu vus ?",
    );
    assert!(verdict.passes(0.72));
    assert!(verdict.reasons.is_empty());
}

#[test]
fn test_score_withLostEllipsis_shouldSubtractTenth() {
    let gate = QualityGate::new();
    let verdict = gate.score("And then...", "Et puis.");
    assert!((verdict.score - 0.85).abs() < 1e-6);
    assert_eq!(verdict.reasons.len(), 1);
}

#[test]
fn test_score_withAddedEllipsis_shouldNotPenalize() {
    // Only ellipses lost from the source are penalized
    let gate = QualityGate::new();
    let verdict = gate.score("And then.", "Et puis...");
    assert!(verdict.reasons.is_empty());
}

#[test]
fn test_score_isAlwaysWithinUnitInterval() {
    let gate = QualityGate::new();
    for (source, candidate) in [
        ("", ""),
        ("1 2 3 4 5???...", "rien"),
        ("plain text", "plain text"),
    ] {
        let verdict = gate.score(source, candidate);
        assert!(
            (0.0..=1.0).contains(&verdict.score),
            "score {} out of range for {:?}",
            verdict.score,
            source
        );
    }
}

#[test]
fn test_score_countsNumericRuns_notDigits() {
    let gate = QualityGate::new();
    // "42" is one numeric token on both sides
    let verdict = gate.score("42 men", "42 hommes");
    assert!(verdict.reasons.is_empty());

    // "4 2" is two tokens against one
    let verdict = gate.score("4 2 men", "42 hommes");
    assert_eq!(verdict.reasons.len(), 1);
}
