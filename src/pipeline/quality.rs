/*!
 * Heuristic quality scoring over (source, candidate) pairs.
 *
 * A cheap structural proxy, not a semantic similarity model: it catches
 * gross drift (lost numerals, dropped questions, normalized ellipses)
 * cheaply enough to run on every item. The threshold decision between
 * accept and escalate belongs to the orchestrator.
 */

use once_cell::sync::Lazy;
use regex::Regex;

/// Starting score before penalties.
const BASE_SCORE: f32 = 0.95;

/// Penalty when source and candidate numeric token counts differ.
const NUMERIC_MISMATCH_PENALTY: f32 = 0.25;

/// Penalty when question mark counts differ.
const QUESTION_MISMATCH_PENALTY: f32 = 0.15;

/// Penalty when the source's ellipsis is lost.
const ELLIPSIS_LOSS_PENALTY: f32 = 0.10;

/// Numeric token matcher (runs of Arabic digits).
static NUMERIC_TOKEN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+").expect("Invalid numeric token regex"));

/// Score plus the reasons behind any penalties.
#[derive(Debug, Clone)]
pub struct QualityVerdict {
    /// Score in [0, 1]
    pub score: f32,

    /// One entry per detected mismatch
    pub reasons: Vec<String>,
}

impl QualityVerdict {
    /// Whether the score clears a threshold.
    pub fn passes(&self, threshold: f32) -> bool {
        self.score >= threshold
    }
}

/// Heuristic scorer deciding accept versus escalate.
#[derive(Debug, Clone, Default)]
pub struct QualityGate;

impl QualityGate {
    /// Create a gate.
    pub fn new() -> Self {
        Self
    }

    /// Score a candidate translation against its source.
    pub fn score(&self, source_text: &str, candidate_text: &str) -> QualityVerdict {
        let mut score = BASE_SCORE;
        let mut reasons = Vec::new();

        let source_numerics = NUMERIC_TOKEN_REGEX.find_iter(source_text).count();
        let candidate_numerics = NUMERIC_TOKEN_REGEX.find_iter(candidate_text).count();
        if source_numerics != candidate_numerics {
            score -= NUMERIC_MISMATCH_PENALTY;
            reasons.push(format!(
                "numeric token count mismatch: source {}, candidate {}",
                source_numerics, candidate_numerics
            ));
        }

        let source_questions = source_text.matches('?').count();
        let candidate_questions = candidate_text.matches('?').count();
        if source_questions != candidate_questions {
            score -= QUESTION_MISMATCH_PENALTY;
            reasons.push(format!(
                "question mark count mismatch: source {}, candidate {}",
                source_questions, candidate_questions
            ));
        }

        if has_ellipsis(source_text) && !has_ellipsis(candidate_text) {
            score -= ELLIPSIS_LOSS_PENALTY;
            reasons.push("ellipsis present in source lost in candidate".to_string());
        }

        QualityVerdict {
            score: score.clamp(0.0, 1.0),
            reasons,
        }
    }
}

/// Whether a text contains an ellipsis in either spelling.
fn has_ellipsis(text: &str) -> bool {
    text.contains("...") || text.contains('…')
}
