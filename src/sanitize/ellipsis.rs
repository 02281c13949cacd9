/*!
 * Trailing ellipsis and exclamation restoration.
 *
 * Engines normalize expressive trailing punctuation away: "Blood..."
 * comes back as "Blood." and "Run!" as "Run.". The implied suspense or
 * urgency is part of the source meaning, so a candidate that demoted the
 * source's trailing ellipsis or exclamation to a plain period gets it
 * restored, line by line.
 */

use super::SanitizePass;
use crate::language_utils::LanguageHint;

/// Pass restoring trailing ellipses and exclamations.
pub struct EllipsisPass;

impl SanitizePass for EllipsisPass {
    fn name(&self) -> &'static str {
        "ellipsis"
    }

    fn apply(
        &self,
        source_lines: &[&str],
        candidate_lines: Vec<String>,
        _language: &LanguageHint,
    ) -> Vec<String> {
        candidate_lines
            .into_iter()
            .enumerate()
            .map(|(i, line)| match source_lines.get(i) {
                Some(source) => restore_trailing(source, line),
                None => line,
            })
            .collect()
    }
}

/// Restore the source's trailing ellipsis or exclamation onto a candidate
/// that demoted it to a single period.
fn restore_trailing(source_line: &str, candidate_line: String) -> String {
    let source_trimmed = source_line.trim_end();
    let candidate_trimmed = candidate_line.trim_end();

    if !ends_with_single_period(candidate_trimmed) {
        return candidate_line;
    }

    if source_trimmed.ends_with("...") {
        return format!("{}...", candidate_trimmed.trim_end_matches('.'));
    }
    if source_trimmed.ends_with('…') {
        return format!("{}…", candidate_trimmed.trim_end_matches('.'));
    }
    if source_trimmed.ends_with('!') {
        return format!("{}!", candidate_trimmed.trim_end_matches('.'));
    }

    candidate_line
}

/// Whether a line ends with exactly one period (not an ellipsis).
fn ends_with_single_period(line: &str) -> bool {
    line.ends_with('.') && !line.ends_with("..")
}
