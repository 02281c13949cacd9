/*!
 * Invariant-enforcing sanitization of engine output.
 *
 * Remote engines are not trusted to preserve structural properties of the
 * source: dialogue line counts, capitalization continuity, numerals,
 * sentence mood and trailing ellipses all drift. This module formalizes
 * the cleanup as an ordered pipeline of pure line-array transforms:
 *
 * 1. `dialogue` — dash-line structure (may restructure candidate lines to
 *    match the source's dash-line count)
 * 2. `capitalization` — capitalize after terminal punctuation
 * 3. `numerals` — rewrite spelled-out numbers back to digits (English)
 * 4. `mood` — un-invert question forms the source never asked (English)
 * 5. `ellipsis` — restore trailing ellipses and exclamations
 *
 * Passes 2-5 operate strictly line-by-line against the source and never
 * change the candidate's line count.
 */

pub mod capitalization;
pub mod dialogue;
pub mod ellipsis;
pub mod mood;
pub mod numerals;

use crate::language_utils::LanguageHint;

/// One pure transform over aligned source/candidate line arrays.
pub trait SanitizePass: Send + Sync {
    /// Pass name for logs and traces
    fn name(&self) -> &'static str;

    /// Transform candidate lines given the aligned source lines.
    fn apply(
        &self,
        source_lines: &[&str],
        candidate_lines: Vec<String>,
        language: &LanguageHint,
    ) -> Vec<String>;
}

/// Fixed, ordered sanitization pipeline.
pub struct Sanitizer {
    passes: Vec<Box<dyn SanitizePass>>,
}

impl Sanitizer {
    /// The standard pass order.
    pub fn standard() -> Self {
        Self {
            passes: vec![
                Box::new(dialogue::DialoguePass),
                Box::new(capitalization::CapitalizationPass),
                Box::new(numerals::NumeralPass),
                Box::new(mood::MoodPass),
                Box::new(ellipsis::EllipsisPass),
            ],
        }
    }

    /// Build a pipeline from explicit passes, mostly for tests.
    pub fn with_passes(passes: Vec<Box<dyn SanitizePass>>) -> Self {
        Self { passes }
    }

    /// Run every pass over a candidate text, aligned with its source.
    pub fn sanitize(&self, source_text: &str, candidate_text: &str, language: &LanguageHint) -> String {
        let source_lines: Vec<&str> = source_text.lines().collect();
        let mut candidate_lines: Vec<String> =
            candidate_text.lines().map(|l| l.to_string()).collect();

        for pass in &self.passes {
            candidate_lines = pass.apply(&source_lines, candidate_lines, language);
        }

        candidate_lines.join("\n")
    }
}

/// Whether a line ends with terminal punctuation (including ellipses).
pub(crate) fn ends_with_terminal_punctuation(line: &str) -> bool {
    let trimmed = line.trim_end();
    trimmed.ends_with('.')
        || trimmed.ends_with('!')
        || trimmed.ends_with('?')
        || trimmed.ends_with('…')
}
