/*!
 * Capitalization continuity across lines.
 *
 * A line that follows terminal punctuation starts a new sentence and must
 * start with a capital; a line continuing an unfinished sentence must be
 * left alone. Engines get this wrong in both directions after resplitting.
 */

use super::{SanitizePass, ends_with_terminal_punctuation};
use crate::language_utils::LanguageHint;

/// Pass capitalizing sentence-initial lines.
pub struct CapitalizationPass;

impl SanitizePass for CapitalizationPass {
    fn name(&self) -> &'static str {
        "capitalization"
    }

    fn apply(
        &self,
        _source_lines: &[&str],
        mut candidate_lines: Vec<String>,
        _language: &LanguageHint,
    ) -> Vec<String> {
        for i in 1..candidate_lines.len() {
            if ends_with_terminal_punctuation(&candidate_lines[i - 1]) {
                candidate_lines[i] = capitalize_first_letter(&candidate_lines[i]);
            }
        }
        candidate_lines
    }
}

/// Uppercase the first alphabetic character, skipping dashes and quotes.
fn capitalize_first_letter(line: &str) -> String {
    let mut result = String::with_capacity(line.len());
    let mut done = false;

    for c in line.chars() {
        if !done && c.is_alphabetic() {
            result.extend(c.to_uppercase());
            done = true;
        } else {
            result.push(c);
        }
    }
    result
}
