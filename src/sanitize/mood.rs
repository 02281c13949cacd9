/*!
 * Mood stabilization (English-only backstop).
 *
 * Rephrasing engines occasionally turn a declarative source into a
 * question ("You are ready." comes back as "Are you ready?"). When the
 * source line asks nothing (no question mark, no WH-word) but the
 * candidate leads with an inverted auxiliary-subject form and trails a
 * question mark, the inversion is undone and the line closed as a
 * declarative. Genuine questions are never touched.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use super::SanitizePass;
use crate::language_utils::LanguageHint;

/// WH-question tokens marking the source as interrogative.
static WH_TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(what|where|when|why|who|whom|whose|which|how)\b")
        .expect("Invalid WH token regex")
});

/// Inverted auxiliary-subject question form with a pronoun subject.
static INVERTED_QUESTION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        ^(?P<prefix>\s*(?:-\s*)?)
        (?P<aux>(?i:do|does|did|am|are|is|was|were|can|could|will|would|shall|should|have|has|had|may|might|must))
        \s+
        (?P<subject>(?i:i|you|he|she|it|we|they))
        \s+
        (?P<rest>.+?)
        \s*\?+\s*$",
    )
    .expect("Invalid inverted question regex")
});

/// Pass un-inverting spurious question forms.
pub struct MoodPass;

impl SanitizePass for MoodPass {
    fn name(&self) -> &'static str {
        "mood"
    }

    fn apply(
        &self,
        source_lines: &[&str],
        candidate_lines: Vec<String>,
        language: &LanguageHint,
    ) -> Vec<String> {
        if !language.english_family {
            return candidate_lines;
        }

        candidate_lines
            .into_iter()
            .enumerate()
            .map(|(i, line)| match source_lines.get(i) {
                Some(source) if !is_question(source) => uninvert(line),
                _ => line,
            })
            .collect()
    }
}

/// Whether a source line reads as a question.
fn is_question(line: &str) -> bool {
    line.contains('?') || WH_TOKEN_REGEX.is_match(line)
}

/// Rewrite an inverted question form back to a declarative.
fn uninvert(line: String) -> String {
    let Some(caps) = INVERTED_QUESTION_REGEX.captures(&line) else {
        return line;
    };

    let prefix = &caps["prefix"];
    let aux = caps["aux"].to_lowercase();
    let subject = capitalize(&caps["subject"]);
    let rest = &caps["rest"];

    // Do-support carries no meaning in the declarative; drop it
    let body = if matches!(aux.as_str(), "do" | "does" | "did") {
        format!("{} {}", subject, rest)
    } else {
        format!("{} {} {}", subject, aux, rest)
    };

    format!("{}{}.", prefix, body)
}

/// Uppercase the first character of a word ("i" becomes "I").
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
