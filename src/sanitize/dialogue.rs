/*!
 * Dash-line dialogue structure enforcement.
 *
 * Subtitle and dialogue sources mark multiple speakers inside one segment
 * with a leading dash per line. Engines routinely merge those lines into
 * one sentence, or sprinkle bullet markers over plain text. When the
 * source uses the convention (two or more dash lines), the candidate is
 * forced back to exactly that many dash-prefixed lines, resplitting on
 * sentence boundaries or hyphen separators as needed. Otherwise incidental
 * list markers are stripped.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use super::SanitizePass;
use crate::language_utils::LanguageHint;

/// Leading dash/bullet markers considered incidental outside the
/// multi-speaker convention.
static LEADING_MARKER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([-–•*]\s+)").expect("Invalid leading marker regex"));

/// Leading dash of a speaker line.
static SPEAKER_DASH_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*-\s*").expect("Invalid speaker dash regex"));

/// Mid-line hyphen separator (" - ") used when engines chain speakers.
static HYPHEN_SEPARATOR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+-\s+").expect("Invalid hyphen separator regex"));

/// Pass forcing candidate dash-line structure to match the source.
pub struct DialoguePass;

impl SanitizePass for DialoguePass {
    fn name(&self) -> &'static str {
        "dialogue"
    }

    fn apply(
        &self,
        source_lines: &[&str],
        candidate_lines: Vec<String>,
        _language: &LanguageHint,
    ) -> Vec<String> {
        let source_dash_count = source_lines
            .iter()
            .filter(|l| SPEAKER_DASH_REGEX.is_match(l))
            .count();

        if source_dash_count >= 2 {
            force_dash_lines(candidate_lines, source_dash_count)
        } else {
            strip_incidental_markers(candidate_lines)
        }
    }
}

/// Strip bullet/dash markers the engine introduced on its own.
fn strip_incidental_markers(lines: Vec<String>) -> Vec<String> {
    lines
        .into_iter()
        .map(|line| LEADING_MARKER_REGEX.replace(&line, "").into_owned())
        .collect()
}

/// Force the candidate into exactly `target` dash-prefixed lines.
fn force_dash_lines(candidate_lines: Vec<String>, target: usize) -> Vec<String> {
    let existing_dash_count = candidate_lines
        .iter()
        .filter(|l| SPEAKER_DASH_REGEX.is_match(l))
        .count();

    // Count already right: just normalize the dash prefix per line
    if candidate_lines.len() == target && existing_dash_count == target {
        return candidate_lines
            .iter()
            .map(|l| prefix_dash(SPEAKER_DASH_REGEX.replace(l, "").trim()))
            .collect();
    }

    // Merge everything back into one stream and resplit
    let merged = candidate_lines
        .iter()
        .map(|l| SPEAKER_DASH_REGEX.replace(l, "").trim().to_string())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    // Strategy 1: hyphen separators left over from a merged speaker chain
    let parts: Vec<String> = HYPHEN_SEPARATOR_REGEX
        .split(&merged)
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() == target {
        return parts.iter().map(|p| prefix_dash(p)).collect();
    }

    // Strategy 2: sentence boundaries
    let sentences = split_sentences(&merged);
    if sentences.len() == target {
        return sentences.iter().map(|s| prefix_dash(s)).collect();
    }
    if sentences.len() > target {
        // Keep the first target-1 sentences, merge the tail into the last line
        let mut lines: Vec<String> = sentences[..target - 1]
            .iter()
            .map(|s| prefix_dash(s))
            .collect();
        lines.push(prefix_dash(&sentences[target - 1..].join(" ")));
        return lines;
    }

    // Exhausted: merged text goes into line 0, pad the rest with bare dashes
    let mut lines = Vec::with_capacity(target);
    lines.push(prefix_dash(&merged));
    while lines.len() < target {
        lines.push("-".to_string());
    }
    lines
}

/// Prefix a line with the speaker dash.
fn prefix_dash(text: &str) -> String {
    if text.is_empty() {
        "-".to_string()
    } else {
        format!("- {}", text)
    }
}

/// Split a text into sentences after terminal punctuation runs.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if matches!(c, '.' | '!' | '?' | '…') {
            // Consume the rest of a punctuation run ("?!", "...")
            while let Some(&next) = chars.peek() {
                if matches!(next, '.' | '!' | '?' | '…') {
                    current.push(next);
                    chars.next();
                } else {
                    break;
                }
            }
            if chars.peek().is_none_or(|next| next.is_whitespace()) {
                let sentence = current.trim().to_string();
                if !sentence.is_empty() {
                    sentences.push(sentence);
                }
                current.clear();
            }
        }
    }

    let tail = current.trim().to_string();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}
