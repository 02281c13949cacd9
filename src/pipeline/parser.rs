/*!
 * Strict-then-lenient parsing of engine responses.
 *
 * Engines are asked for a JSON array of strings between result delimiters,
 * but real responses arrive with chatter, code fences, or a mangled array.
 * The parser extracts the most plausible payload, falls back to line
 * splitting, and pads or truncates so the output length always equals the
 * expected item count. It never fails on malformed input; repairs are
 * reported through the `was_repaired` flag.
 */

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::prompts::{RESULT_BEGIN, RESULT_END};

/// Code-fence markers the engines like to wrap payloads in.
static CODE_FENCE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"```[a-zA-Z]*\n?").expect("Invalid code fence regex")
});

/// Parsed payload plus whether any repair was needed to produce it.
#[derive(Debug, Clone)]
pub struct ParsedPayload {
    /// Exactly `expected_len` items
    pub items: Vec<String>,

    /// True when the strict parse failed or the item count was wrong
    pub was_repaired: bool,
}

/// Parser for delimited structured engine responses.
pub struct ResponseParser;

impl ResponseParser {
    /// Parse raw engine text into exactly `expected_len` items.
    pub fn parse(raw_text: &str, expected_len: usize) -> ParsedPayload {
        let mut was_repaired = false;

        // 1. Slice to the delimited payload when the markers survived
        let delimited = Self::extract_delimited(raw_text);
        if delimited.is_none() && raw_text.contains(RESULT_BEGIN) {
            // Begin marker without end marker: truncated response
            was_repaired = true;
        }
        let payload = delimited.unwrap_or(raw_text);

        // 2. Strip incidental code fences
        let cleaned = CODE_FENCE_REGEX.replace_all(payload, "");

        // 3. Slice to the bracketed array substring, if one exists
        let sliced = Self::slice_to_array(&cleaned);

        // 4. Strict structured parse
        let mut items = match serde_json::from_str::<Vec<String>>(sliced) {
            Ok(items) => items,
            Err(_) => {
                // 5. Lenient fallback: split on line breaks
                was_repaired = true;
                Self::split_lines(&cleaned)
            }
        };

        // Force the 1:1 index contract: truncate extras, pad missing
        if items.len() != expected_len {
            if items.len() > expected_len {
                warn!(
                    "Engine returned {} items, expected {}; truncating",
                    items.len(),
                    expected_len
                );
                items.truncate(expected_len);
            } else {
                warn!(
                    "Engine returned {} items, expected {}; padding with empty strings",
                    items.len(),
                    expected_len
                );
                items.resize(expected_len, String::new());
            }
            was_repaired = true;
        }

        ParsedPayload {
            items,
            was_repaired,
        }
    }

    /// Extract the text between the result delimiters, if both are present
    /// in order.
    fn extract_delimited(text: &str) -> Option<&str> {
        let start = text.find(RESULT_BEGIN)? + RESULT_BEGIN.len();
        let end = text[start..].find(RESULT_END)? + start;
        Some(&text[start..end])
    }

    /// Slice to the outermost bracketed substring, if any.
    fn slice_to_array(text: &str) -> &str {
        match (text.find('['), text.rfind(']')) {
            (Some(start), Some(end)) if start < end => &text[start..=end],
            _ => text,
        }
    }

    /// Split on line breaks, dropping empty lines and stray brackets.
    fn split_lines(text: &str) -> Vec<String> {
        text.lines()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty() && *line != "[" && *line != "]")
            .map(|line| {
                // Strip residual JSON list syntax from the line form
                line.trim_end_matches(',')
                    .trim_matches('"')
                    .to_string()
            })
            .filter(|line| !line.is_empty())
            .collect()
    }
}
