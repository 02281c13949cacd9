/*!
 * Numeral preservation.
 *
 * Sources that write quantities as digits must keep digits in the output;
 * engines like to spell small numbers out ("2" becomes "two"). For source
 * lines carrying Arabic-digit numbers in the 0-99 range, spelled-out
 * English forms in the candidate are rewritten back to digits. English
 * targets only; other languages pass through untouched.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use super::SanitizePass;
use crate::language_utils::LanguageHint;

static DIGIT_RUN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+").expect("Invalid digit run regex"));

const ONES: [&str; 20] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen",
    "nineteen",
];

const TENS: [&str; 8] = [
    "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];

/// Pass rewriting spelled-out numbers back to digits.
pub struct NumeralPass;

impl SanitizePass for NumeralPass {
    fn name(&self) -> &'static str {
        "numerals"
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
                Some(source) => restore_digits(source, line),
                None => line,
            })
            .collect()
    }
}

/// Rewrite word forms of the source line's numbers back to digits.
fn restore_digits(source_line: &str, mut candidate_line: String) -> String {
    for digit_match in DIGIT_RUN_REGEX.find_iter(source_line) {
        let Ok(number) = digit_match.as_str().parse::<u32>() else {
            continue;
        };
        if number > 99 {
            continue;
        }
        for word in word_forms(number) {
            // Whole-word, case-insensitive; hyphen is part of the word form
            let pattern = format!(r"(?i)\b{}\b", regex::escape(&word));
            let Ok(word_regex) = Regex::new(&pattern) else {
                continue;
            };
            if word_regex.is_match(&candidate_line) {
                candidate_line = word_regex
                    .replace(&candidate_line, number.to_string().as_str())
                    .into_owned();
                break;
            }
        }
    }
    candidate_line
}

/// English word forms of an integer in 0-99, most specific first.
fn word_forms(number: u32) -> Vec<String> {
    if number < 20 {
        return vec![ONES[number as usize].to_string()];
    }
    let tens_word = TENS[(number / 10 - 2) as usize];
    let remainder = number % 10;
    if remainder == 0 {
        vec![tens_word.to_string()]
    } else {
        let ones_word = ONES[remainder as usize];
        vec![
            format!("{}-{}", tens_word, ones_word),
            format!("{} {}", tens_word, ones_word),
        ]
    }
}
