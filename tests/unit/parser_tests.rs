/*!
 * Tests for strict-then-lenient response parsing
 */

use lingorelay::pipeline::parser::ResponseParser;
use lingorelay::prompts::{RESULT_BEGIN, RESULT_END};

/// Chatter around a two-item array with three expected items: sliced,
/// parsed and padded without throwing.
#[test]
fn test_parse_withChatterAndShortArray_shouldSliceAndPad() {
    let parsed = ResponseParser::parse("Sure! [\"a\",\"b\"] done", 3);
    assert_eq!(parsed.items, vec!["a", "b", ""]);
    assert!(parsed.was_repaired);
}

#[test]
fn test_parse_withDelimitedPayload_shouldIgnoreSurroundingProse() {
    let raw = format!(
        "Here are your translations:\n{}\n[\"bonjour\", \"merci\"]\n{}\nLet me know!",
        RESULT_BEGIN, RESULT_END
    );
    let parsed = ResponseParser::parse(&raw, 2);
    assert_eq!(parsed.items, vec!["bonjour", "merci"]);
    assert!(!parsed.was_repaired);
}

#[test]
fn test_parse_withFencedPayload_shouldStripFences() {
    let raw = format!("{}\n```json\n[\"hola\"]\n```\n{}", RESULT_BEGIN, RESULT_END);
    let parsed = ResponseParser::parse(&raw, 1);
    assert_eq!(parsed.items, vec!["hola"]);
}

#[test]
fn test_parse_withTooManyItems_shouldTruncateAndFlag() {
    let parsed = ResponseParser::parse("[\"a\", \"b\", \"c\", \"d\"]", 2);
    assert_eq!(parsed.items, vec!["a", "b"]);
    assert!(parsed.was_repaired);
}

#[test]
fn test_parse_withPlainLines_shouldFallBackToLineSplit() {
    let parsed = ResponseParser::parse("premiere ligne\n\ndeuxieme ligne", 2);
    assert_eq!(parsed.items, vec!["premiere ligne", "deuxieme ligne"]);
    assert!(parsed.was_repaired);
}

#[test]
fn test_parse_withGarbage_shouldNeverPanicAndPadToLength() {
    for garbage in ["", "{{{", "[unclosed", "null", "12345"] {
        let parsed = ResponseParser::parse(garbage, 3);
        assert_eq!(parsed.items.len(), 3, "input: {:?}", garbage);
    }
}

#[test]
fn test_parse_withEscapedQuotesInItems_shouldParseStrictly() {
    let raw = format!(r#"{}["il a dit \"non\""]{}"#, RESULT_BEGIN, RESULT_END);
    let parsed = ResponseParser::parse(&raw, 1);
    assert_eq!(parsed.items, vec![r#"il a dit "non""#]);
    assert!(!parsed.was_repaired);
}

#[test]
fn test_parse_withZeroExpected_shouldReturnEmpty() {
    let parsed = ResponseParser::parse("anything at all", 0);
    assert!(parsed.items.is_empty());
}
