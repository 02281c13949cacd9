/*!
 * Tests for the ordered invariant sanitizer
 */

use lingorelay::language_utils::LanguageHint;
use lingorelay::sanitize::Sanitizer;

fn english() -> LanguageHint {
    LanguageHint::resolve("en").unwrap()
}

fn spanish() -> LanguageHint {
    LanguageHint::resolve("es").unwrap()
}

/// A two-dash-line source whose candidate was merged into one line must
/// come back as exactly two dash-prefixed lines.
#[test]
fn test_sanitize_withMergedDashDialogue_shouldResplitIntoTwoDashLines() {
    let sanitizer = Sanitizer::standard();
    let source = "- Let me go!\n- No, no, no.";
    let candidate = "Let me go! No, no, no.";

    let result = sanitizer.sanitize(source, candidate, &english());
    let lines: Vec<&str> = result.lines().collect();

    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("- "));
    assert!(lines[1].starts_with("- "));
    assert_eq!(result, "- Let me go!\n- No, no, no.");
}

/// A trailing ellipsis lost to normalization is restored.
#[test]
fn test_sanitize_withLostTrailingEllipsis_shouldRestoreIt() {
    let sanitizer = Sanitizer::standard();
    let result = sanitizer.sanitize("Blood...", "Blood.", &english());
    assert_eq!(result, "Blood...");
}

#[test]
fn test_sanitize_withIncidentalBullets_shouldStripThem() {
    let sanitizer = Sanitizer::standard();
    let source = "First point\nSecond point";
    let candidate = "- Premier point\n- Deuxieme point";

    let result = sanitizer.sanitize(source, candidate, &spanish());
    assert_eq!(result, "Premier point\nDeuxieme point");
}

#[test]
fn test_sanitize_withLowercaseAfterSentenceEnd_shouldCapitalize() {
    let sanitizer = Sanitizer::standard();
    let source = "It ended.\nNobody spoke.";
    let candidate = "Tout etait fini.\npersonne ne parlait.";

    let result = sanitizer.sanitize(source, candidate, &spanish());
    assert_eq!(result, "Tout etait fini.\nPersonne ne parlait.");
}

#[test]
fn test_sanitize_withSpelledNumberInEnglishTarget_shouldRestoreDigits() {
    let sanitizer = Sanitizer::standard();
    let result = sanitizer.sanitize("Il a 3 chiens.", "He has three dogs.", &english());
    assert_eq!(result, "He has 3 dogs.");
}

#[test]
fn test_sanitize_withSpuriousQuestionForm_shouldUninvert() {
    let sanitizer = Sanitizer::standard();
    let result = sanitizer.sanitize("Tu es fatigue.", "Are you tired?", &english());
    assert_eq!(result, "You are tired.");
}

#[test]
fn test_sanitize_withGenuineQuestion_shouldPreserveIt() {
    let sanitizer = Sanitizer::standard();
    let result = sanitizer.sanitize("Es-tu fatigue ?", "Are you tired?", &english());
    assert_eq!(result, "Are you tired?");
}

/// Line-aligned passes must never change the candidate's line count.
#[test]
fn test_sanitize_shouldPreserveLineCountOutsideDialogueRestructuring() {
    let sanitizer = Sanitizer::standard();
    let source = "One.\nTwo.\nThree.";
    let candidate = "Un.\ndeux.\ntrois.";

    let result = sanitizer.sanitize(source, candidate, &spanish());
    assert_eq!(result.lines().count(), 3);
}

/// Three-speaker merged candidate that only splits into fewer sentences
/// falls back to the merged-line-plus-padding shape.
#[test]
fn test_sanitize_withThreeSpeakersAndUnsplittableCandidate_shouldPad() {
    let sanitizer = Sanitizer::standard();
    let source = "- Go!\n- Stay!\n- Why?";
    let candidate = "todo junto sin puntuacion";

    let result = sanitizer.sanitize(source, candidate, &spanish());
    let lines: Vec<&str> = result.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "- todo junto sin puntuacion");
    assert_eq!(lines[1], "-");
    assert_eq!(lines[2], "-");
}
