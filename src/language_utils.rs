/*!
 * Language utilities for ISO language code handling.
 *
 * This module provides functions for validating and normalizing ISO 639-1
 * (2-letter) and ISO 639-2 (3-letter) language codes, plus the language
 * hints the sanitizer passes need (notably the English-family check that
 * gates the numeral and mood passes).
 */

use anyhow::{Result, anyhow};
use isolang::Language;

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    let normalized_code = code.trim().to_lowercase();

    // If it's a 2-letter code, convert to 3-letter
    if normalized_code.len() == 2 {
        if let Some(lang) = Language::from_639_1(&normalized_code) {
            return Ok(lang.to_639_3().to_string());
        }
    }
    // If it's already a 3-letter code, ensure it's ISO 639-2/T
    else if normalized_code.len() == 3 {
        if Language::from_639_3(&normalized_code).is_some() {
            return Ok(normalized_code);
        }

        // ISO 639-2/B codes that need converting to ISO 639-2/T
        match normalized_code.as_str() {
            "fre" => return Ok("fra".to_string()),
            "ger" => return Ok("deu".to_string()),
            "dut" => return Ok("nld".to_string()),
            "gre" => return Ok("ell".to_string()),
            "chi" => return Ok("zho".to_string()),
            "cze" => return Ok("ces".to_string()),
            "per" => return Ok("fas".to_string()),
            "rum" => return Ok("ron".to_string()),
            "slo" => return Ok("slk".to_string()),
            _ => {}
        }
    }

    Err(anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Check if two language codes match (represent the same language)
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (normalize_to_part2t(code1), normalize_to_part2t(code2)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized = normalize_to_part2t(code)?;
    let lang = Language::from_639_3(&normalized)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", normalized))?;

    Ok(lang.to_name().to_string())
}

/// Language hint handed to the sanitizer passes.
///
/// Carries the normalized code plus the one property the English-only
/// passes gate on.
#[derive(Debug, Clone)]
pub struct LanguageHint {
    /// Normalized ISO 639-2/T code
    pub code: String,

    /// Human-readable language name for prompts and logs
    pub name: String,

    /// Whether the target is in the English family
    pub english_family: bool,
}

impl LanguageHint {
    /// Resolve a hint from any ISO 639-1/2 code.
    pub fn resolve(code: &str) -> Result<Self> {
        let normalized = normalize_to_part2t(code)?;
        let name = get_language_name(&normalized)?;
        let english_family = normalized == "eng";

        Ok(Self {
            code: normalized,
            name,
            english_family,
        })
    }
}
