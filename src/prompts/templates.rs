/*!
 * Style templates and prompt rendering.
 *
 * Templates are registered once at startup in an immutable library keyed by
 * (mode, sub_style) and injected into whoever renders prompts; nothing here
 * is ambient mutable state. The user prompt carries the 1:1 index contract:
 * engines must return exactly one translation per input item, as a JSON
 * array between the result delimiters.
 */

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::segment::{Segment, StyleParams, TranslationMode};

/// Marker preceding the structured result payload in engine output.
pub const RESULT_BEGIN: &str = "<<RESULTS>>";

/// Marker terminating the structured result payload.
pub const RESULT_END: &str = "<<END>>";

/// System prompt template for one (mode, sub_style) style.
#[derive(Debug, Clone)]
pub struct StyleTemplate {
    /// The system prompt with a `{target_language}` placeholder
    pub system: String,
}

impl StyleTemplate {
    /// Create a new template.
    pub fn new(system: &str) -> Self {
        Self {
            system: system.to_string(),
        }
    }
}

const GENERIC_SYSTEM: &str = "You are a professional translator. Translate the given segments into {target_language}. \
Preserve meaning, tone, punctuation and line breaks. \
Do not merge or split segments; every input segment maps to exactly one output segment.";

const SUBTITLES_SYSTEM: &str = "You are an expert subtitle translator working into {target_language}. \
Translate each subtitle segment naturally while keeping it concise enough for limited display time. \
Preserve line breaks, leading dashes for speaker changes, numerals, and terminal punctuation exactly. \
Never merge adjacent segments and never split one segment across several outputs.";

const DIALOGUE_SYSTEM: &str = "You are translating multi-speaker dialogue into {target_language}. \
Each segment may contain several speaker lines prefixed with a dash; keep one output line per speaker line. \
Preserve the emotional register, interruptions, ellipses and exclamations of the original. \
Every input segment maps to exactly one output segment.";

const MARKETING_SYSTEM: &str = "You are a marketing transcreation specialist writing in {target_language}. \
Adapt each segment so it reads as if originally written for the target market, keeping the intent and claims intact. \
Numbers, product names and legal qualifiers must survive unchanged. \
Every input segment maps to exactly one output segment.";

const MARKETING_PUNCHY_SYSTEM: &str = "You are a marketing transcreation specialist writing in {target_language}. \
Adapt each segment into short, punchy copy for the target market; sentence fragments are acceptable. \
Numbers, product names and legal qualifiers must survive unchanged. \
Every input segment maps to exactly one output segment.";

static GENERIC_FALLBACK: Lazy<StyleTemplate> = Lazy::new(|| StyleTemplate::new(GENERIC_SYSTEM));

static BUILTIN: Lazy<PromptLibrary> = Lazy::new(|| {
    let mut library = PromptLibrary::empty();
    library.register(TranslationMode::Generic, None, StyleTemplate::new(GENERIC_SYSTEM));
    library.register(TranslationMode::Subtitles, None, StyleTemplate::new(SUBTITLES_SYSTEM));
    library.register(TranslationMode::Dialogue, None, StyleTemplate::new(DIALOGUE_SYSTEM));
    library.register(TranslationMode::Marketing, None, StyleTemplate::new(MARKETING_SYSTEM));
    library.register(
        TranslationMode::Marketing,
        Some("punchy"),
        StyleTemplate::new(MARKETING_PUNCHY_SYSTEM),
    );
    library
});

/// Concrete system/user message pair ready for an engine call.
#[derive(Debug, Clone)]
pub struct RenderedPrompt {
    /// System message
    pub system: String,

    /// User message carrying the payload and the output contract
    pub user: String,
}

/// Immutable registry of style templates keyed by (mode, sub_style).
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    templates: HashMap<(TranslationMode, Option<String>), StyleTemplate>,
}

impl PromptLibrary {
    /// Create an empty library.
    pub fn empty() -> Self {
        Self {
            templates: HashMap::new(),
        }
    }

    /// The built-in style library.
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    /// Register a template for a (mode, sub_style) pair.
    pub fn register(
        &mut self,
        mode: TranslationMode,
        sub_style: Option<&str>,
        template: StyleTemplate,
    ) {
        self.templates
            .insert((mode, sub_style.map(|s| s.to_string())), template);
    }

    /// Resolve the template for a style.
    ///
    /// Falls back from (mode, sub_style) to (mode, None) to the generic
    /// template, which is always registered in the built-in library.
    pub fn resolve(&self, style: &StyleParams) -> &StyleTemplate {
        if let Some(sub) = &style.sub_style {
            if let Some(t) = self.templates.get(&(style.mode, Some(sub.clone()))) {
                return t;
            }
        }
        if let Some(t) = self.templates.get(&(style.mode, None)) {
            return t;
        }
        self.templates
            .get(&(TranslationMode::Generic, None))
            .unwrap_or(&GENERIC_FALLBACK)
    }

    /// Render the system message for a style.
    fn render_system(&self, style: &StyleParams, language_name: &str) -> String {
        let mut system = self
            .resolve(style)
            .system
            .replace("{target_language}", language_name);

        if style.rephrase {
            system.push_str(
                " You may rephrase freely for fluency as long as the meaning is preserved.",
            );
        }
        for injection in &style.injections {
            system.push(' ');
            system.push_str(injection);
        }
        system
    }

    /// Render the batch translation prompt for an ordered set of segments.
    pub fn render_batch(
        &self,
        style: &StyleParams,
        language_name: &str,
        segments: &[Segment],
    ) -> RenderedPrompt {
        let sources: Vec<&str> = segments.iter().map(|s| s.source_text.as_str()).collect();
        let payload = serde_json::to_string_pretty(&sources).unwrap_or_else(|_| "[]".to_string());

        let user = format!(
            "Translate the following {count} segments into {language}.\n\
             Input segments as a JSON array:\n{payload}\n\n\
             Respond with a JSON array of exactly {count} strings, translation i corresponding to input i, \
             wrapped between the markers {begin} and {end}. No other text.",
            count = segments.len(),
            language = language_name,
            payload = payload,
            begin = RESULT_BEGIN,
            end = RESULT_END,
        );

        RenderedPrompt {
            system: self.render_system(style, language_name),
            user,
        }
    }

    /// Render the single-segment prompt used by repair and committee calls.
    pub fn render_single(
        &self,
        style: &StyleParams,
        language_name: &str,
        segment: &Segment,
    ) -> RenderedPrompt {
        self.render_batch(style, language_name, std::slice::from_ref(segment))
    }

    /// Render the arbiter prompt synthesizing two committee candidates.
    pub fn render_arbiter(
        &self,
        style: &StyleParams,
        language_name: &str,
        segment: &Segment,
        candidate_a: &str,
        candidate_b: &str,
    ) -> RenderedPrompt {
        let user = format!(
            "Two independent translators produced candidate translations of the same source segment into {language}.\n\n\
             Source:\n{source}\n\n\
             Candidate A:\n{a}\n\n\
             Candidate B:\n{b}\n\n\
             Produce the single best final translation. Rules: preserve the punctuation type of the source \
             (questions stay questions, ellipses stay ellipses), preserve all numerals as digits, prefer the \
             clearer and more idiomatic candidate, or synthesize a version combining the best of both.\n\
             Respond with a JSON array of exactly 1 string wrapped between the markers {begin} and {end}. No other text.",
            language = language_name,
            source = segment.source_text,
            a = candidate_a,
            b = candidate_b,
            begin = RESULT_BEGIN,
            end = RESULT_END,
        );

        RenderedPrompt {
            system: self.render_system(style, language_name),
            user,
        }
    }
}
