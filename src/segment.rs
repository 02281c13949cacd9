/*!
 * Core data model for the translation pipeline.
 *
 * Segments come in from the caller (a document segmenter or an API layer),
 * flow through the pipeline as batches, and come back out as per-index
 * translation results. Everything here is plain data; behavior lives in the
 * pipeline modules.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One indexed unit of source text submitted for translation.
///
/// Segments are created by the caller before the pipeline starts and are
/// read-only for the pipeline's duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    /// Position in the caller's ordered list; drives final output order
    pub index: usize,

    /// Source text to translate
    pub source_text: String,
}

impl Segment {
    /// Create a new segment.
    pub fn new(index: usize, source_text: impl Into<String>) -> Self {
        Self {
            index,
            source_text: source_text.into(),
        }
    }
}

/// High-level translation mode, selecting a family of style templates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationMode {
    /// Plain batch translation of running text
    #[default]
    Generic,
    /// Timed subtitle lines; stricter 1:1 fidelity requirements
    Subtitles,
    /// Multi-speaker dialogue with dash-line conventions
    Dialogue,
    /// Marketing copy; looser, allows rephrasing
    Marketing,
}

impl TranslationMode {
    /// Lowercase identifier used in configs and CLI flags.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Subtitles => "subtitles",
            Self::Dialogue => "dialogue",
            Self::Marketing => "marketing",
        }
    }
}

impl std::fmt::Display for TranslationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Style parameters shared by every segment of a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleParams {
    /// Translation mode
    pub mode: TranslationMode,

    /// Optional sub-style refinement within the mode (e.g. "casual")
    #[serde(default)]
    pub sub_style: Option<String>,

    /// Target language code (ISO 639-1 or 639-2)
    pub target_language: String,

    /// Whether the engine may rephrase freely instead of translating closely
    #[serde(default)]
    pub rephrase: bool,

    /// Extra caller-supplied instructions appended to the prompt
    #[serde(default)]
    pub injections: Vec<String>,
}

impl StyleParams {
    /// Create style parameters for a mode and target language.
    pub fn new(mode: TranslationMode, target_language: impl Into<String>) -> Self {
        Self {
            mode,
            sub_style: None,
            target_language: target_language.into(),
            rephrase: false,
            injections: Vec::new(),
        }
    }

    /// Set the sub-style refinement.
    pub fn with_sub_style(mut self, sub_style: impl Into<String>) -> Self {
        self.sub_style = Some(sub_style.into());
        self
    }

    /// Enable free rephrasing.
    pub fn with_rephrase(mut self, rephrase: bool) -> Self {
        self.rephrase = rephrase;
        self
    }

    /// Append a caller instruction.
    pub fn with_injection(mut self, instruction: impl Into<String>) -> Self {
        self.injections.push(instruction.into());
        self
    }
}

/// Terminal outcome of one item's trip through the pipeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ItemOutcome {
    /// Primary candidate passed the quality gate
    Accepted,
    /// Secondary engine produced the delivered text
    Repaired,
    /// Committee-of-two plus arbiter produced the delivered text
    CommitteeFinalized,
    /// All escalation paths failed; the result carries a sentinel or the
    /// best-effort draft plus the last classified error in `reasons`
    Failed,
}

impl ItemOutcome {
    /// Snake-case label used for metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Repaired => "repaired",
            Self::CommitteeFinalized => "committee_finalized",
            Self::Failed => "failed",
        }
    }
}

/// One engine-to-engine transition taken while escalating an item.
///
/// Append-only; used for observability, never for control flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationRecord {
    /// Engine whose output triggered the escalation
    pub from_engine: String,

    /// Engine the item was escalated to
    pub to_engine: String,

    /// Why the escalation happened (low score, transient failure, ...)
    pub reason: String,

    /// When the transition happened
    pub timestamp: DateTime<Utc>,
}

impl EscalationRecord {
    /// Record a transition happening now.
    pub fn now(from_engine: &str, to_engine: &str, reason: impl Into<String>) -> Self {
        Self {
            from_engine: from_engine.to_string(),
            to_engine: to_engine.to_string(),
            reason: reason.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Final per-item result delivered to the assembler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationResult {
    /// Original segment index
    pub index: usize,

    /// Delivered text; empty string sentinel when the whole batch failed
    pub target_text: String,

    /// Quality gate score in [0, 1]
    pub quality_score: f32,

    /// Human-readable reasons behind penalties or failures
    pub reasons: Vec<String>,

    /// Terminal outcome of this item
    pub outcome: ItemOutcome,

    /// Engine transitions taken while escalating, in order
    pub escalation_trace: Vec<EscalationRecord>,
}

impl TranslationResult {
    /// Build a failure sentinel for an index, preserving any draft text.
    pub fn failed(index: usize, draft: String, reason: impl Into<String>) -> Self {
        Self {
            index,
            target_text: draft,
            quality_score: 0.0,
            reasons: vec![reason.into()],
            outcome: ItemOutcome::Failed,
            escalation_trace: Vec::new(),
        }
    }
}
