/*!
 * Metrics for pipeline observability.
 *
 * Collects escalation transitions (labeled by from-engine, to-engine and
 * reason), a histogram of quality scores, terminal outcome tallies and
 * token usage accounting. Workers share one `PipelineMetrics` instance;
 * everything else in a batch is owned by a single worker.
 */

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::segment::ItemOutcome;

/// Number of buckets in the quality score histogram ([0,1] in 0.1 steps).
const SCORE_BUCKETS: usize = 10;

/// Token usage statistics for tracking engine consumption
#[derive(Debug, Clone)]
pub struct TokenUsageStats {
    /// Number of prompt tokens
    pub prompt_tokens: u64,

    /// Number of completion tokens
    pub completion_tokens: u64,

    /// Total number of tokens
    pub total_tokens: u64,

    /// Total time spent inside engine calls
    pub api_duration: Duration,
}

impl Default for TokenUsageStats {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenUsageStats {
    /// Create a new empty token usage stats instance
    pub fn new() -> Self {
        Self {
            prompt_tokens: 0,
            completion_tokens: 0,
            total_tokens: 0,
            api_duration: Duration::from_secs(0),
        }
    }

    /// Add token counts reported by an engine
    pub fn add_token_usage(&mut self, prompt_tokens: Option<u64>, completion_tokens: Option<u64>) {
        if let Some(pt) = prompt_tokens {
            self.prompt_tokens += pt;
            self.total_tokens += pt;
        }

        if let Some(ct) = completion_tokens {
            self.completion_tokens += ct;
            self.total_tokens += ct;
        }
    }

    /// Add time spent inside one engine call
    pub fn add_request_duration(&mut self, duration: Duration) {
        self.api_duration += duration;
    }

    /// Calculate tokens per minute over the time spent in engine calls
    pub fn tokens_per_minute(&self) -> f64 {
        let duration_minutes = self.api_duration.as_secs_f64() / 60.0;
        if duration_minutes > 0.0 {
            self.total_tokens as f64 / duration_minutes
        } else {
            0.0
        }
    }

    /// Generate a summary of token usage
    pub fn summary(&self) -> String {
        format!(
            "Token Usage Summary:\n\
             Prompt tokens: {}\n\
             Completion tokens: {}\n\
             Total tokens: {}\n\
             Engine call time: {:.2} minutes\n\
             Tokens per minute: {:.2}",
            self.prompt_tokens,
            self.completion_tokens,
            self.total_tokens,
            self.api_duration.as_secs_f64() / 60.0,
            self.tokens_per_minute()
        )
    }
}

/// Shared metrics sink for one pipeline run.
#[derive(Debug)]
pub struct PipelineMetrics {
    /// Escalation counters keyed by (from_engine, to_engine, reason)
    escalations: Mutex<HashMap<(String, String, String), u64>>,

    /// Quality score histogram
    score_histogram: Mutex<[u64; SCORE_BUCKETS]>,

    /// Outcome tallies
    accepted: AtomicU64,
    repaired: AtomicU64,
    committee_finalized: AtomicU64,
    failed: AtomicU64,

    /// Token usage accounting
    usage: Mutex<TokenUsageStats>,

    /// When this run started
    started_at: Instant,
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineMetrics {
    /// Create an empty metrics sink.
    pub fn new() -> Self {
        Self {
            escalations: Mutex::new(HashMap::new()),
            score_histogram: Mutex::new([0; SCORE_BUCKETS]),
            accepted: AtomicU64::new(0),
            repaired: AtomicU64::new(0),
            committee_finalized: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            usage: Mutex::new(TokenUsageStats::new()),
            started_at: Instant::now(),
        }
    }

    /// Record one escalation transition.
    pub fn record_escalation(&self, from_engine: &str, to_engine: &str, reason: &str) {
        let mut escalations = self.escalations.lock();
        *escalations
            .entry((
                from_engine.to_string(),
                to_engine.to_string(),
                reason.to_string(),
            ))
            .or_insert(0) += 1;
    }

    /// Record a quality gate score.
    pub fn record_score(&self, score: f32) {
        let bucket = ((score.clamp(0.0, 1.0) * SCORE_BUCKETS as f32) as usize)
            .min(SCORE_BUCKETS - 1);
        self.score_histogram.lock()[bucket] += 1;
    }

    /// Record a terminal item outcome.
    pub fn record_outcome(&self, outcome: ItemOutcome) {
        let counter = match outcome {
            ItemOutcome::Accepted => &self.accepted,
            ItemOutcome::Repaired => &self.repaired,
            ItemOutcome::CommitteeFinalized => &self.committee_finalized,
            ItemOutcome::Failed => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record engine-reported token usage and call duration.
    pub fn record_usage(
        &self,
        prompt_tokens: Option<u64>,
        completion_tokens: Option<u64>,
        duration: Duration,
    ) {
        let mut usage = self.usage.lock();
        usage.add_token_usage(prompt_tokens, completion_tokens);
        usage.add_request_duration(duration);
    }

    /// Snapshot the current counters for reporting.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let escalations = self
            .escalations
            .lock()
            .iter()
            .map(|((from, to, reason), count)| EscalationCount {
                from_engine: from.clone(),
                to_engine: to.clone(),
                reason: reason.clone(),
                count: *count,
            })
            .collect();

        let usage = self.usage.lock().clone();

        MetricsSnapshot {
            escalations,
            score_histogram: self.score_histogram.lock().to_vec(),
            accepted: self.accepted.load(Ordering::Relaxed),
            repaired: self.repaired.load(Ordering::Relaxed),
            committee_finalized: self.committee_finalized.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
            api_duration_ms: usage.api_duration.as_millis() as u64,
            elapsed_ms: self.started_at.elapsed().as_millis() as u64,
        }
    }

    /// Clone of the current token usage stats.
    pub fn token_usage(&self) -> TokenUsageStats {
        self.usage.lock().clone()
    }
}

/// One escalation counter in a snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct EscalationCount {
    /// Engine whose output triggered the escalation
    pub from_engine: String,
    /// Engine escalated to
    pub to_engine: String,
    /// Reason label
    pub reason: String,
    /// Number of occurrences
    pub count: u64,
}

/// Serializable point-in-time view of the metrics.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Escalation counters
    pub escalations: Vec<EscalationCount>,
    /// Quality score histogram, 10 buckets over [0, 1]
    pub score_histogram: Vec<u64>,
    /// Items accepted on the primary path
    pub accepted: u64,
    /// Items delivered after single-shot repair
    pub repaired: u64,
    /// Items delivered by the committee path
    pub committee_finalized: u64,
    /// Items that exhausted every path
    pub failed: u64,
    /// Total prompt tokens across engines
    pub prompt_tokens: u64,
    /// Total completion tokens across engines
    pub completion_tokens: u64,
    /// Total tokens across engines
    pub total_tokens: u64,
    /// Cumulative time inside engine calls
    pub api_duration_ms: u64,
    /// Wall-clock time since the metrics were created
    pub elapsed_ms: u64,
}
