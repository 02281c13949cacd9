/*!
 * Greedy bin-packing of segments into token-bounded batches.
 *
 * Batches preserve the caller's order and original indices; the budget is
 * enforced at planning time against the projected request cost (overhead +
 * input + projected output), never after the fact. An oversized single
 * segment still forms a singleton batch; no segment is ever dropped.
 */

use log::debug;

use super::tokens::{estimate_tokens, projected_request_tokens};
use crate::app_config::PipelineTunables;
use crate::segment::Segment;

/// Ordered, contiguous group of segments sent together in one engine call.
#[derive(Debug, Clone)]
pub struct Batch {
    /// Position of this batch in plan order
    pub id: usize,

    /// Segments in original order
    pub segments: Vec<Segment>,

    /// Estimated input tokens of the segments alone
    pub estimated_tokens: usize,
}

impl Batch {
    /// Number of segments in the batch.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Planner configuration, a view over the pipeline tunables.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Projected-cost ceiling per batch
    pub max_tokens_per_batch: usize,

    /// Fixed prompt overhead charged against each batch
    pub overhead_tokens: usize,

    /// Projected output tokens per input token
    pub output_factor: f32,

    /// Item count cap per batch
    pub max_items_per_batch: usize,
}

impl From<&PipelineTunables> for PlannerConfig {
    fn from(tunables: &PipelineTunables) -> Self {
        Self {
            max_tokens_per_batch: tunables.max_tokens_per_batch,
            overhead_tokens: tunables.overhead_tokens,
            output_factor: tunables.output_factor,
            max_items_per_batch: tunables.max_items_per_batch,
        }
    }
}

/// Greedy order-preserving bin-packer.
#[derive(Debug, Clone)]
pub struct ChunkPlanner {
    config: PlannerConfig,
}

impl ChunkPlanner {
    /// Create a planner.
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    /// Split segments into token-bounded batches, preserving order.
    pub fn plan(&self, segments: &[Segment]) -> Vec<Batch> {
        let mut batches = Vec::new();
        let mut current: Vec<Segment> = Vec::new();
        let mut current_tokens = 0usize;

        for segment in segments {
            let segment_tokens = estimate_tokens(&segment.source_text);
            let projected = projected_request_tokens(
                self.config.overhead_tokens,
                current_tokens + segment_tokens,
                self.config.output_factor,
            );

            let over_budget = !current.is_empty() && projected > self.config.max_tokens_per_batch;
            let over_count = current.len() >= self.config.max_items_per_batch;

            if over_budget || over_count {
                batches.push(Batch {
                    id: batches.len(),
                    segments: std::mem::take(&mut current),
                    estimated_tokens: current_tokens,
                });
                current_tokens = 0;
            }

            current.push(segment.clone());
            current_tokens += segment_tokens;
        }

        if !current.is_empty() {
            batches.push(Batch {
                id: batches.len(),
                segments: current,
                estimated_tokens: current_tokens,
            });
        }

        debug!(
            "Planned {} segments into {} batches",
            segments.len(),
            batches.len()
        );
        batches
    }
}
