/*!
 * Tests for the greedy token-bounded chunk planner
 */

use lingorelay::pipeline::planner::{ChunkPlanner, PlannerConfig};
use lingorelay::pipeline::tokens::estimate_tokens;
use lingorelay::segment::Segment;

use crate::common::segments_of;

fn planner(
    max_tokens_per_batch: usize,
    overhead_tokens: usize,
    output_factor: f32,
    max_items_per_batch: usize,
) -> ChunkPlanner {
    ChunkPlanner::new(PlannerConfig {
        max_tokens_per_batch,
        overhead_tokens,
        output_factor,
        max_items_per_batch,
    })
}

/// Twelve segments estimated at a fifth of the budget each, with an item
/// cap of four, must pack into exactly three batches of four.
#[test]
fn test_plan_withTwelveFifthBudgetSegments_shouldProduceThreeBatchesOfFour() {
    let max_tokens_per_batch = 1000;
    // 800 chars -> 200 tokens == maxTokensPerBatch / 5
    let text = "x".repeat(800);
    assert_eq!(estimate_tokens(&text), max_tokens_per_batch / 5);

    let segments: Vec<Segment> = (0..12).map(|i| Segment::new(i, text.clone())).collect();
    let batches = planner(max_tokens_per_batch, 0, 0.0, 4).plan(&segments);

    assert_eq!(batches.len(), 3);
    for (batch_idx, batch) in batches.iter().enumerate() {
        assert_eq!(batch.len(), 4);
        let indices: Vec<usize> = batch.segments.iter().map(|s| s.index).collect();
        let expected: Vec<usize> = (batch_idx * 4..batch_idx * 4 + 4).collect();
        assert_eq!(indices, expected);
    }
}

#[test]
fn test_plan_withHugeSingleSegment_shouldKeepItInSingletonBatch() {
    let segments = segments_of(&["short"]);
    let batches = planner(1, 0, 0.0, 10).plan(&segments);
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 1);
}

#[test]
fn test_plan_withOutputFactor_shouldReserveProjectedOutput() {
    // 40 chars -> 10 tokens per segment; projected cost for n segments is
    // 10n + 10n; the 60-token budget fits three, not four
    let text = "a".repeat(40);
    let texts: Vec<&str> = vec![&text, &text, &text, &text];
    let batches = planner(60, 0, 1.0, 100).plan(&segments_of(&texts));
    assert_eq!(batches[0].len(), 3);
    assert_eq!(batches.len(), 2);
}

#[test]
fn test_plan_shouldNeverDropOrReorderSegments() {
    let texts: Vec<String> = (0..37).map(|i| format!("segment number {}", i)).collect();
    let refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();
    let segments = segments_of(&refs);

    let batches = planner(30, 5, 0.8, 3).plan(&segments);

    let flattened: Vec<usize> = batches
        .iter()
        .flat_map(|b| b.segments.iter().map(|s| s.index))
        .collect();
    let expected: Vec<usize> = (0..37).collect();
    assert_eq!(flattened, expected);
}

#[test]
fn test_plan_batchIds_shouldBeSequential() {
    let texts: Vec<String> = (0..9).map(|i| format!("text {}", i)).collect();
    let refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();
    let batches = planner(1000, 0, 0.0, 2).plan(&segments_of(&refs));

    let ids: Vec<usize> = batches.iter().map(|b| b.id).collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 4]);
}
