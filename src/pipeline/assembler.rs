/*!
 * Order-preserving merge of batch results.
 *
 * Batches complete in whatever order the engines allow; the assembler
 * merges them keyed by original segment index so the final list's order
 * always matches the input, and verifies the 1:1 length contract one last
 * time before anything is returned to the caller.
 */

use super::worker_pool::BatchOutcome;
use crate::errors::PipelineError;
use crate::segment::TranslationResult;

/// Final merge step of a pipeline run.
pub struct ResultAssembler;

impl ResultAssembler {
    /// Merge batch outcomes into one index-ordered result list.
    ///
    /// Fails if the merged results do not cover exactly the indices
    /// `0..expected_len`; with a correct planner and pool that never
    /// happens, but the contract is cheap to verify and critical enough
    /// to check.
    pub fn assemble(
        expected_len: usize,
        batch_outcomes: Vec<BatchOutcome>,
    ) -> Result<Vec<TranslationResult>, PipelineError> {
        let mut results: Vec<TranslationResult> = batch_outcomes
            .into_iter()
            .flat_map(|outcome| outcome.results)
            .collect();

        results.sort_by_key(|r| r.index);

        if results.len() != expected_len {
            return Err(PipelineError::IncompleteAssembly {
                expected: expected_len,
                actual: results.len(),
            });
        }
        for (position, result) in results.iter().enumerate() {
            if result.index != position {
                return Err(PipelineError::IncompleteAssembly {
                    expected: expected_len,
                    actual: position,
                });
            }
        }

        Ok(results)
    }

    /// Convenience view: just the delivered strings, in input order.
    pub fn output_texts(results: &[TranslationResult]) -> Vec<String> {
        results.iter().map(|r| r.target_text.clone()).collect()
    }
}
