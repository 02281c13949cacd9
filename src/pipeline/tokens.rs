/*!
 * Token estimation for admission control.
 *
 * A cheap length heuristic, not a tokenizer: the planner only needs a
 * stable upper-bound-ish figure to pack batches under the request ceiling.
 */

/// Estimate the token count of a text.
pub fn estimate_tokens(text: &str) -> usize {
    // Rough estimate: ~4 chars per token for Latin-script text
    text.chars().count().div_ceil(4)
}

/// Projected total cost of a request: fixed overhead, input tokens, and
/// the projected output scaled from the input.
pub fn projected_request_tokens(
    overhead_tokens: usize,
    input_tokens: usize,
    output_factor: f32,
) -> usize {
    overhead_tokens + input_tokens + (input_tokens as f32 * output_factor).ceil() as usize
}
