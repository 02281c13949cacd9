/*!
 * Prompt construction for translation engine calls.
 *
 * The style registry maps (mode, sub_style) pairs onto system prompt
 * templates; renderers turn a batch of segments (or a single segment, or a
 * committee arbitration) into the concrete system/user message pair sent
 * through an engine adapter.
 */

pub mod templates;

pub use templates::{
    PromptLibrary, RenderedPrompt, StyleTemplate, RESULT_BEGIN, RESULT_END,
};
