//! Text segments from a generative response envelope
//!
//! Responses-style APIs return `{"output": [{"content": [{"type":
//! "output_text", "text": "..."}]}]}`. Only `output_text` segments carry the
//! answer; reasoning, tool calls and refusals are skipped.

use crate::extractor::extract;
use crate::structure::NormalizedStructure;
use serde_json::Value;
use tracing::debug;

/// Concatenate every `output_text` segment, in order.
///
/// Anything off-shape contributes nothing, so a malformed envelope yields
/// an empty string.
#[must_use]
pub fn collect_output_text(envelope: &Value) -> String {
    let Some(output) = envelope.get("output").and_then(Value::as_array) else {
        return String::new();
    };

    output
        .iter()
        .filter_map(|item| item.get("content").and_then(Value::as_array))
        .flatten()
        .filter(|content| content.get("type").and_then(Value::as_str) == Some("output_text"))
        .filter_map(|content| content.get("text").and_then(Value::as_str))
        .collect()
}

/// Parse a raw response body and extract from its output text.
///
/// A body that is not JSON yields the empty structure.
#[must_use]
pub fn extract_from_envelope(body: &str) -> NormalizedStructure {
    match serde_json::from_str::<Value>(body) {
        Ok(envelope) => extract(&collect_output_text(&envelope)),
        Err(e) => {
            debug!(error = %e, "Response envelope is not JSON");
            NormalizedStructure::empty()
        }
    }
}
