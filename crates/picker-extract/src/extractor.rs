//! Structured extraction from free-form text
//!
//! Model output is supposed to be a JSON document but routinely arrives
//! wrapped in prose, code fences or trailing commentary. Extraction tries a
//! fixed sequence of increasingly lenient strategies and always returns a
//! [`NormalizedStructure`], falling back to the empty one.

use crate::structure::NormalizedStructure;
use serde_json::Value;
use tracing::debug;

const BOM: char = '\u{feff}';

/// Which strategy produced an extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractSource {
    /// The whole trimmed text parsed
    Full,
    /// The first balanced `{..}` or `[..]` block parsed
    BalancedBlock,
    /// The span from the first `{` to the last `}` parsed
    ObjectSpan,
    /// The span from the first `[` to the last `]` parsed
    ArraySpan,
    /// Nothing parsed
    Empty,
}

impl std::fmt::Display for ExtractSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Full => write!(f, "full"),
            Self::BalancedBlock => write!(f, "balanced_block"),
            Self::ObjectSpan => write!(f, "object_span"),
            Self::ArraySpan => write!(f, "array_span"),
            Self::Empty => write!(f, "empty"),
        }
    }
}

/// Normalized structure plus the strategy that recovered it
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// Recovered structure
    pub structure: NormalizedStructure,
    /// Strategy that produced it
    pub source: ExtractSource,
}

/// Recover a normalized structure from arbitrary text. Never fails.
#[must_use]
pub fn extract(text: &str) -> NormalizedStructure {
    extract_with_source(text).structure
}

/// Like [`extract`], also reporting which strategy succeeded.
#[must_use]
pub fn extract_with_source(text: &str) -> Extraction {
    let cleaned = text.strip_prefix(BOM).unwrap_or(text).trim();

    let found = try_parse(cleaned)
        .map(|value| (value, ExtractSource::Full))
        .or_else(|| {
            first_balanced_block(cleaned)
                .and_then(try_parse)
                .map(|value| (value, ExtractSource::BalancedBlock))
        })
        .or_else(|| {
            outer_span(cleaned, '{', '}')
                .and_then(try_parse)
                .map(|value| (value, ExtractSource::ObjectSpan))
        })
        .or_else(|| {
            outer_span(cleaned, '[', ']')
                .and_then(try_parse)
                .map(|value| (value, ExtractSource::ArraySpan))
        });

    match found {
        Some((value, source)) => {
            debug!(source = %source, "Extracted structure");
            Extraction {
                structure: NormalizedStructure::from_value(value),
                source,
            }
        }
        None => {
            debug!(len = cleaned.len(), "No structure found, using empty result");
            Extraction {
                structure: NormalizedStructure::empty(),
                source: ExtractSource::Empty,
            }
        }
    }
}

fn try_parse(candidate: &str) -> Option<Value> {
    if candidate.trim().is_empty() {
        return None;
    }
    serde_json::from_str(candidate).ok()
}

/// First `{`/`[` start, scanning left to right, whose brackets balance.
///
/// Only the first balanced block is returned, whether or not it parses.
fn first_balanced_block(text: &str) -> Option<&str> {
    text.bytes()
        .enumerate()
        .filter(|(_, b)| *b == b'{' || *b == b'[')
        .find_map(|(start, _)| block_end(text, start).map(|end| &text[start..=end]))
}

/// Index of the bracket closing the one at `start`.
///
/// String literals are skipped with escape handling. A closer that does not
/// match the innermost open bracket is ignored.
fn block_end(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut stack: Vec<u8> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => stack.push(b'}'),
            b'[' => stack.push(b']'),
            b'}' | b']' => {
                if stack.last() == Some(&b) {
                    stack.pop();
                    if stack.is_empty() {
                        return Some(i);
                    }
                } else if stack.is_empty() {
                    return None;
                }
            }
            _ => {}
        }
    }
    None
}

/// Span from the first `open` to the last `close`, when correctly ordered.
fn outer_span(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}
