//! Picker Extract - Tolerant Structured Extraction
//!
//! Turns untrusted model output into a [`NormalizedStructure`]:
//! - Extractor: full parse, balanced block scan, then naive bracket spans
//! - Structure: canonical `unit` / `items` / `global_notes` shape
//! - Output text: pulls `output_text` segments out of a response envelope
//!
//! Extraction is total. The worst case is the canonical empty structure.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod extractor;
pub mod output_text;
pub mod structure;

pub use extractor::{extract, extract_with_source, ExtractSource, Extraction};
pub use output_text::{collect_output_text, extract_from_envelope};
pub use structure::{default_unit, NormalizedStructure};
