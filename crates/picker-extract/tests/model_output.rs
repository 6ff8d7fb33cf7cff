//! Extraction over realistic model replies

use picker_extract::{extract, extract_with_source, ExtractSource, NormalizedStructure};
use serde_json::json;

#[test]
fn test_reply_with_preamble_and_fence() {
    let reply = r#"Based on the profile, here is the estimate.

```json
{
  "unit": {"currency": "KRW", "amount_unit": "won", "vat": "excluded"},
  "items": [
    {"type": "feed", "price_min": 300000, "price_max": 500000},
    {"type": "reel", "price_min": 500000, "price_max": 800000}
  ],
  "global_notes": ["Prices assume one revision round."]
}
```

Feel free to ask for adjustments."#;

    let extraction = extract_with_source(reply);
    assert_eq!(extraction.source, ExtractSource::BalancedBlock);
    let structure = extraction.structure;
    assert_eq!(structure.unit["vat"], "excluded");
    assert_eq!(structure.items().len(), 2);
    assert_eq!(structure.items()[1]["type"], "reel");
    assert_eq!(structure.global_notes().len(), 1);
}

#[test]
fn test_partial_object_keeps_extra_fields() {
    let structure = extract(r#"{"items": [], "confidence": 0.4, "currency_guess": "USD"}"#);
    assert_eq!(structure.get("confidence"), Some(&json!(0.4)));
    assert_eq!(structure.get("currency_guess"), Some(&json!("USD")));
    assert_eq!(structure.unit["currency"], "");
}

#[test]
fn test_truncated_reply_is_empty() {
    let structure = extract(r#"{"items": [{"type": "feed", "price_min": 30"#);
    assert_eq!(structure, NormalizedStructure::empty());
}

#[test]
fn test_serialized_shape() {
    let value = serde_json::to_value(extract("no structure here")).unwrap();
    assert_eq!(
        value,
        json!({
            "unit": {"currency": "", "amount_unit": "", "vat": "unknown"},
            "items": [],
            "global_notes": []
        })
    );
}
