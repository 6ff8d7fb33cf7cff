//! Normalized result shape

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Canonical metadata object used when the input carries none
#[must_use]
pub fn default_unit() -> Value {
    json!({
        "currency": "",
        "amount_unit": "",
        "vat": "unknown",
    })
}

/// Metadata, items and notes, plus any other top-level fields the input had.
///
/// Fields present in the input are kept exactly as parsed, even when their
/// type is unexpected; only missing ones are filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedStructure {
    /// Metadata such as currency and VAT handling
    #[serde(default = "default_unit")]
    pub unit: Value,
    /// Extracted entries
    #[serde(default = "empty_array")]
    pub items: Value,
    /// Free-form notes applying to every item
    #[serde(default = "empty_array")]
    pub global_notes: Value,
    /// Remaining top-level fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn empty_array() -> Value {
    Value::Array(Vec::new())
}

impl Default for NormalizedStructure {
    fn default() -> Self {
        Self::empty()
    }
}

impl NormalizedStructure {
    /// Default unit, no items, no notes
    #[must_use]
    pub fn empty() -> Self {
        Self {
            unit: default_unit(),
            items: empty_array(),
            global_notes: empty_array(),
            extra: Map::new(),
        }
    }

    /// Normalize any parsed JSON value.
    ///
    /// Arrays become the `items` of an otherwise empty structure. Objects get
    /// missing canonical fields backfilled. Scalars and `null` carry nothing
    /// usable and yield [`NormalizedStructure::empty`].
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Array(items) => Self {
                items: Value::Array(items),
                ..Self::empty()
            },
            Value::Object(mut map) => {
                let unit = map.remove("unit").unwrap_or_else(default_unit);
                let items = map.remove("items").unwrap_or_else(empty_array);
                let global_notes = map.remove("global_notes").unwrap_or_else(empty_array);
                Self {
                    unit,
                    items,
                    global_notes,
                    extra: map,
                }
            }
            _ => Self::empty(),
        }
    }

    /// Items as a slice, empty when `items` is not an array
    #[must_use]
    pub fn items(&self) -> &[Value] {
        self.items.as_array().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Notes as a slice, empty when `global_notes` is not an array
    #[must_use]
    pub fn global_notes(&self) -> &[Value] {
        self.global_notes.as_array().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Look up any top-level field, canonical ones included
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        match key {
            "unit" => Some(&self.unit),
            "items" => Some(&self.items),
            "global_notes" => Some(&self.global_notes),
            _ => self.extra.get(key),
        }
    }

    /// Whether this is exactly the canonical empty structure
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::empty()
    }

    /// Flatten back into a single JSON object
    #[must_use]
    pub fn into_value(self) -> Value {
        let mut map = Map::new();
        map.insert("unit".to_string(), self.unit);
        map.insert("items".to_string(), self.items);
        map.insert("global_notes".to_string(), self.global_notes);
        map.extend(self.extra);
        Value::Object(map)
    }
}

impl From<Value> for NormalizedStructure {
    fn from(value: Value) -> Self {
        Self::from_value(value)
    }
}
