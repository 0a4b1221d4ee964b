//! # Canonical Encoding
//!
//! Every replica executing the same invocation must write byte-identical
//! values. Records are therefore written as compact JSON with object keys
//! sorted recursively, independent of struct field order or map insertion
//! order.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Encodes `record` into its canonical byte form.
pub fn canonicalize<T: Serialize + ?Sized>(record: &T) -> Result<Vec<u8>, serde_json::Error> {
    let value = serde_json::to_value(record)?;
    serde_json::to_vec(&sort_keys(value))
}

// `serde_json::Map` keeps insertion order once `preserve_order` is enabled
// anywhere in the build, so ordering is rebuilt explicitly.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> =
                map.into_iter().map(|(k, v)| (k, sort_keys(v))).collect();
            Value::Object(sorted.into_iter().collect::<Map<String, Value>>())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

// =============================================================================
// TESTS
// =============================================================================
