//! Deterministic text encoding of ledger blocks for hashing.
//!
//! The hash input is a `|`-joined list of the block's fields in a fixed
//! order, ending with the canonical JSON rendering of the metadata. Any
//! change to this encoding invalidates every chain written before it.

use serde_json::Value;
use std::fmt::Write;

use crate::block::{LedgerBlock, Metadata};

/// Render a JSON value with object keys sorted lexicographically.
///
/// Arrays keep their order; scalars render exactly as JSON (`1` stays `1`,
/// `"1"` stays `"1"`). The output does not depend on the insertion order of
/// any map inside `value`.
///
/// ```
/// use serde_json::json;
/// use vigil_ledger::canonical_json;
///
/// let a = canonical_json(&json!({"b": 1, "a": [true, null, "x"]}));
/// assert_eq!(a, r#"{"a":[true,null,"x"],"b":1}"#);
/// ```
#[must_use]
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_value(value, &mut out);
    out
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out);
            }
            out.push(']');
        },
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(key, out);
                out.push(':');
                if let Some(v) = map.get(key) {
                    write_value(v, out);
                }
            }
            out.push('}');
        },
        Value::String(s) => write_string(s, out),
        // Null, Bool and Number have a single JSON rendering.
        scalar => {
            let _ = write!(out, "{scalar}");
        },
    }
}

fn write_string(s: &str, out: &mut String) {
    let _ = write!(out, "{}", Value::from(s));
}

/// Canonical rendering of block metadata (`{}` when empty).
#[must_use]
pub fn canonical_metadata(metadata: &Metadata) -> String {
    let object: serde_json::Map<String, Value> = metadata
        .iter()
        .map(|(k, v)| (k.clone(), v.to_json()))
        .collect();
    canonical_json(&Value::Object(object))
}

/// Build the exact hash input for `block`, excluding its `current_hash`.
///
/// Field order: sequence, timestamp, user id, username, role, clearance
/// level, action, status, approval id, required clearance, document id,
/// previous hash, metadata. Absent optional fields render as empty strings.
#[must_use]
pub fn block_hash_input(block: &LedgerBlock) -> String {
    let required = block
        .required_clearance
        .map(|c| c.level().to_string())
        .unwrap_or_default();
    let document = block
        .document_id
        .map(|id| id.to_string())
        .unwrap_or_default();

    [
        block.sequence.to_string(),
        block.timestamp.canonical(),
        block.actor.user_id.clone().unwrap_or_default(),
        block.actor.username.clone(),
        block.actor.role.clone(),
        block.actor.clearance_level.to_string(),
        block.action.as_str().to_string(),
        block.status.as_str().to_string(),
        block.approval_id.as_str().to_string(),
        required,
        document,
        block.previous_hash.clone(),
        canonical_metadata(&block.metadata),
    ]
    .join("|")
}
