//! Value normalizer — decodes JSON that was stored as string values
//!
//! Agent traces frequently carry tool output and arguments as stringified
//! JSON, sometimes stringified more than once. `normalize` walks the tree and
//! re-decodes every string that parses as JSON until nothing stringified is
//! left. Strings that do not parse are returned trimmed.

use serde_json::{Map, Value};

/// Maximum number of nested string decodes along one path. Past this depth a
/// string is treated as plain text.
pub const MAX_DECODE_DEPTH: usize = 20;

/// Normalize a decoded JSON value. Never fails.
pub fn normalize(value: Value) -> Value {
    normalize_at(value, 0)
}

fn normalize_at(value: Value, depth: usize) -> Value {
    match value {
        Value::String(s) => decode_string(s, depth),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| normalize_at(item, depth))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, v)| (key, normalize_at(v, depth)))
                .collect::<Map<String, Value>>(),
        ),
        other => other,
    }
}

fn decode_string(s: String, depth: usize) -> Value {
    if depth >= MAX_DECODE_DEPTH {
        tracing::debug!(depth, "String decode depth exceeded, keeping as text");
        return Value::String(s.trim().to_string());
    }

    match serde_json::from_str::<Value>(&s) {
        Ok(parsed) => normalize_at(parsed, depth + 1),
        Err(_) => {
            // `trim` also strips Unicode spaces JSON rejects, so the trimmed
            // text may parse where the original did not.
            let trimmed = s.trim();
            if trimmed.len() == s.len() {
                Value::String(s)
            } else {
                decode_string(trimmed.to_string(), depth)
            }
        }
    }
}
