//! Flattening payloads into key/value pairs for query strings and forms.
//!
//! Nested values use bracket notation: `{"a": {"b": 1}}` becomes `a[b]=1`
//! and `{"list": [1, 2]}` becomes `list[]=1&list[]=2`.

use serde_json::Value;

use super::RequestError;
use crate::template::value_to_text;

/// Flattens `data` into ordered key/value pairs.
///
/// Maps are flattened key by key. A top-level array is accepted when every
/// element is a `[key, value]` pair with a string key. Null yields no pairs.
///
/// # Errors
///
/// Returns [`RequestError::Encoding`] for strings, scalars, or arrays that
/// are not key/value pairs.
pub fn to_pairs(data: &Value) -> Result<Vec<(String, String)>, RequestError> {
    let mut pairs = Vec::new();
    match data {
        Value::Null => {}
        Value::Object(map) => {
            for (key, value) in map {
                push_value(&mut pairs, key.clone(), value);
            }
        }
        Value::Array(items) => {
            for item in items {
                let (key, value) = as_pair(item).ok_or_else(|| {
                    RequestError::Encoding(format!(
                        "expected [key, value] pairs for parameters, got {item}"
                    ))
                })?;
                push_value(&mut pairs, key.to_string(), value);
            }
        }
        other => {
            return Err(RequestError::Encoding(format!(
                "parameters must be a map or an array of pairs, got {other}"
            )));
        }
    }
    Ok(pairs)
}

/// Drops map entries whose value is null or an empty string.
///
/// Only the top level is compacted; other shapes pass through unchanged.
#[must_use]
pub fn compact(data: Value) -> Value {
    match data {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null() && v.as_str() != Some(""))
                .collect(),
        ),
        other => other,
    }
}

fn as_pair(item: &Value) -> Option<(&str, &Value)> {
    match item.as_array()?.as_slice() {
        [Value::String(key), value] => Some((key.as_str(), value)),
        _ => None,
    }
}

fn push_value(pairs: &mut Vec<(String, String)>, prefix: String, value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, inner) in map {
                push_value(pairs, format!("{prefix}[{key}]"), inner);
            }
        }
        Value::Array(items) => {
            for inner in items {
                push_value(pairs, format!("{prefix}[]"), inner);
            }
        }
        scalar => pairs.push((prefix, value_to_text(scalar))),
    }
}
