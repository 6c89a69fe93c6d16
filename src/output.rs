//! JSON bridge for CEL values.
//!
//! [`from_json`] turns host JSON into a [`Value`]; [`to_json`] and
//! [`to_json_pretty`] render a result for display. Rendering is lossy where
//! JSON has no matching type:
//!
//! | CEL | JSON |
//! |-----|------|
//! | `uint` | number |
//! | `bytes` | array of byte values |
//! | `timestamp` | RFC 3339 string |
//! | `duration` | string such as `"1.5s"` |
//! | non-finite `double` | string (`"NaN"`, `"inf"`, `"-inf"`) |
//! | map with non-string keys | object keyed by the key's text |
//! | message | object of its fields |
//!
//! Object keys come out sorted, so output is deterministic.
//!
//! # Examples
//!
//! ```
//! use cel_lang::Value;
//! use cel_lang::output::{to_json, to_json_pretty};
//!
//! let value = Value::list([Value::Int(1), Value::string("two")]);
//! assert_eq!(to_json(&value), r#"[1,"two"]"#);
//! assert_eq!(to_json_pretty(&Value::Int(42)), "42");
//! ```

use serde_json::{Map, Number};

use crate::value::{MapKey, Value, format_duration, format_timestamp};

/// Converts host JSON into a CEL value.
///
/// Integral numbers become `int` when they fit, otherwise `uint`; everything
/// else becomes `double`.
pub fn from_json(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else if let Some(u) = n.as_u64() {
                Value::UInt(u)
            } else {
                Value::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        serde_json::Value::String(s) => Value::string(s),
        serde_json::Value::Array(items) => Value::list(items.iter().map(from_json)),
        serde_json::Value::Object(object) => Value::map(
            object
                .iter()
                .map(|(k, v)| (MapKey::from(k.as_str()), from_json(v))),
        ),
    }
}

fn key_text(key: &MapKey) -> String {
    match key {
        MapKey::String(s) => s.to_string(),
        MapKey::Bool(b) => b.to_string(),
        MapKey::Int(n) => n.to_string(),
        MapKey::UInt(n) => n.to_string(),
    }
}

/// Converts a CEL value into JSON following the table in the module docs.
pub fn to_json_value(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(n) => serde_json::Value::Number((*n).into()),
        Value::UInt(n) => serde_json::Value::Number((*n).into()),
        Value::Float(n) => match Number::from_f64(*n) {
            Some(number) => serde_json::Value::Number(number),
            None if n.is_nan() => serde_json::Value::String("NaN".into()),
            None if *n > 0.0 => serde_json::Value::String("inf".into()),
            None => serde_json::Value::String("-inf".into()),
        },
        Value::String(s) => serde_json::Value::String(s.to_string()),
        Value::Bytes(bytes) => {
            serde_json::Value::Array(bytes.iter().map(|b| serde_json::Value::from(*b)).collect())
        }
        Value::Timestamp(t) => serde_json::Value::String(format_timestamp(*t)),
        Value::Duration(d) => serde_json::Value::String(format_duration(*d)),
        Value::List(items) => serde_json::Value::Array(items.iter().map(to_json_value).collect()),
        Value::Map(map) => {
            let object: Map<String, serde_json::Value> = map
                .iter()
                .map(|(k, v)| (key_text(k), to_json_value(v)))
                .collect();
            serde_json::Value::Object(object)
        }
        Value::Message(message) => {
            let object: Map<String, serde_json::Value> = message
                .fields()
                .map(|(k, v)| (k.to_string(), to_json_value(v)))
                .collect();
            serde_json::Value::Object(object)
        }
    }
}

/// Compact JSON text.
pub fn to_json(value: &Value) -> String {
    to_json_value(value).to_string()
}

/// JSON text with 2-space indentation.
pub fn to_json_pretty(value: &Value) -> String {
    format!("{:#}", to_json_value(value))
}
