//! Value Codec Module
//!
//! Serialization policy between typed values and stored payloads.
//!
//! With `serialize = true` values are stored as JSON text. Reads are lenient:
//! a payload that is not valid JSON is handed back as a plain string instead
//! of failing. With `serialize = false` values are stored in their string form;
//! dynamic reads return that string and typed reads parse it when `T` is not
//! a string.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

/// Encodes a value for storage.
///
/// Fails only when the value itself cannot be represented as JSON (for
/// example a map with non-string keys), which is a caller bug.
pub fn encode<T: Serialize + ?Sized>(value: &T, serialize: bool) -> serde_json::Result<String> {
    if serialize {
        return serde_json::to_string(value);
    }

    Ok(match serde_json::to_value(value)? {
        Value::String(s) => s,
        other => other.to_string(),
    })
}

/// Decodes a payload into a dynamic JSON value, never failing.
pub fn decode_value(raw: String, serialize: bool) -> Value {
    if !serialize {
        return Value::String(raw);
    }

    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(_) => Value::String(raw),
    }
}

/// Decodes a payload into `T`.
///
/// With `serialize = true` the JSON payload is tried first, then the raw
/// string. In raw mode the string is tried first, so text stays text; a `T`
/// that is not a string is parsed from the raw text (`"7"` reads as `7`).
///
/// Returns `None` only when neither reading fits `T`.
pub fn decode<T: DeserializeOwned>(raw: String, serialize: bool) -> Option<T> {
    if serialize {
        if let Ok(value) = serde_json::from_str::<T>(&raw) {
            return Some(value);
        }
        return serde_json::from_value(Value::String(raw)).ok();
    }

    let parsed = serde_json::from_str::<T>(&raw).ok();
    serde_json::from_value(Value::String(raw)).ok().or(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use std::collections::HashMap;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Listing {
        name: String,
        price: f64,
        tags: Vec<String>,
    }

    #[test]
    fn test_encode_struct_as_json() {
        let listing = Listing {
            name: "Widget".into(),
            price: 9.99,
            tags: vec!["tools".into()],
        };
        let raw = encode(&listing, true).unwrap();
        assert_eq!(decode::<Listing>(raw, true), Some(listing));
    }

    #[test]
    fn test_encode_raw_mode_string_is_unquoted() {
        assert_eq!(encode("hello", false).unwrap(), "hello");
        assert_eq!(encode(&42, false).unwrap(), "42");
        assert_eq!(encode(&json!({"a": 1}), false).unwrap(), r#"{"a":1}"#);
    }

    #[test]
    fn test_encode_non_string_map_keys_fails() {
        let mut map = HashMap::new();
        map.insert((1, 2), "pair");
        assert!(encode(&map, true).is_err());
    }

    #[test]
    fn test_decode_value_malformed_returns_raw_string() {
        let value = decode_value("{not json".to_string(), true);
        assert_eq!(value, Value::String("{not json".to_string()));
    }

    #[test]
    fn test_decode_value_raw_mode_skips_parsing() {
        let value = decode_value("42".to_string(), false);
        assert_eq!(value, Value::String("42".to_string()));
    }

    #[test]
    fn test_decode_typed_falls_back_to_raw_string() {
        assert_eq!(
            decode::<String>("plain text".to_string(), true),
            Some("plain text".to_string())
        );
        assert_eq!(decode::<u32>("plain text".to_string(), true), None);
    }

    #[test]
    fn test_decode_raw_mode_reads_string() {
        assert_eq!(decode::<String>("7".to_string(), false), Some("7".to_string()));
        assert_eq!(decode::<u32>("7".to_string(), false), Some(7));
        assert_eq!(decode::<bool>("true".to_string(), false), Some(true));
        assert_eq!(decode::<u32>("seven".to_string(), false), None);
    }
}
