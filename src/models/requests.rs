//! Request DTOs for the admin API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;
use serde_json::Value;

/// Maximum allowed raw key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Request body for `PUT /cache/:instance/:key`
///
/// # Fields
/// - `value`: Any JSON document
/// - `ttl`: Optional TTL in seconds (instance default if not specified)
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The value to store
    pub value: Value,
    /// Optional TTL in seconds
    #[serde(default)]
    pub ttl: Option<u64>,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.ttl == Some(0) {
            return Some("TTL must be greater than zero".to_string());
        }
        None
    }
}

/// Validates a raw key taken from the request path.
///
/// Returns an error message if validation fails, None if valid.
pub fn validate_key(key: &str) -> Option<String> {
    if key.is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.len() > MAX_KEY_LENGTH {
        return Some(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        ));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_request_deserialize() {
        let json = r#"{"value": {"name": "Widget", "price": 9.99}}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.value, json!({"name": "Widget", "price": 9.99}));
        assert!(req.ttl.is_none());
    }

    #[test]
    fn test_set_request_with_ttl() {
        let json = r#"{"value": "hello", "ttl": 60}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.ttl, Some(60));
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_validate_zero_ttl() {
        let req = SetRequest {
            value: json!(1),
            ttl: Some(0),
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("").is_some());
        assert!(validate_key(&"x".repeat(MAX_KEY_LENGTH + 1)).is_some());
        assert!(validate_key("valid_key").is_none());
    }
}
