//! Tolerant readers for optional JSON fields.
//!
//! The API omits fields freely and sends 64-bit ids as decimal strings.
//! These helpers read a field if present and fall back to a zero value
//! otherwise, so model constructors stay linear.

use serde_json::Value;

use crate::models::Snowflake;

/// String field; empty when missing, null or not a string.
pub fn string_not_null(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Snowflake field sent as a decimal string; 0 when missing or malformed.
pub fn snowflake_not_null(value: &Value, key: &str) -> Snowflake {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(crate::utils::parse_snowflake)
        .unwrap_or(0)
}

/// Boolean field; false when missing or null.
pub fn bool_not_null(value: &Value, key: &str) -> bool {
    value.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// Unsigned integer field; 0 when missing or negative.
pub fn int_not_null(value: &Value, key: &str) -> u64 {
    value.get(key).and_then(Value::as_u64).unwrap_or(0)
}

/// ISO-8601 timestamp field as unix seconds; 0 when missing or malformed.
pub fn timestamp_not_null(value: &Value, key: &str) -> i64 {
    value
        .get(key)
        .and_then(Value::as_str)
        .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.timestamp())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn missing_fields_fall_back_to_zero_values() {
        let value = json!({});
        assert_eq!(string_not_null(&value, "name"), "");
        assert_eq!(snowflake_not_null(&value, "id"), 0);
        assert!(!bool_not_null(&value, "bot"));
        assert_eq!(int_not_null(&value, "count"), 0);
        assert_eq!(timestamp_not_null(&value, "joined_at"), 0);
    }

    #[test]
    fn snowflakes_parse_from_decimal_strings() {
        let value = json!({ "id": "941234567890123456" });
        assert_eq!(snowflake_not_null(&value, "id"), 941234567890123456);
    }

    #[test]
    fn timestamps_parse_from_iso8601() {
        let value = json!({ "joined_at": "2021-01-01T00:00:00+00:00" });
        assert_eq!(timestamp_not_null(&value, "joined_at"), 1609459200);
    }
}
