//! Shared utilities: URL encoding and JSON field readers.

pub mod json;

use crate::models::Snowflake;

/// Current wall-clock time as unix seconds.
pub(crate) fn now_secs() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

/// Parse a decimal snowflake string; 0 when malformed.
pub fn parse_snowflake(value: &str) -> Snowflake {
    value.parse().unwrap_or(0)
}

/// Percent-encode a URL component. Bytes in `[A-Za-z0-9-_.~]` pass
/// through; everything else becomes `%XX` with uppercase hex digits.
pub fn url_encode(value: &str) -> String {
    use std::fmt::Write;

    let mut escaped = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                escaped.push(byte as char);
            }
            other => {
                let _ = write!(escaped, "%{:02X}", other);
            }
        }
    }
    escaped
}
