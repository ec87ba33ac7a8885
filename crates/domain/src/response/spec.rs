//! Response type

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::request::Headers;

/// Status the backend uses to signal a rejected credential.
pub const STATUS_UNAUTHORIZED: u16 = 401;

/// Backend response: `{status, data}` plus transport metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    #[serde(default)]
    pub headers: Headers,
    /// Decoded body. Non-JSON bodies are kept as a string, empty bodies are null.
    pub data: serde_json::Value,
    /// Round-trip time
    #[serde(with = "duration_millis")]
    pub duration: Duration,
}

impl ApiResponse {
    /// Creates a response with a JSON payload.
    #[must_use]
    pub fn new(status: u16, data: serde_json::Value) -> Self {
        Self {
            status,
            headers: Headers::new(),
            data,
            duration: Duration::ZERO,
        }
    }

    /// Builds a response from a raw body.
    #[must_use]
    pub fn from_body(status: u16, headers: Headers, body: &[u8], duration: Duration) -> Self {
        let data = if body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(body).unwrap_or_else(|_| {
                serde_json::Value::String(String::from_utf8_lossy(body).into_owned())
            })
        };
        Self {
            status,
            headers,
            data,
            duration,
        }
    }

    /// Returns true if the status code indicates success (2xx).
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Returns true if the backend rejected the credential.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        self.status == STATUS_UNAUTHORIZED
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[allow(clippy::cast_possible_truncation)]
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_status_checks() {
        assert!(ApiResponse::new(200, json!({})).is_success());
        assert!(!ApiResponse::new(200, json!({})).is_unauthorized());
        assert!(ApiResponse::new(401, json!({})).is_unauthorized());
        assert!(!ApiResponse::new(403, json!({})).is_unauthorized());
    }

    #[test]
    fn test_from_body_decodes_json() {
        let response = ApiResponse::from_body(
            200,
            Headers::new(),
            br#"{"firms":[]}"#,
            Duration::from_millis(5),
        );
        assert_eq!(response.data, json!({"firms": []}));
    }

    #[test]
    fn test_from_body_keeps_text_and_empty() {
        let text = ApiResponse::from_body(502, Headers::new(), b"Bad Gateway", Duration::ZERO);
        assert_eq!(text.data, json!("Bad Gateway"));

        let empty = ApiResponse::from_body(204, Headers::new(), b"", Duration::ZERO);
        assert_eq!(empty.data, serde_json::Value::Null);
    }
}
