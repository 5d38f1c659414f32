//! The canonical response envelope returned by the backend.
//!
//! Every successful response carries `{ data, status, code, message?,
//! timestamp }`. Bodyless responses (204/205/304 or an empty body) never hit
//! the JSON parser; they are synthesized locally with the `NO_CONTENT` code.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Code assigned to responses that legitimately carry no body.
pub const NO_CONTENT: &str = "NO_CONTENT";

#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(default = "none")]
    pub data: Option<T>,
    pub status: u16,
    pub code: String,
    #[serde(default)]
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

// `#[serde(default)]` on `data` would require `T: Default`; this does not.
fn none<T>() -> Option<T> {
    None
}

impl<T> Envelope<T> {
    /// Synthesize the envelope for a response with no body.
    pub fn no_content(status: u16) -> Self {
        Self {
            data: None,
            status,
            code: NO_CONTENT.to_string(),
            message: None,
            timestamp: Utc::now(),
        }
    }
}

/// Statuses defined to carry no body.
pub(crate) fn is_no_content_status(status: u16) -> bool {
    matches!(status, 204 | 205 | 304)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_envelope() {
        let json = r#"{
            "data": {"id": 7},
            "status": 200,
            "code": "SUCCESS",
            "message": "ok",
            "timestamp": "2026-02-14T09:30:00Z"
        }"#;
        let envelope: Envelope<serde_json::Value> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.status, 200);
        assert_eq!(envelope.code, "SUCCESS");
        assert_eq!(envelope.message.as_deref(), Some("ok"));
        assert_eq!(envelope.data.unwrap()["id"], 7);
    }

    #[test]
    fn missing_data_and_message_parse_as_none() {
        let json = r#"{"status": 200, "code": "SUCCESS", "timestamp": "2026-02-14T09:30:00Z"}"#;
        let envelope: Envelope<serde_json::Value> = serde_json::from_str(json).unwrap();
        assert!(envelope.data.is_none());
        assert!(envelope.message.is_none());
    }

    #[test]
    fn no_content_is_synthesized() {
        let envelope: Envelope<serde_json::Value> = Envelope::no_content(204);
        assert!(envelope.data.is_none());
        assert_eq!(envelope.status, 204);
        assert_eq!(envelope.code, NO_CONTENT);
    }

    #[test]
    fn no_content_statuses() {
        assert!(is_no_content_status(204));
        assert!(is_no_content_status(205));
        assert!(is_no_content_status(304));
        assert!(!is_no_content_status(200));
        assert!(!is_no_content_status(201));
    }
}
