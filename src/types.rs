//! Upstream response envelope.
//!
//! Every API-Football endpoint wraps its payload in the same envelope; the
//! `response` field is the domain payload and is passed through opaquely.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Pagination cursor reported by the upstream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub current: u32,
    #[serde(default)]
    pub total: u32,
}

/// The standard API-Football response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    /// Endpoint name echoed by the upstream.
    #[serde(default)]
    pub get: String,
    /// Request parameters echoed by the upstream. An empty parameter set is
    /// serialized as `[]`, a populated one as an object, so this stays opaque.
    #[serde(default)]
    pub parameters: Value,
    /// Upstream-reported errors. Empty array on success; an array of strings
    /// or an object of `field: message` pairs on a domain-level failure.
    #[serde(default)]
    pub errors: Value,
    #[serde(default)]
    pub results: u32,
    #[serde(default)]
    pub paging: Paging,
    /// The domain payload, opaque to this crate.
    #[serde(default)]
    pub response: Value,
}

impl ApiResponse {
    /// Upstream-reported error detail, if the envelope carries one.
    ///
    /// Returns `None` when `errors` is an empty array or empty object, which
    /// is how the upstream signals success.
    #[must_use]
    pub fn error_detail(&self) -> Option<String> {
        match &self.errors {
            Value::Array(items) if !items.is_empty() => Some(
                items
                    .iter()
                    .map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_string))
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            Value::Object(map) if !map.is_empty() => Some(
                map.iter()
                    .map(|(k, v)| {
                        format!("{k}: {}", v.as_str().map_or_else(|| v.to_string(), str::to_string))
                    })
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_has_no_error_detail() {
        let json = r#"{
            "get": "standings",
            "parameters": {"league": "39", "season": "2023"},
            "errors": [],
            "results": 1,
            "paging": {"current": 1, "total": 1},
            "response": [{"league": {"id": 39}}]
        }"#;

        let envelope: ApiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.get, "standings");
        assert_eq!(envelope.results, 1);
        assert!(envelope.error_detail().is_none());
    }

    #[test]
    fn error_object_is_flattened_to_detail() {
        let json = r#"{
            "get": "fixtures",
            "parameters": {"date": "not-a-date"},
            "errors": {"date": "The Date field must be a valid date."},
            "results": 0,
            "paging": {"current": 0, "total": 0},
            "response": []
        }"#;

        let envelope: ApiResponse = serde_json::from_str(json).unwrap();
        let detail = envelope.error_detail().unwrap();
        assert!(detail.contains("date"), "detail was: {detail}");
        assert!(detail.contains("valid date"), "detail was: {detail}");
    }

    #[test]
    fn empty_error_object_counts_as_success() {
        let json = r#"{"get": "timezone", "errors": {}, "response": ["Europe/London"]}"#;

        let envelope: ApiResponse = serde_json::from_str(json).unwrap();
        assert!(envelope.error_detail().is_none());
    }

    #[test]
    fn missing_fields_default() {
        let envelope: ApiResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(envelope.results, 0);
        assert_eq!(envelope.paging.current, 0);
        assert!(envelope.response.is_null());
    }
}
