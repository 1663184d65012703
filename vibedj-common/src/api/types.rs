//! Shared API request/response types

use serde::{Deserialize, Serialize};

/// Authentication parameters for bodiless requests (query parameters)
///
/// `GET /sessions/{id}?timestamp=1730000000000&hash=abc123...`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthQuery {
    /// Unix epoch time in milliseconds
    pub timestamp: i64,

    /// SHA-256 hash (64 hex chars)
    pub hash: String,
}

/// Error payload returned by every failing endpoint
///
/// `details` carries the underlying cause when there is one.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_omits_missing_details() {
        let json = serde_json::to_value(ErrorResponse::new("Unauthorized")).unwrap();
        assert_eq!(json, serde_json::json!({"error": "Unauthorized"}));
    }

    #[test]
    fn test_error_response_with_details() {
        let json =
            serde_json::to_value(ErrorResponse::with_details("Internal Server Error", "boom"))
                .unwrap();
        assert_eq!(json["details"], "boom");
    }
}
