//! Authentication middleware for vibedj-dj
//!
//! Protected requests prove knowledge of the shared secret with `timestamp`
//! and `hash`. JSON requests carry both in the body; bodiless requests
//! (DELETE, or POST without a body) carry them in the query string and hash
//! `{"timestamp", "hash"}` alone. Every failure is a 401.

use axum::{
    body::Body,
    extract::{Query, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tracing::warn;
use vibedj_common::api::{validate_hash, validate_timestamp, ApiAuthError, AuthQuery, ErrorResponse};

use crate::AppState;

/// Largest request body buffered for hash validation
const MAX_AUTH_BODY_BYTES: usize = 1024 * 1024;

pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    // secret = 0 disables all checking
    if state.shared_secret == 0 {
        return Ok(next.run(request).await);
    }

    let (parts, body) = request.into_parts();
    let body_bytes = axum::body::to_bytes(body, MAX_AUTH_BODY_BYTES)
        .await
        .map_err(|e| AuthError::Malformed(format!("Failed to read body: {}", e)))?;

    let (timestamp, hash, signed) = if body_bytes.iter().all(u8::is_ascii_whitespace) {
        let Query(query) = Query::<AuthQuery>::try_from_uri(&parts.uri)
            .map_err(|_| AuthError::from(missing_field(&parts.uri)))?;
        let signed = json!({ "timestamp": query.timestamp, "hash": &query.hash });
        (query.timestamp, query.hash, signed)
    } else {
        let body: Value = serde_json::from_slice(&body_bytes)
            .map_err(|e| AuthError::Malformed(format!("Invalid JSON: {}", e)))?;
        let timestamp = body
            .get("timestamp")
            .and_then(Value::as_i64)
            .ok_or(ApiAuthError::MissingTimestamp)?;
        let hash = body
            .get("hash")
            .and_then(Value::as_str)
            .ok_or(ApiAuthError::MissingHash)?
            .to_string();
        (timestamp, hash, body)
    };

    validate_timestamp(timestamp)?;
    validate_hash(&hash, &signed, state.shared_secret)?;

    let request = Request::from_parts(parts, Body::from(body_bytes));
    Ok(next.run(request).await)
}

/// Which auth field a failed query-string parse is missing
fn missing_field(uri: &axum::http::Uri) -> ApiAuthError {
    let query = uri.query().unwrap_or("");
    let has_timestamp = query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .any(|(key, value)| key == "timestamp" && value.parse::<i64>().is_ok());
    if has_timestamp {
        ApiAuthError::MissingHash
    } else {
        ApiAuthError::MissingTimestamp
    }
}

/// Authentication failures
#[derive(Debug)]
pub enum AuthError {
    Rejected(ApiAuthError),
    Malformed(String),
}

impl From<ApiAuthError> for AuthError {
    fn from(err: ApiAuthError) -> Self {
        AuthError::Rejected(err)
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::Rejected(ApiAuthError::InvalidHash {
                provided,
                calculated,
            }) => {
                warn!(
                    "Hash validation failed: provided={}, calculated={}",
                    provided, calculated
                );
                "Invalid hash".to_string()
            }
            AuthError::Rejected(e) => e.to_string(),
            AuthError::Malformed(msg) => msg,
        };
        warn!("Request unauthorized: {}", message);

        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::with_details("Unauthorized", message)),
        )
            .into_response()
    }
}
