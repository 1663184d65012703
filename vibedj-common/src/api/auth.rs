//! API authentication via timestamp and hash validation
//!
//! - Requests include `timestamp` (i64 Unix epoch ms) and `hash` (SHA-256)
//! - Timestamp must be within 1000ms past and 1ms future
//! - Hash is calculated from canonical JSON + shared secret
//! - A shared secret of 0 disables checking entirely
//!
//! Who the caller *is* stays with the external identity provider; this
//! module only decides whether a request carries valid proof of the secret.

use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::time::now_millis;

/// Placeholder substituted for the hash field before hashing
const DUMMY_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Maximum age of a request timestamp (ms)
const MAX_PAST_MS: i64 = 1000;

/// Maximum clock drift into the future (ms)
const MAX_FUTURE_MS: i64 = 1;

/// Authentication error types
#[derive(Debug, Clone, Error)]
pub enum ApiAuthError {
    /// Timestamp outside acceptable window
    #[error("Invalid timestamp: {reason}")]
    InvalidTimestamp {
        timestamp: i64,
        now: i64,
        reason: String,
    },

    /// Hash does not match calculated value
    #[error("Invalid hash")]
    InvalidHash { provided: String, calculated: String },

    /// Timestamp field missing from request
    #[error("Missing timestamp field")]
    MissingTimestamp,

    /// Hash field missing from request
    #[error("Missing hash field")]
    MissingHash,
}

/// Validate timestamp freshness
///
/// # Examples
///
/// ```
/// use vibedj_common::api::auth::validate_timestamp;
/// use vibedj_common::time::now_millis;
///
/// let now = now_millis();
/// assert!(validate_timestamp(now).is_ok());
/// assert!(validate_timestamp(now - 500).is_ok());
/// assert!(validate_timestamp(now - 5000).is_err());
/// ```
pub fn validate_timestamp(timestamp: i64) -> Result<(), ApiAuthError> {
    let now = now_millis();
    let diff = now - timestamp;

    if diff > MAX_PAST_MS {
        return Err(ApiAuthError::InvalidTimestamp {
            timestamp,
            now,
            reason: format!("Timestamp {}ms too old (max {}ms past)", diff, MAX_PAST_MS),
        });
    }

    if diff < -MAX_FUTURE_MS {
        return Err(ApiAuthError::InvalidTimestamp {
            timestamp,
            now,
            reason: format!(
                "Timestamp {}ms in future (max {}ms future)",
                diff.abs(),
                MAX_FUTURE_MS
            ),
        });
    }

    Ok(())
}

/// Calculate the request hash
///
/// 1. Replace hash field with dummy hash (64 zeros)
/// 2. Convert to canonical JSON (sorted keys, no whitespace)
/// 3. Append shared secret as decimal i64 string
/// 4. SHA-256, rendered as 64 lowercase hex characters
///
/// # Examples
///
/// ```
/// use vibedj_common::api::auth::calculate_hash;
/// use serde_json::json;
///
/// let body = json!({"vibe": "rainy sunday", "timestamp": 1730000000000i64, "hash": ""});
/// let hash = calculate_hash(&body, 123456789);
/// assert_eq!(hash.len(), 64);
/// ```
pub fn calculate_hash(json_value: &Value, shared_secret: i64) -> String {
    let mut value = json_value.clone();
    if let Some(obj) = value.as_object_mut() {
        obj.insert("hash".to_string(), Value::String(DUMMY_HASH.to_string()));
    }

    let canonical = to_canonical_json(&value);
    let to_hash = format!("{}{}", canonical, shared_secret);

    let mut hasher = Sha256::new();
    hasher.update(to_hash.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Convert JSON to canonical form (sorted keys, no whitespace)
pub fn to_canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut pairs: Vec<_> = map.iter().collect();
            pairs.sort_by_key(|(k, _)| *k);
            let items: Vec<String> = pairs
                .into_iter()
                .map(|(k, v)| format!("{}:{}", quote(k), to_canonical_json(v)))
                .collect();
            format!("{{{}}}", items.join(","))
        }
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(to_canonical_json).collect();
            format!("[{}]", items.join(","))
        }
        Value::String(s) => quote(s),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
    }
}

/// JSON string literal with standard escaping
fn quote(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

/// Validate hash matches calculated value
pub fn validate_hash(
    provided_hash: &str,
    json_value: &Value,
    shared_secret: i64,
) -> Result<(), ApiAuthError> {
    let calculated = calculate_hash(json_value, shared_secret);

    if provided_hash != calculated {
        return Err(ApiAuthError::InvalidHash {
            provided: provided_hash.to_string(),
            calculated,
        });
    }

    Ok(())
}

/// Attach `timestamp` and a valid `hash` to a JSON object body
///
/// Client-side counterpart of [`validate_hash`]; used by tooling and tests.
pub fn sign_body(body: &mut Value, shared_secret: i64) {
    if let Some(obj) = body.as_object_mut() {
        obj.insert("timestamp".to_string(), Value::from(now_millis()));
    }
    let hash = calculate_hash(body, shared_secret);
    if let Some(obj) = body.as_object_mut() {
        obj.insert("hash".to_string(), Value::String(hash));
    }
}
