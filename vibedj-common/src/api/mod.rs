//! Shared HTTP API functionality
//!
//! Contains ONLY pure functions and shared types; no HTTP framework
//! dependencies. The service crate wraps these with axum middleware.

pub mod auth;
pub mod types;

pub use auth::{calculate_hash, validate_hash, validate_timestamp, ApiAuthError};
pub use types::{AuthQuery, ErrorResponse};
