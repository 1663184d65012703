//! Error types for vibedj-dj
//!
//! Each component owns its error enum; [`Error`] gathers the ones that can
//! reach an HTTP caller and maps them onto status codes. Generation failures
//! are deliberately absent: the translator recovers from them locally.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::{error, warn};
use vibedj_common::api::ErrorResponse;

use crate::playback::PlaybackError;
use crate::services::pipeline::RecommendationError;

/// Missing or malformed caller input; the pipeline is never invoked
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

/// Errors surfaced by HTTP handlers
#[derive(Debug, Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Recommendation(#[from] RecommendationError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),
}

/// Convenience Result type using vibedj-dj Error
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Recommendation(RecommendationError::Validation(_)) => StatusCode::BAD_REQUEST,
            Error::Recommendation(RecommendationError::Resolution(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Error::Recommendation(RecommendationError::Timeout { .. }) => {
                StatusCode::GATEWAY_TIMEOUT
            }
            Error::Playback(PlaybackError::SessionNotFound(_)) => StatusCode::NOT_FOUND,
            Error::Playback(PlaybackError::InvalidTransition { .. }) => StatusCode::CONFLICT,
            Error::Playback(PlaybackError::SessionLimitReached { .. }) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Error::Playback(PlaybackError::DriverClosed) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn to_response_body(&self) -> ErrorResponse {
        match self {
            Error::Validation(e) | Error::Recommendation(RecommendationError::Validation(e)) => {
                ErrorResponse::with_details("Bad Request", e.message())
            }
            Error::Recommendation(e @ RecommendationError::Resolution(_)) => {
                ErrorResponse::with_details("Internal Server Error", e.to_string())
            }
            Error::Recommendation(e @ RecommendationError::Timeout { .. }) => {
                ErrorResponse::with_details("Recommendation timed out", e.to_string())
            }
            Error::Playback(e @ PlaybackError::SessionNotFound(_)) => {
                ErrorResponse::with_details("Not Found", e.to_string())
            }
            Error::Playback(e @ PlaybackError::InvalidTransition { .. }) => {
                ErrorResponse::with_details("Conflict", e.to_string())
            }
            Error::Playback(e @ PlaybackError::SessionLimitReached { .. }) => {
                ErrorResponse::with_details("Service Unavailable", e.to_string())
            }
            Error::Playback(e @ PlaybackError::DriverClosed) => {
                ErrorResponse::with_details("Internal Server Error", e.to_string())
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status = status.as_u16(), "Request failed: {}", self);
        } else {
            warn!(status = status.as_u16(), "Request rejected: {}", self);
        }
        (status, Json(self.to_response_body())).into_response()
    }
}
