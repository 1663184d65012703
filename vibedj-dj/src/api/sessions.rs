//! Playback session endpoints

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, ValidationError};
use crate::models::Playlist;
use crate::playback::{PlaybackSnapshot, StepOutcome};
use crate::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct InstallPlaylistRequest {
    pub playlist: Playlist,
}

type SessionPath = std::result::Result<Path<Uuid>, PathRejection>;

fn session_id(path: SessionPath) -> Result<Uuid> {
    let Path(id) = path.map_err(|e| ValidationError::new(e.body_text()))?;
    Ok(id)
}

/// POST /sessions
///
/// 503 once the configured session cap is reached.
pub async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<CreateSessionResponse>)> {
    let handle = state.sessions.create().await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id: handle.session_id(),
        }),
    ))
}

/// GET /sessions/:id
pub async fn get_session(
    State(state): State<AppState>,
    path: SessionPath,
) -> Result<Json<PlaybackSnapshot>> {
    let handle = state.sessions.get(session_id(path)?).await?;
    Ok(Json(handle.snapshot().await?))
}

/// DELETE /sessions/:id
pub async fn delete_session(State(state): State<AppState>, path: SessionPath) -> Result<StatusCode> {
    state.sessions.remove(session_id(path)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /sessions/:id/playlist
pub async fn install_playlist(
    State(state): State<AppState>,
    path: SessionPath,
    body: std::result::Result<Json<InstallPlaylistRequest>, JsonRejection>,
) -> Result<Json<PlaybackSnapshot>> {
    let handle = state.sessions.get(session_id(path)?).await?;
    let Json(request) = body.map_err(|e| ValidationError::new(e.body_text()))?;
    Ok(Json(handle.install(request.playlist).await?))
}

/// POST /sessions/:id/toggle
pub async fn toggle(
    State(state): State<AppState>,
    path: SessionPath,
) -> Result<Json<PlaybackSnapshot>> {
    let handle = state.sessions.get(session_id(path)?).await?;
    Ok(Json(handle.toggle().await?))
}

/// POST /sessions/:id/skip
pub async fn skip(State(state): State<AppState>, path: SessionPath) -> Result<Json<StepOutcome>> {
    let handle = state.sessions.get(session_id(path)?).await?;
    Ok(Json(handle.skip().await?))
}

/// Body for POST /sessions/:id/track-failed (optional)
#[derive(Debug, Default, Deserialize)]
pub struct TrackFailedRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

/// POST /sessions/:id/track-failed
///
/// Remote players report a track that could not be loaded or played; the
/// session moves on as if it had been skipped.
pub async fn track_failed(
    State(state): State<AppState>,
    path: SessionPath,
    body: Option<Json<TrackFailedRequest>>,
) -> Result<Json<StepOutcome>> {
    let handle = state.sessions.get(session_id(path)?).await?;
    let request = body.map(|Json(request)| request).unwrap_or_default();
    Ok(Json(handle.track_failed(request.reason).await?))
}

/// POST /sessions/:id/track-ended
///
/// Remote players report the end of the current track here.
pub async fn track_ended(
    State(state): State<AppState>,
    path: SessionPath,
) -> Result<Json<StepOutcome>> {
    let handle = state.sessions.get(session_id(path)?).await?;
    Ok(Json(handle.track_ended().await?))
}
