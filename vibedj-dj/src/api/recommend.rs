//! Recommendation endpoint
//!
//! `POST /recommend` (and `/api/dj/recommend`): `{vibe, limit?}` →
//! `{playlist, query}`.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;

use crate::error::{Result, ValidationError};
use crate::models::Vibe;
use crate::services::Recommendation;
use crate::AppState;

/// Request body; auth fields alongside are ignored here
#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    #[serde(default)]
    pub vibe: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

pub async fn recommend(
    State(state): State<AppState>,
    body: std::result::Result<Json<RecommendRequest>, JsonRejection>,
) -> Result<Json<Recommendation>> {
    let Json(request) = body.map_err(|e| ValidationError::new(e.body_text()))?;

    let vibe = Vibe::new(request.vibe.unwrap_or_default())?;
    let limit = request.limit.unwrap_or(state.limits.default_limit);
    if limit == 0 || limit > state.limits.max_limit {
        return Err(ValidationError::new(format!(
            "limit must be between 1 and {}",
            state.limits.max_limit
        ))
        .into());
    }

    tracing::info!(vibe = %vibe, limit, "Recommendation requested");

    let recommendation = state.pipeline.recommend(&vibe, limit).await?;
    Ok(Json(recommendation))
}
