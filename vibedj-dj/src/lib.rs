//! vibedj-dj library - Vibe DJ recommendation and playback service
//!
//! A vibe goes through the query translator and the track resolver to become
//! a playlist; playback sessions drive a playlist one track at a time.

use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use vibedj_common::config::TomlConfig;
use vibedj_common::events::EventBus;

pub mod api;
pub mod error;
pub mod generation;
pub mod models;
pub mod playback;
pub mod search;
pub mod services;

pub use error::{Error, Result};

use playback::SessionRegistry;
use services::RecommendationPipeline;

/// Caller-facing bounds on the number of tracks per recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackLimits {
    /// Used when the request omits `limit`
    pub default_limit: usize,
    /// Largest `limit` a caller may request
    pub max_limit: usize,
}

impl TrackLimits {
    pub fn from_config(config: &TomlConfig) -> Self {
        Self {
            default_limit: config.default_limit,
            max_limit: config.max_limit,
        }
    }
}

impl Default for TrackLimits {
    fn default() -> Self {
        Self {
            default_limit: services::resolver::DEFAULT_LIMIT,
            max_limit: 25,
        }
    }
}

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: RecommendationPipeline,
    pub sessions: Arc<SessionRegistry>,
    pub event_bus: EventBus,
    pub limits: TrackLimits,
    /// Shared secret for API authentication; 0 disables checking
    pub shared_secret: i64,
}

impl AppState {
    pub fn new(pipeline: RecommendationPipeline, event_bus: EventBus, shared_secret: i64) -> Self {
        Self {
            pipeline,
            sessions: Arc::new(SessionRegistry::new(event_bus.clone())),
            event_bus,
            limits: TrackLimits::default(),
            shared_secret,
        }
    }

    pub fn with_limits(mut self, limits: TrackLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Cap the number of open playback sessions
    ///
    /// Call while building the state, before any session exists.
    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.sessions = Arc::new(SessionRegistry::with_max_sessions(
            self.event_bus.clone(),
            max_sessions,
        ));
        self
    }
}

/// Build application router
///
/// Health, build info, session snapshots and the event stream are public;
/// everything that starts work or changes a session requires auth.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post};

    let protected = Router::new()
        .route("/recommend", post(api::recommend))
        .route("/api/dj/recommend", post(api::recommend))
        .route("/sessions", post(api::create_session))
        .route("/sessions/:id", axum::routing::delete(api::delete_session))
        .route("/sessions/:id/playlist", post(api::install_playlist))
        .route("/sessions/:id/toggle", post(api::toggle))
        .route("/sessions/:id/skip", post(api::skip))
        .route("/sessions/:id/track-ended", post(api::track_ended))
        .route("/sessions/:id/track-failed", post(api::track_failed))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    let public = Router::new()
        .route("/api/buildinfo", get(api::get_build_info))
        .route("/sessions/:id", get(api::get_session))
        .route("/events", get(api::event_stream))
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
