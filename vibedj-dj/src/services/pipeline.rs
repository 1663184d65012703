//! Recommendation Pipeline
//!
//! Vibe → [`QueryTranslator`] → [`TrackResolver`] → [`Recommendation`], all
//! under one deadline. Dropping the in-flight future on expiry aborts the
//! generation request and kills the search child process.

use serde::Serialize;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{error, info, warn};
use vibedj_common::events::{EventBus, RecommendationFailure, VibeEvent};

use crate::error::ValidationError;
use crate::models::{Playlist, SearchQuery, Vibe};
use crate::services::resolver::{ResolutionError, TrackResolver};
use crate::services::translator::QueryTranslator;

/// Recommendation errors surfaced to callers
#[derive(Debug, Error)]
pub enum RecommendationError {
    #[error("{0}")]
    Validation(ValidationError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("Recommendation did not finish within {deadline:?}")]
    Timeout { deadline: Duration },
}

impl RecommendationError {
    fn failure(&self) -> RecommendationFailure {
        match self {
            RecommendationError::Validation(_) => RecommendationFailure::Validation,
            RecommendationError::Resolution(_) => RecommendationFailure::Resolution,
            RecommendationError::Timeout { .. } => RecommendationFailure::Timeout,
        }
    }
}

impl From<ValidationError> for RecommendationError {
    fn from(err: ValidationError) -> Self {
        RecommendationError::Validation(err)
    }
}

/// Successful pipeline result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    /// Query actually sent to the search backend
    pub query: SearchQuery,
    /// Resolved tracks, at most `limit` of them
    pub playlist: Playlist,
    /// True when the translator fell back to the raw vibe
    #[serde(skip)]
    pub query_fallback: bool,
}

/// Translator + resolver orchestration
#[derive(Clone)]
pub struct RecommendationPipeline {
    translator: QueryTranslator,
    resolver: TrackResolver,
    deadline: Duration,
    event_bus: EventBus,
}

impl RecommendationPipeline {
    pub fn new(
        translator: QueryTranslator,
        resolver: TrackResolver,
        deadline: Duration,
        event_bus: EventBus,
    ) -> Self {
        Self {
            translator,
            resolver,
            deadline,
            event_bus,
        }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Produce up to `limit` tracks for `vibe`
    pub async fn recommend(
        &self,
        vibe: &Vibe,
        limit: usize,
    ) -> Result<Recommendation, RecommendationError> {
        let started = Instant::now();
        let result = self.run(vibe, limit).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(recommendation) => {
                info!(
                    query = %recommendation.query,
                    query_fallback = recommendation.query_fallback,
                    track_count = recommendation.playlist.len(),
                    elapsed_ms,
                    "Recommendation completed"
                );
                self.event_bus
                    .emit_lossy(VibeEvent::RecommendationCompleted {
                        query: recommendation.query.as_str().to_string(),
                        query_fallback: recommendation.query_fallback,
                        track_count: recommendation.playlist.len(),
                        elapsed_ms,
                        timestamp: vibedj_common::time::now(),
                    });
            }
            Err(e) => {
                match e {
                    RecommendationError::Validation(_) => {
                        warn!(elapsed_ms, "Recommendation rejected: {}", e)
                    }
                    _ => error!(elapsed_ms, "Recommendation failed: {}", e),
                }
                self.event_bus.emit_lossy(VibeEvent::RecommendationFailed {
                    failure: e.failure(),
                    message: e.to_string(),
                    timestamp: vibedj_common::time::now(),
                });
            }
        }

        result
    }

    async fn run(&self, vibe: &Vibe, limit: usize) -> Result<Recommendation, RecommendationError> {
        if limit == 0 {
            return Err(ValidationError::new("limit must be at least 1").into());
        }

        let work = async {
            let translation = self.translator.translate(vibe).await;
            let track_ids = self.resolver.resolve(&translation.query, limit).await?;
            Ok::<_, RecommendationError>(Recommendation {
                query: translation.query,
                playlist: Playlist::new(track_ids),
                query_fallback: translation.fallback,
            })
        };

        tokio::time::timeout(self.deadline, work)
            .await
            .map_err(|_| RecommendationError::Timeout {
                deadline: self.deadline,
            })?
    }
}
