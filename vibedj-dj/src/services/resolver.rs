//! Track Resolver
//!
//! Runs a bounded top-K search and extracts track identifiers from the raw
//! backend output. Unlike the translator, failures here are surfaced: an
//! empty playlist is a terminal, user-visible outcome.

use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{SearchQuery, TrackId};
use crate::search::{SearchBackend, SearchError, SearchOptions};

/// Default number of tracks requested
pub const DEFAULT_LIMIT: usize = 5;

/// Track resolution errors
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// Backend failed, timed out, or could not be run
    #[error("Search backend error: {0}")]
    Backend(#[from] SearchError),

    /// Backend succeeded but printed nothing at all
    #[error("Search backend returned no output for query '{query}'")]
    EmptyOutput { query: String },
}

/// Split raw backend output into track identifiers
///
/// Drops empty lines and tokens of five characters or fewer; keeps backend
/// order (assumed relevance-ranked). Duplicates are kept.
pub fn parse_track_ids(raw: &str) -> Vec<TrackId> {
    raw.lines().filter_map(TrackId::parse).collect()
}

/// Query → track identifiers resolver
#[derive(Clone)]
pub struct TrackResolver {
    backend: Arc<dyn SearchBackend>,
}

impl TrackResolver {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self { backend }
    }

    /// Resolve up to `limit` tracks for `query`
    ///
    /// `limit` must be at least 1; the pipeline validates it.
    pub async fn resolve(
        &self,
        query: &SearchQuery,
        limit: usize,
    ) -> Result<Vec<TrackId>, ResolutionError> {
        let directive = self.backend.search_directive(query.as_str(), limit);
        let started = Instant::now();

        let raw = self
            .backend
            .search(&directive, SearchOptions::top(limit))
            .await?;

        debug!(
            backend = self.backend.backend_name(),
            bytes = raw.len(),
            "Search backend output received"
        );

        if raw.trim().is_empty() {
            return Err(ResolutionError::EmptyOutput {
                query: query.as_str().to_string(),
            });
        }

        let mut track_ids = parse_track_ids(&raw);
        track_ids.truncate(limit);

        info!(
            backend = self.backend.backend_name(),
            query = %query,
            track_count = track_ids.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Resolved tracks"
        );

        Ok(track_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    struct CannedBackend {
        output: Result<&'static str, ()>,
        seen: Mutex<Vec<(String, SearchOptions)>>,
    }

    impl CannedBackend {
        fn ok(output: &'static str) -> Arc<Self> {
            Arc::new(Self {
                output: Ok(output),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                output: Err(()),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl SearchBackend for CannedBackend {
        fn backend_name(&self) -> &'static str {
            "canned"
        }

        fn search_directive(&self, query: &str, limit: usize) -> String {
            format!("top{}:{}", limit, query)
        }

        async fn search(
            &self,
            directive: &str,
            options: SearchOptions,
        ) -> Result<String, SearchError> {
            self.seen
                .lock()
                .unwrap()
                .push((directive.to_string(), options));
            match self.output {
                Ok(text) => Ok(text.to_string()),
                Err(()) => Err(SearchError::Timeout(Duration::from_secs(1))),
            }
        }
    }

    fn query(text: &str) -> SearchQuery {
        SearchQuery::new(text).unwrap()
    }

    #[test]
    fn test_parse_drops_short_and_empty_lines() {
        let ids = parse_track_ids("abc123\nxy\n\nlongid456\n");
        let ids: Vec<&str> = ids.iter().map(TrackId::as_str).collect();
        assert_eq!(ids, vec!["abc123", "longid456"]);
    }

    #[test]
    fn test_parse_keeps_order_and_duplicates() {
        let ids = parse_track_ids("zzzzzz1\r\naaaaaa2\nzzzzzz1\n");
        let ids: Vec<&str> = ids.iter().map(TrackId::as_str).collect();
        assert_eq!(ids, vec!["zzzzzz1", "aaaaaa2", "zzzzzz1"]);
    }

    #[tokio::test]
    async fn test_resolve_passes_directive_and_options() {
        let backend = CannedBackend::ok("5rXQe8Q5h_w\nhT_nvWreIhg\n");
        let resolver = TrackResolver::new(backend.clone());

        let ids = resolver.resolve(&query("lofi"), 5).await.unwrap();

        assert_eq!(ids.len(), 2);
        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen[0].0, "top5:lofi");
        assert_eq!(seen[0].1, SearchOptions::top(5));
        assert!(seen[0].1.ids_only && seen[0].1.flat_listing);
    }

    #[tokio::test]
    async fn test_resolve_truncates_to_limit() {
        let backend = CannedBackend::ok("aaaaaa1\naaaaaa2\naaaaaa3\naaaaaa4\n");
        let ids = TrackResolver::new(backend)
            .resolve(&query("x"), 2)
            .await
            .unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[1].as_str(), "aaaaaa2");
    }

    #[tokio::test]
    async fn test_empty_output_is_an_error() {
        let result = TrackResolver::new(CannedBackend::ok("  \n"))
            .resolve(&query("nothing"), 5)
            .await;
        assert!(matches!(result, Err(ResolutionError::EmptyOutput { .. })));
    }

    #[tokio::test]
    async fn test_only_noise_is_an_empty_result() {
        let ids = TrackResolver::new(CannedBackend::ok("ab\ncd\n"))
            .resolve(&query("noise"), 5)
            .await
            .unwrap();
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn test_backend_failure_surfaces() {
        let result = TrackResolver::new(CannedBackend::failing())
            .resolve(&query("anything"), 5)
            .await;
        assert!(matches!(
            result,
            Err(ResolutionError::Backend(SearchError::Timeout(_)))
        ));
    }
}
