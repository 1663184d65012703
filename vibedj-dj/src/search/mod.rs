//! Media search backends
//!
//! The track resolver hands a backend-specific directive to a
//! [`SearchBackend`] and gets raw newline-delimited output back.

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub mod yt_dlp;

pub use yt_dlp::YtDlpBackend;

/// Listing options passed alongside the directive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// Print identifiers only, one per line
    pub ids_only: bool,
    /// Do not descend into playlists/channels found in the results
    pub flat_listing: bool,
    /// Maximum number of results requested
    pub limit: usize,
}

impl SearchOptions {
    /// Identifier-only, flat top-`limit` listing
    pub fn top(limit: usize) -> Self {
        Self {
            ids_only: true,
            flat_listing: true,
            limit,
        }
    }
}

/// Search backend errors
#[derive(Debug, Error)]
pub enum SearchError {
    /// Backend executable not found
    #[error("Search backend binary not found: {0}")]
    BinaryNotFound(PathBuf),

    /// Backend process could not be started or awaited
    #[error("Failed to run search backend: {0}")]
    ExecutionError(String),

    /// Backend exited unsuccessfully
    #[error("Search backend failed (exit status {status:?}): {stderr}")]
    Failed { status: Option<i32>, stderr: String },

    /// Backend did not finish within its own timeout
    #[error("Search backend timed out after {0:?}")]
    Timeout(Duration),

    /// Backend output was not valid UTF-8
    #[error("Search backend produced invalid output: {0}")]
    InvalidOutput(String),
}

/// Media search capability used by the track resolver
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Backend identifier for logs (e.g. "yt-dlp")
    fn backend_name(&self) -> &'static str;

    /// Backend-specific "search top-N for query" directive
    fn search_directive(&self, query: &str, limit: usize) -> String;

    /// Run the directive and return raw stdout
    async fn search(&self, directive: &str, options: SearchOptions) -> Result<String, SearchError>;
}
