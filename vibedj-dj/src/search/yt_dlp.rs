//! yt-dlp search backend
//!
//! Runs the yt-dlp command-line tool in identifier-only, flat-listing mode:
//!
//! ```text
//! yt-dlp --get-id --flat-playlist --no-warnings --default-search ytsearch5 -- "ytsearch5:<query>"
//! ```
//!
//! The child is spawned with kill-on-drop, so a caller that abandons the
//! future (request deadline) also terminates the process.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use vibedj_common::config::SearchConfig;

use super::{SearchBackend, SearchError, SearchOptions};

/// Longest stderr excerpt carried in [`SearchError::Failed`]
const MAX_STDERR_CHARS: usize = 512;

/// yt-dlp subprocess backend
pub struct YtDlpBackend {
    binary: PathBuf,
    timeout: Duration,
    extra_args: Vec<String>,
}

impl YtDlpBackend {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
            extra_args: Vec::new(),
        }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            timeout: config.timeout(),
            extra_args: config.extra_args.clone(),
        }
    }

    pub fn with_extra_args(mut self, extra_args: Vec<String>) -> Self {
        self.extra_args = extra_args;
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Command-line arguments for one search
    pub fn build_args(&self, directive: &str, options: SearchOptions) -> Vec<String> {
        let mut args = Vec::with_capacity(8 + self.extra_args.len());
        if options.ids_only {
            args.push("--get-id".to_string());
        }
        if options.flat_listing {
            args.push("--flat-playlist".to_string());
        }
        args.push("--no-warnings".to_string());
        args.push("--default-search".to_string());
        args.push(format!("ytsearch{}", options.limit));
        args.extend(self.extra_args.iter().cloned());
        // Queries starting with '-' must not be read as options
        args.push("--".to_string());
        args.push(directive.to_string());
        args
    }
}

#[async_trait]
impl SearchBackend for YtDlpBackend {
    fn backend_name(&self) -> &'static str {
        "yt-dlp"
    }

    fn search_directive(&self, query: &str, limit: usize) -> String {
        format!("ytsearch{}:{}", limit, query)
    }

    async fn search(&self, directive: &str, options: SearchOptions) -> Result<String, SearchError> {
        let args = self.build_args(directive, options);

        tracing::debug!(
            binary = %self.binary.display(),
            directive = %directive,
            limit = options.limit,
            "Running yt-dlp search"
        );

        let child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => SearchError::BinaryNotFound(self.binary.clone()),
                _ => SearchError::ExecutionError(e.to_string()),
            })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| SearchError::Timeout(self.timeout))?
            .map_err(|e| SearchError::ExecutionError(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr: String = stderr.trim().chars().take(MAX_STDERR_CHARS).collect();
            return Err(SearchError::Failed {
                status: output.status.code(),
                stderr,
            });
        }

        String::from_utf8(output.stdout).map_err(|e| SearchError::InvalidOutput(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_embeds_limit() {
        let backend = YtDlpBackend::new("yt-dlp", Duration::from_secs(5));
        assert_eq!(
            backend.search_directive("lofi hip hop radio", 5),
            "ytsearch5:lofi hip hop radio"
        );
    }

    #[test]
    fn test_args_for_top_listing() {
        let backend = YtDlpBackend::new("yt-dlp", Duration::from_secs(5));
        let args = backend.build_args("ytsearch3:synthwave", SearchOptions::top(3));
        assert_eq!(
            args,
            vec![
                "--get-id",
                "--flat-playlist",
                "--no-warnings",
                "--default-search",
                "ytsearch3",
                "--",
                "ytsearch3:synthwave",
            ]
        );
    }

    #[test]
    fn test_extra_args_precede_directive() {
        let backend = YtDlpBackend::new("yt-dlp", Duration::from_secs(5))
            .with_extra_args(vec!["--socket-timeout".to_string(), "5".to_string()]);
        let args = backend.build_args("ytsearch1:jazz", SearchOptions::top(1));
        let separator = args.iter().position(|a| a == "--").unwrap();
        assert_eq!(&args[separator - 2..separator], ["--socket-timeout", "5"]);
        assert_eq!(args.last().unwrap(), "ytsearch1:jazz");
    }

    #[test]
    fn test_from_config() {
        let config = SearchConfig {
            binary: PathBuf::from("/opt/yt-dlp"),
            timeout_secs: 7,
            extra_args: vec![],
        };
        let backend = YtDlpBackend::from_config(&config);
        assert_eq!(backend.binary(), Path::new("/opt/yt-dlp"));
        assert_eq!(backend.timeout, Duration::from_secs(7));
    }
}
