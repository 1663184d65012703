//! yt-dlp backend tests against stand-in shell scripts
//!
//! Serial: writing an executable while another test forks can fail with
//! ETXTBSY.
#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use serial_test::serial;
use tempfile::TempDir;
use vibedj_common::events::EventBus;
use vibedj_dj::models::Vibe;
use vibedj_dj::search::{SearchBackend, SearchError, SearchOptions, YtDlpBackend};
use vibedj_dj::services::{QueryTranslator, RecommendationError, RecommendationPipeline, TrackResolver};

/// Write an executable `/bin/sh` script named `yt-dlp` into `dir`
fn fake_yt_dlp(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("yt-dlp");
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    let mut permissions = std::fs::metadata(&path).unwrap().permissions();
    permissions.set_mode(0o755);
    std::fs::set_permissions(&path, permissions).unwrap();
    path
}

#[tokio::test]
#[serial]
async fn test_stdout_is_returned() {
    let dir = TempDir::new().unwrap();
    let binary = fake_yt_dlp(dir.path(), "printf 'abc123\\nxy\\n\\nlongid456\\n'");
    let backend = YtDlpBackend::new(binary, Duration::from_secs(5));

    let output = backend
        .search("ytsearch5:lofi", SearchOptions::top(5))
        .await
        .unwrap();

    assert_eq!(output, "abc123\nxy\n\nlongid456\n");
}

#[tokio::test]
#[serial]
async fn test_arguments_reach_the_process() {
    let dir = TempDir::new().unwrap();
    let binary = fake_yt_dlp(dir.path(), "for arg in \"$@\"; do echo \"$arg\"; done");
    let backend = YtDlpBackend::new(binary, Duration::from_secs(5));

    let directive = backend.search_directive("-rf late night", 3);
    let output = backend
        .search(&directive, SearchOptions::top(3))
        .await
        .unwrap();

    let args: Vec<&str> = output.lines().collect();
    assert_eq!(
        args,
        vec![
            "--get-id",
            "--flat-playlist",
            "--no-warnings",
            "--default-search",
            "ytsearch3",
            "--",
            "ytsearch3:-rf late night",
        ]
    );
}

#[tokio::test]
#[serial]
async fn test_nonzero_exit_carries_stderr() {
    let dir = TempDir::new().unwrap();
    let binary = fake_yt_dlp(dir.path(), "echo 'ERROR: network unreachable' >&2\nexit 2");
    let backend = YtDlpBackend::new(binary, Duration::from_secs(5));

    match backend.search("ytsearch5:x", SearchOptions::top(5)).await {
        Err(SearchError::Failed { status, stderr }) => {
            assert_eq!(status, Some(2));
            assert_eq!(stderr, "ERROR: network unreachable");
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
#[serial]
async fn test_slow_process_times_out() {
    let dir = TempDir::new().unwrap();
    let binary = fake_yt_dlp(dir.path(), "sleep 10");
    let backend = YtDlpBackend::new(binary, Duration::from_millis(200));

    let started = Instant::now();
    let result = backend.search("ytsearch5:x", SearchOptions::top(5)).await;

    assert!(matches!(result, Err(SearchError::Timeout(_))));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
#[serial]
async fn test_missing_binary() {
    let dir = TempDir::new().unwrap();
    let backend = YtDlpBackend::new(dir.path().join("no-such-yt-dlp"), Duration::from_secs(1));

    let result = backend.search("ytsearch5:x", SearchOptions::top(5)).await;
    assert!(matches!(result, Err(SearchError::BinaryNotFound(_))));
}

/// True once `pid` has exited (gone or left as a zombie)
#[cfg(target_os = "linux")]
fn process_exited(pid: u32) -> bool {
    match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
        // State is the first field after the parenthesised command name
        Ok(stat) => stat
            .rsplit_once(')')
            .map(|(_, rest)| rest.trim_start().starts_with('Z'))
            .unwrap_or(false),
        Err(_) => true,
    }
}

#[cfg(target_os = "linux")]
#[tokio::test]
#[serial]
async fn test_deadline_kills_backend_process() {
    let dir = TempDir::new().unwrap();
    let pid_file = dir.path().join("yt-dlp.pid");
    let binary = fake_yt_dlp(
        dir.path(),
        &format!("echo $$ > '{}'\nexec sleep 30", pid_file.display()),
    );

    // Backend timeout far beyond the pipeline deadline
    let backend = YtDlpBackend::new(binary, Duration::from_secs(60));
    let pipeline = RecommendationPipeline::new(
        QueryTranslator::passthrough(),
        TrackResolver::new(Arc::new(backend)),
        Duration::from_millis(300),
        EventBus::new(8),
    );

    let result = pipeline
        .recommend(&Vibe::new("late night coding").unwrap(), 5)
        .await;
    assert!(matches!(result, Err(RecommendationError::Timeout { .. })));

    let pid: u32 = std::fs::read_to_string(&pid_file)
        .unwrap()
        .trim()
        .parse()
        .unwrap();

    let started = Instant::now();
    while !process_exited(pid) {
        assert!(
            started.elapsed() < Duration::from_secs(5),
            "yt-dlp process {pid} still running after the deadline"
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}
