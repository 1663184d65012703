//! vibedj-dj - Vibe DJ service
//!
//! Turns free-text moods into playlists and drives playback sessions over
//! HTTP + SSE.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vibedj_common::config::{ConfigResolver, LoggingConfig, TomlConfig};
use vibedj_common::events::EventBus;

use vibedj_dj::generation::build_generation_service;
use vibedj_dj::search::YtDlpBackend;
use vibedj_dj::services::{QueryTranslator, RecommendationPipeline, TrackResolver};
use vibedj_dj::{build_router, AppState, TrackLimits};

/// Command-line arguments for vibedj-dj
#[derive(Parser, Debug)]
#[command(name = "vibedj-dj")]
#[command(about = "Vibe DJ recommendation and playback service")]
#[command(version)]
struct Args {
    /// Config file (overrides VIBEDJ_CONFIG and platform config locations)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind (overrides config file)
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let resolver = ConfigResolver::new(args.config.clone());
    let requested_source = resolver.resolve();
    let (mut config, source) = resolver
        .load()
        .with_context(|| format!("Failed to load configuration from {}", requested_source))?;

    init_tracing(&config.logging)?;

    info!(
        "Starting Vibe DJ (vibedj-dj) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    if source != requested_source {
        warn!("Config file from {} not found", requested_source);
    }
    info!("Configuration: {}", source);

    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(bind) = args.bind {
        config.bind_address = bind;
    }

    let event_bus = EventBus::new(256);
    let pipeline = build_pipeline(&config, event_bus.clone());

    if config.auth.shared_secret == 0 {
        info!("API authentication disabled (shared_secret = 0)");
    }

    let state = AppState::new(pipeline, event_bus, config.auth.shared_secret)
        .with_limits(TrackLimits::from_config(&config))
        .with_max_sessions(config.max_sessions);
    let sessions = state.sessions.clone();
    let app = build_router(state);

    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("vibedj-dj listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    sessions.close_all().await;
    info!("vibedj-dj stopped");

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("Invalid log level")?;

    let registry = tracing_subscriber::registry().with(filter);

    match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .init();
        }
        None => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    Ok(())
}

/// Wire generation client, search backend and deadline into a pipeline
///
/// A generation client that cannot be built (usually a missing API key)
/// degrades to using vibes verbatim rather than failing startup.
fn build_pipeline(config: &TomlConfig, event_bus: EventBus) -> RecommendationPipeline {
    let translator = match build_generation_service(&config.generation) {
        Ok(Some(service)) => {
            info!(
                provider = service.provider_name(),
                "Generation service configured"
            );
            QueryTranslator::new(service)
        }
        Ok(None) => {
            info!("Generation disabled, vibes are used verbatim as search queries");
            QueryTranslator::passthrough()
        }
        Err(e) => {
            warn!(
                "Generation service unavailable ({}), vibes are used verbatim as search queries",
                e
            );
            QueryTranslator::passthrough()
        }
    };

    let backend = YtDlpBackend::from_config(&config.search);
    info!(binary = %backend.binary().display(), "Search backend: yt-dlp");

    RecommendationPipeline::new(
        translator,
        TrackResolver::new(Arc::new(backend)),
        config.request_timeout(),
        event_bus,
    )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}

