use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clipstream_core::{
    load_config, validate_config, ArtifactStore, FfmpegTranscoder, S3Store,
    SqliteVideoRepository, Transcoder, VideoPipeline, VideoRepository,
};

use clipstream_server::api::create_router;
use clipstream_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("CLIPSTREAM_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);
    info!("Storage bucket: {}", config.storage.bucket);

    // Create SQLite video repository
    let repository: Arc<dyn VideoRepository> = Arc::new(
        SqliteVideoRepository::new(&config.database.path)
            .context("Failed to create video repository")?,
    );
    info!("Video repository initialized");

    // Create the S3 artifact store
    let store: Arc<dyn ArtifactStore> = Arc::new(S3Store::new(config.storage.clone()).await);
    if let Err(e) = store.validate().await {
        // The bucket may come up after us; jobs fail individually until then.
        warn!("Artifact store validation failed: {}", e);
    } else {
        info!("Artifact store validated (bucket: {})", config.storage.bucket);
    }

    // Create the FFmpeg transcoder
    let transcoder: Arc<dyn Transcoder> =
        Arc::new(FfmpegTranscoder::new(config.transcoder.clone()));
    transcoder
        .validate()
        .await
        .context("Transcoder validation failed")?;
    info!("Transcoder validated ({})", transcoder.name());

    // Create and start the pipeline
    let pipeline = Arc::new(VideoPipeline::new(
        config.pipeline.clone(),
        Arc::clone(&transcoder),
        Arc::clone(&store),
        Arc::clone(&repository),
    ));
    pipeline.start().await;
    info!("Pipeline started ({} workers)", config.pipeline.workers);

    // Requeue staged uploads left behind by an unclean shutdown
    let requeued = pipeline.recover_staged_jobs().await;
    if requeued > 0 {
        info!("Requeued {} staged jobs from previous run", requeued);
    }

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        repository,
        store,
        Arc::clone(&pipeline),
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Let in-flight jobs finish before exiting
    info!("Server shutting down...");
    pipeline.stop().await;
    info!("Pipeline stopped");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
