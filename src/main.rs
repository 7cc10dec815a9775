use anyhow::{Context, Result};
use clap::Parser;
use recycle_classifier::http::UPLOADS_ROUTE;
use recycle_classifier::{
    create_router, AppState, CleanupScheduler, CommandClassifier, Config, FileBackend,
    HttpFetcher, LiveLedger, RecommendationRotator, SessionStore, UploadDir,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(version, about = "Recycling material classifier web service")]
struct Args {
    /// Config file (extension optional)
    #[arg(short, long, default_value = "config/recycle-classifier")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!("Storage root: {}", cfg.storage.root.display());
    info!(
        "Sessions expire after {}h, swept every {}s",
        cfg.sessions.retention_hours, cfg.sessions.sweep_interval_secs
    );

    let backend = FileBackend::open(cfg.storage.sessions_dir())
        .await
        .context("Failed to open session storage")?;
    let sessions = Arc::new(SessionStore::new(backend));

    let live = Arc::new(LiveLedger::new(cfg.storage.live_ledger_file()));
    live.init().await?;

    let uploads = UploadDir::open(cfg.storage.uploads_dir(), UPLOADS_ROUTE).await?;

    let state = AppState::new(
        sessions,
        live,
        RecommendationRotator::default(),
        Arc::new(CommandClassifier::from_config(&cfg.classifier)),
        Arc::new(HttpFetcher::new()?),
        uploads,
        cfg.sessions.retention_hours,
    );

    let cleanup = CleanupScheduler::new(
        state.janitor.clone(),
        Duration::from_secs(cfg.sessions.sweep_interval_secs),
    )
    .spawn();

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    cleanup.shutdown().await;
    info!("Shut down cleanly");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
