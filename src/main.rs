//! Sentra - Predictive Maintenance Telemetry Server
//!
//! Serves the dashboard API over uploaded sensor exports: report storage,
//! derived statistics, live playback, and the insight proxy.
//!
//! # Usage
//!
//! ```bash
//! # Run with defaults (sled database under ./data)
//! cargo run --release
//!
//! # Seed the dashboard with a starting dataset on first run
//! cargo run --release -- --preload fixtures/cooldown.csv
//! ```
//!
//! # Environment Variables
//!
//! - `SENTRA_CONFIG`: Path to a TOML config file
//! - `SENTRA_AUTH_TOKENS`: Comma-separated session tokens
//! - `SENTRA_INSIGHT_API_KEY`: Upstream text-generation key
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use sentra::api::{create_app, DashboardState};
use sentra::auth::StaticSessionProvider;
use sentra::config::Config;
use sentra::insight::InsightClient;
use sentra::playback::{self, PlaybackDriver};
use sentra::store::{ReportStore, SledKv};
use sentra::types::{Parameter, Report};

#[derive(Parser, Debug)]
#[command(name = "sentra")]
#[command(about = "Sentra Predictive Maintenance Telemetry Server")]
#[command(version)]
struct CliArgs {
    /// Override the server bind address (default: "0.0.0.0:8080")
    #[arg(short, long)]
    addr: Option<String>,

    /// Override the report database directory
    #[arg(long)]
    data_dir: Option<String>,

    /// CSV/XLSX file applied as the starting temperature dataset when no
    /// prior uploads exist
    #[arg(long)]
    preload: Option<String>,

    /// Wipe the report database on startup.
    /// WARNING: This is destructive and cannot be undone!
    #[arg(long)]
    reset_db: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();
    let mut config = Config::load();
    if let Some(addr) = args.addr {
        config.server.addr = addr;
    }
    if let Some(dir) = args.data_dir {
        config.storage.data_dir = dir.into();
    }

    if args.reset_db && config.storage.data_dir.exists() {
        warn!(path = %config.storage.data_dir.display(), "resetting report database");
        std::fs::remove_dir_all(&config.storage.data_dir)
            .context("failed to reset report database")?;
    }

    let kv = SledKv::open(&config.storage.data_dir)
        .with_context(|| format!("failed to open database at {}", config.storage.data_dir.display()))?;
    let reports = Arc::new(ReportStore::load(Arc::new(kv)));

    let sessions = Arc::new(StaticSessionProvider::new(config.auth.tokens.clone()));
    if sessions.is_empty() {
        warn!("no auth tokens configured; dashboard routes will reject every request");
    }

    let playback_driver = Arc::new(RwLock::new(PlaybackDriver::new()));
    seed_playback(&args.preload, &reports, &playback_driver).await?;

    let insight = Arc::new(InsightClient::new(
        config.insight.endpoint.clone(),
        config.insight.api_key.clone(),
    ));

    let state = DashboardState {
        reports,
        playback: playback_driver.clone(),
        sessions,
        insight,
    };

    // Playback tick loop, cancelled on shutdown so no tick can run
    // against torn-down state.
    let cancel = CancellationToken::new();
    let playback_task = tokio::spawn(playback::run(playback_driver, cancel.clone()));

    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(&config.server.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.addr))?;
    info!(addr = %config.server.addr, "sentra listening");

    let shutdown = cancel.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
            shutdown.cancel();
        })
        .await
        .context("server error")?;

    cancel.cancel();
    let _ = playback_task.await;
    info!("sentra stopped");
    Ok(())
}

/// Choose the startup series: the most recent stored temperature report,
/// or the `--preload` file when the store is empty.
async fn seed_playback(
    preload: &Option<String>,
    reports: &Arc<ReportStore>,
    playback: &Arc<RwLock<PlaybackDriver>>,
) -> Result<()> {
    if let Some(latest) = reports.latest(Parameter::Temperature) {
        info!(file = %latest.file_name, points = latest.data_points, "resuming latest temperature upload");
        playback.write().await.apply_series(latest.series());
        return Ok(());
    }

    let Some(path) = preload else {
        return Ok(());
    };

    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read preload file {}", path))?;
    let file_name = std::path::Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path.as_str());

    match sentra::ingest::ingest(file_name, &bytes) {
        Ok(parsed) => {
            let report = Report::new(Parameter::Temperature, file_name, None, &parsed.series);
            if let Err(e) = reports.add(report) {
                warn!(error = %e, "could not persist preload report");
            }
            info!(file = file_name, points = parsed.series.len(), "preload dataset applied");
            playback.write().await.apply_series(parsed.series);
        }
        Err(e) => warn!(error = %e, "preload file could not be parsed; starting without data"),
    }

    Ok(())
}
