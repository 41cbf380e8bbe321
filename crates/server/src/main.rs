use std::sync::Arc;

use anyhow::Context;
use cinedex_probe::Ffprobe;
use cinedex_scanner::{ScanJobs, Scanner, Sha256Hasher};
use cinedex_server::config::ServerConfig;
use cinedex_server::state::AppState;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = ServerConfig::from_env().context("invalid configuration")?;
    info!(db_path = %config.db_path, "connecting to database");

    let pool = cinedex_db::connect(&config.db_path)
        .await
        .context("failed to connect to database")?;

    cinedex_db::migrate::run(&pool)
        .await
        .context("failed to run migrations")?;
    info!("migrations complete");

    info!(
        ffprobe = %config.ffprobe_path.display(),
        missing_retention_secs = config.missing_retention.map(|d| d.as_secs()),
        "scanner configured"
    );
    let scanner = Scanner::new(
        pool.clone(),
        Arc::new(Ffprobe::new(config.ffprobe_path.clone())),
        Arc::new(Sha256Hasher),
        config.scan_config(),
    );

    let app_state = AppState {
        db: pool,
        scanner: Arc::new(scanner),
        jobs: ScanJobs::new(),
    };

    let app = cinedex_server::routes::build_router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "server listening");

    axum::serve(listener, app).await?;
    Ok(())
}
