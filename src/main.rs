use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use calibration_stats::api::{router, ApiState};
use calibration_stats::config::Config;
use calibration_stats::db;
use calibration_stats::db::loader::market_count;
use calibration_stats::error::Result;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    // --- Database setup ---
    let pool = db::connect(&cfg.db_path).await?;
    let markets = market_count(&pool).await?;
    info!("Database ready at {} ({markets} markets)", cfg.db_path);
    if markets == 0 {
        warn!("Snapshot is empty: every endpoint will return empty results. Load one with the `import` binary (SNAPSHOT_DIR={}).", cfg.snapshot_dir);
    }

    // --- HTTP API server ---
    let app = router(ApiState::new(pool, cfg.bucket_count));
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(
        bucket_count = cfg.bucket_count,
        "HTTP API listening on {bind_addr}"
    );

    axum::serve(listener, app).await?;

    Ok(())
}
