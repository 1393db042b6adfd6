use std::path::Path;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use calibration_stats::config::Config;
use calibration_stats::db::{self, snapshot, SnapshotWriter};
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

    if let Err(e) = run(&cfg).await {
        error!("Import failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: &Config) -> Result<()> {
    let pool = db::connect(&cfg.db_path).await?;
    let writer = SnapshotWriter::new(pool);
    let stats = snapshot::import_dir(Path::new(&cfg.snapshot_dir), &writer).await?;
    info!(
        platforms = stats.platforms,
        categories = stats.categories,
        questions = stats.questions,
        markets = stats.markets,
        market_scores = stats.market_scores,
        daily_probabilities = stats.daily_probabilities,
        "Import complete: {} -> {}",
        cfg.snapshot_dir,
        cfg.db_path,
    );
    Ok(())
}
