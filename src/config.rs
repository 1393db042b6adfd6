use crate::error::{AppError, Result};

/// Number of equal-width calibration buckets over [0, 1].
/// Odd so that 0.5 sits at a bucket center rather than on a boundary.
pub const DEFAULT_BUCKET_COUNT: usize = 11;

/// Upper bound accepted for a requested bucket count.
pub const MAX_BUCKET_COUNT: usize = 100;

/// Probabilities are clamped to [EPS, 1 - EPS] before taking logarithms.
pub const LOG_PROB_EPSILON: f64 = 1e-9;

/// Tukey fence multiplier for box-plot whiskers.
pub const WHISKER_IQR_FACTOR: f64 = 1.5;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub db_path: String,
    pub api_port: u16,
    /// Directory holding the JSON snapshot files read by the importer (SNAPSHOT_DIR)
    pub snapshot_dir: String,
    /// Bucket count used when a request does not name one (CALIBRATION_BUCKET_COUNT)
    pub bucket_count: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bucket_count = get("CALIBRATION_BUCKET_COUNT")
            .unwrap_or_else(|| DEFAULT_BUCKET_COUNT.to_string())
            .parse::<usize>()
            .map_err(|_| {
                AppError::Config("CALIBRATION_BUCKET_COUNT must be a positive integer".to_string())
            })?;
        if bucket_count == 0 || bucket_count > MAX_BUCKET_COUNT {
            return Err(AppError::Config(format!(
                "CALIBRATION_BUCKET_COUNT must be between 1 and {MAX_BUCKET_COUNT}"
            )));
        }

        Ok(Self {
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            db_path: get("DB_PATH").unwrap_or_else(|| "calibration.db".to_string()),
            api_port: get("API_PORT")
                .unwrap_or_else(|| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            snapshot_dir: get("SNAPSHOT_DIR").unwrap_or_else(|| "snapshot".to_string()),
            bucket_count,
        })
    }
}
