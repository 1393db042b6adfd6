//! Pure computation core: scoring rules, calibration buckets and grouped
//! statistics. Nothing in here performs I/O or keeps state between calls.

pub mod calibration;
pub mod histogram;
pub mod percentile;
pub mod relative;
pub mod scoring;
pub mod summary;

pub use calibration::{calculate_calibration_points, CalibrationOptions};
pub use histogram::{close_date_histogram, DateBin};
pub use percentile::{percentile, quartiles, round_sf, sort_finite, Quartiles};
pub use relative::{question_resolutions, relative_daily_scores, relative_market_scores};
pub use scoring::{score_market, score_markets, ScoreBasis, ScoreType, ScoringRule};
pub use summary::{
    summarize, summarize_by, summarize_market_scores, summarize_relative_scores, summarize_scores,
    GroupBy,
};
