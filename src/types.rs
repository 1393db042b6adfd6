use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

// ---------------------------------------------------------------------------
// Market
// ---------------------------------------------------------------------------

/// One prediction market on one platform, as served by the `/markets` endpoint.
/// Every numeric attribute is optional: platforms publish different subsets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Market {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    pub platform_slug: String,
    #[serde(default)]
    pub category_slug: Option<String>,
    #[serde(default)]
    pub open_datetime: Option<DateTime<Utc>>,
    #[serde(default)]
    pub close_datetime: Option<DateTime<Utc>>,
    /// 0 or 1 for binary markets, fractional for PROB resolutions.
    #[serde(default)]
    pub resolution: Option<f64>,
    #[serde(default)]
    pub traders_count: Option<i64>,
    #[serde(default)]
    pub volume_usd: Option<f64>,
    #[serde(default)]
    pub duration_days: Option<f64>,
    #[serde(default)]
    pub prob_at_midpoint: Option<f64>,
    #[serde(default)]
    pub prob_at_close: Option<f64>,
    #[serde(default)]
    pub prob_time_avg: Option<f64>,
    #[serde(default)]
    pub prob_before_close_24h: Option<f64>,
    #[serde(default)]
    pub prob_before_close_30d: Option<f64>,
    #[serde(default)]
    pub prob_before_close_90d: Option<f64>,
    #[serde(default)]
    pub prob_before_close_365d: Option<f64>,
    #[serde(default)]
    pub prob_after_start_24h: Option<f64>,
    #[serde(default)]
    pub question_id: Option<i64>,
    #[serde(default)]
    pub question_invert: bool,
}

// ---------------------------------------------------------------------------
// Question / daily probabilities / precomputed scores
// ---------------------------------------------------------------------------

/// Cross-platform grouping of equivalent markets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub category_slug: Option<String>,
    #[serde(default)]
    pub start_date_override: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date_override: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_traders: Option<i64>,
    #[serde(default)]
    pub total_volume: Option<f64>,
    #[serde(default)]
    pub total_duration: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyProbability {
    pub date: NaiveDate,
    pub platform_slug: String,
    pub question_id: i64,
    #[serde(default)]
    pub question_invert: bool,
    pub prob: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketScore {
    pub market_id: String,
    pub platform_slug: String,
    pub score_type: String,
    pub score: f64,
    #[serde(default)]
    pub resolution: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Platform {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub color_primary: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub slug: String,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Criterion — which probability sample to read from a market
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Criterion {
    Midpoint,
    Close,
    TimeAverage,
    #[serde(rename = "before-close-hours-24")]
    BeforeCloseHours24,
    #[serde(rename = "before-close-days-30")]
    BeforeCloseDays30,
    #[serde(rename = "before-close-days-90")]
    BeforeCloseDays90,
    #[serde(rename = "before-close-days-365")]
    BeforeCloseDays365,
    #[serde(rename = "after-start-hours-24")]
    AfterStartHours24,
}

impl Criterion {
    pub const ALL: [Criterion; 8] = [
        Criterion::Midpoint,
        Criterion::Close,
        Criterion::TimeAverage,
        Criterion::BeforeCloseHours24,
        Criterion::BeforeCloseDays30,
        Criterion::BeforeCloseDays90,
        Criterion::BeforeCloseDays365,
        Criterion::AfterStartHours24,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Criterion::Midpoint => "midpoint",
            Criterion::Close => "close",
            Criterion::TimeAverage => "time-average",
            Criterion::BeforeCloseHours24 => "before-close-hours-24",
            Criterion::BeforeCloseDays30 => "before-close-days-30",
            Criterion::BeforeCloseDays90 => "before-close-days-90",
            Criterion::BeforeCloseDays365 => "before-close-days-365",
            Criterion::AfterStartHours24 => "after-start-hours-24",
        }
    }

    /// The market's probability at this reference point, if it was sampled.
    pub fn select(&self, market: &Market) -> Option<f64> {
        match self {
            Criterion::Midpoint => market.prob_at_midpoint,
            Criterion::Close => market.prob_at_close,
            Criterion::TimeAverage => market.prob_time_avg,
            Criterion::BeforeCloseHours24 => market.prob_before_close_24h,
            Criterion::BeforeCloseDays30 => market.prob_before_close_30d,
            Criterion::BeforeCloseDays90 => market.prob_before_close_90d,
            Criterion::BeforeCloseDays365 => market.prob_before_close_365d,
            Criterion::AfterStartHours24 => market.prob_after_start_24h,
        }
    }
}

impl std::fmt::Display for Criterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Criterion {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Criterion::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| AppError::InvalidParameter(format!("unknown criterion: {s}")))
    }
}

// ---------------------------------------------------------------------------
// Weight attribute for calibration buckets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightAttribute {
    #[default]
    None,
    VolumeUsd,
    TradersCount,
    DurationDays,
    Recency,
}

impl WeightAttribute {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeightAttribute::None => "none",
            WeightAttribute::VolumeUsd => "volume_usd",
            WeightAttribute::TradersCount => "traders_count",
            WeightAttribute::DurationDays => "duration_days",
            WeightAttribute::Recency => "recency",
        }
    }
}

impl std::fmt::Display for WeightAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for WeightAttribute {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "none" => Ok(WeightAttribute::None),
            "volume_usd" => Ok(WeightAttribute::VolumeUsd),
            "traders_count" => Ok(WeightAttribute::TradersCount),
            "duration_days" => Ok(WeightAttribute::DurationDays),
            "recency" => Ok(WeightAttribute::Recency),
            other => Err(AppError::InvalidParameter(format!("unknown weight: {other}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Derived, plot-ready records
// ---------------------------------------------------------------------------

/// One non-empty calibration bucket, optionally for a single platform.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationPoint {
    pub x_start: f64,
    pub x_center: f64,
    pub x_end: f64,
    /// Weighted mean resolution of the markets in the bucket.
    pub y_center: f64,
    pub count: usize,
    pub weight_total: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

/// Box-plot statistics for one group of scores.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub group: String,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub mean: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
}

/// A score next to its value relative to peers on the same question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelativeScore {
    /// Market id for per-market scores, platform slug for per-day aggregates.
    pub key: String,
    pub question_id: i64,
    pub score: f64,
    pub relative_score: f64,
    /// Number of peer observations the relative score was averaged over.
    pub samples: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistogramBar {
    pub bin_start: NaiveDate,
    pub platform: String,
    pub count: usize,
}
