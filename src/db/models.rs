//! Row types for the snapshot tables in migrations/0001_init.sql.
//! Columns mirror the PostgREST response shapes; nullable columns stay `Option`.

use chrono::{DateTime, NaiveDate, Utc};

use crate::types::{DailyProbability, Market, MarketScore, Question};

#[derive(Debug, sqlx::FromRow)]
pub struct MarketRow {
    pub id: String,
    pub title: String,
    pub url: Option<String>,
    pub platform_slug: String,
    pub category_slug: Option<String>,
    pub open_datetime: Option<DateTime<Utc>>,
    pub close_datetime: Option<DateTime<Utc>>,
    pub resolution: Option<f64>,
    pub traders_count: Option<i64>,
    pub volume_usd: Option<f64>,
    pub duration_days: Option<f64>,
    pub prob_at_midpoint: Option<f64>,
    pub prob_at_close: Option<f64>,
    pub prob_time_avg: Option<f64>,
    pub prob_before_close_24h: Option<f64>,
    pub prob_before_close_30d: Option<f64>,
    pub prob_before_close_90d: Option<f64>,
    pub prob_before_close_365d: Option<f64>,
    pub prob_after_start_24h: Option<f64>,
    pub question_id: Option<i64>,
    pub question_invert: bool,
}

impl From<MarketRow> for Market {
    fn from(r: MarketRow) -> Self {
        Market {
            id: r.id,
            title: r.title,
            url: r.url,
            platform_slug: r.platform_slug,
            category_slug: r.category_slug,
            open_datetime: r.open_datetime,
            close_datetime: r.close_datetime,
            resolution: r.resolution,
            traders_count: r.traders_count,
            volume_usd: r.volume_usd,
            duration_days: r.duration_days,
            prob_at_midpoint: r.prob_at_midpoint,
            prob_at_close: r.prob_at_close,
            prob_time_avg: r.prob_time_avg,
            prob_before_close_24h: r.prob_before_close_24h,
            prob_before_close_30d: r.prob_before_close_30d,
            prob_before_close_90d: r.prob_before_close_90d,
            prob_before_close_365d: r.prob_before_close_365d,
            prob_after_start_24h: r.prob_after_start_24h,
            question_id: r.question_id,
            question_invert: r.question_invert,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct QuestionRow {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub category_slug: Option<String>,
    pub start_date_override: Option<DateTime<Utc>>,
    pub end_date_override: Option<DateTime<Utc>>,
    pub total_traders: Option<i64>,
    pub total_volume: Option<f64>,
    pub total_duration: Option<f64>,
}

impl From<QuestionRow> for Question {
    fn from(r: QuestionRow) -> Self {
        Question {
            id: r.id,
            slug: r.slug,
            title: r.title,
            category_slug: r.category_slug,
            start_date_override: r.start_date_override,
            end_date_override: r.end_date_override,
            total_traders: r.total_traders,
            total_volume: r.total_volume,
            total_duration: r.total_duration,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct MarketScoreRow {
    pub market_id: String,
    pub platform_slug: String,
    pub score_type: String,
    pub score: f64,
    pub resolution: Option<f64>,
}

impl From<MarketScoreRow> for MarketScore {
    fn from(r: MarketScoreRow) -> Self {
        MarketScore {
            market_id: r.market_id,
            platform_slug: r.platform_slug,
            score_type: r.score_type,
            score: r.score,
            resolution: r.resolution,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct DailyProbabilityRow {
    pub question_id: i64,
    pub platform_slug: String,
    pub date: NaiveDate,
    pub question_invert: bool,
    pub prob: f64,
}

impl From<DailyProbabilityRow> for DailyProbability {
    fn from(r: DailyProbabilityRow) -> Self {
        DailyProbability {
            date: r.date,
            platform_slug: r.platform_slug,
            question_id: r.question_id,
            question_invert: r.question_invert,
            prob: r.prob,
        }
    }
}
