use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::health::HealthState;
use crate::api::latency::{ComputeLatency, LatencySnapshot};
use crate::db::loader::{self, MarketFilter};
use crate::error::{AppError, Result};
use crate::stats::{
    calculate_calibration_points, close_date_histogram, question_resolutions, relative_daily_scores,
    relative_market_scores, summarize_market_scores, summarize_relative_scores, summarize_scores,
    CalibrationOptions, DateBin, GroupBy, ScoreBasis, ScoreType, ScoringRule,
};
use crate::types::{
    CalibrationPoint, Criterion, GroupSummary, HistogramBar, Question, RelativeScore, WeightAttribute,
};

#[derive(Clone)]
pub struct ApiState {
    pub pool: sqlx::SqlitePool,
    /// Bucket count used when a request does not name one.
    pub bucket_count: usize,
    pub health: Arc<HealthState>,
    pub latency: Arc<ComputeLatency>,
}

impl ApiState {
    pub fn new(pool: sqlx::SqlitePool, bucket_count: usize) -> Self {
        Self {
            pool,
            bucket_count,
            health: Arc::new(HealthState::new()),
            latency: Arc::new(ComputeLatency::new()),
        }
    }

    /// Run a core computation, recording its latency and outcome.
    fn compute<T>(&self, f: impl FnOnce() -> Vec<T>) -> Vec<T> {
        let out = self.latency.time(f);
        self.health.record_request(now_ns(), out.is_empty());
        out
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/calibration", get(get_calibration))
        .route("/scores/summary", get(get_score_summary))
        .route("/scores/relative", get(get_relative_scores))
        .route("/markets/histogram", get(get_histogram))
        .route("/health", get(get_health))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Query param structs
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct CalibrationQuery {
    pub criterion: Option<String>,
    pub weight: Option<String>,
    pub aggregate: Option<bool>,
    pub bucket_count: Option<usize>,
    pub align: Option<bool>,
    pub platform: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    pub score_type: Option<String>,
    pub group_by: Option<String>,
    pub platform: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RelativeQuery {
    pub question_id: i64,
    pub rule: Option<String>,
    pub criterion: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistogramQuery {
    pub bin: Option<String>,
    pub platform: Option<String>,
    pub category: Option<String>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct RelativeResponse {
    pub question: Option<Question>,
    /// Per-platform averages over days quoted by at least two platforms.
    pub platforms: Vec<RelativeScore>,
    /// Per-market scores against the question's peer median.
    pub markets: Vec<RelativeScore>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub markets: i64,
    pub requests_served: u64,
    pub empty_results: u64,
    pub last_request_at_ns: u64,
    pub compute_latency: LatencySnapshot,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn parse_or<T: FromStr<Err = AppError>>(raw: Option<&str>, default: T) -> Result<T> {
    raw.map_or(Ok(default), |s| s.parse())
}

async fn get_calibration(
    State(state): State<ApiState>,
    Query(params): Query<CalibrationQuery>,
) -> Result<Json<Vec<CalibrationPoint>>> {
    let bucket_count = params.bucket_count.unwrap_or(state.bucket_count);
    if bucket_count == 0 || bucket_count > crate::config::MAX_BUCKET_COUNT {
        return Err(AppError::InvalidParameter(format!(
            "bucket_count must be between 1 and {}",
            crate::config::MAX_BUCKET_COUNT
        )));
    }
    let opts = CalibrationOptions {
        criterion: parse_or(params.criterion.as_deref(), Criterion::Midpoint)?,
        weight: parse_or(params.weight.as_deref(), WeightAttribute::None)?,
        aggregate: params.aggregate.unwrap_or(false),
        bucket_count,
        align_to_question: params.align.unwrap_or(false),
    };

    let filter = MarketFilter {
        platform: params.platform,
        category: params.category,
        question_id: None,
    };
    let markets = loader::load_markets(&state.pool, &filter).await?;
    let points = state.compute(|| calculate_calibration_points(&markets, &opts));

    debug!(
        criterion = %opts.criterion,
        weight = %opts.weight,
        markets = markets.len(),
        points = points.len(),
        "calibration computed"
    );
    Ok(Json(points))
}

async fn get_score_summary(
    State(state): State<ApiState>,
    Query(params): Query<SummaryQuery>,
) -> Result<Json<Vec<GroupSummary>>> {
    let group_by = parse_or(params.group_by.as_deref(), GroupBy::Platform)?;
    let score_type = params
        .score_type
        .as_deref()
        .map(ScoreType::from_str)
        .transpose()?;

    let filter = MarketFilter {
        platform: params.platform,
        category: params.category,
        question_id: None,
    };
    let markets = loader::load_markets(&state.pool, &filter).await?;
    let mut scores = loader::load_market_scores(&state.pool, params.score_type.as_deref()).await?;
    if filter.platform.is_some() || filter.category.is_some() {
        let ids: HashSet<&str> = markets.iter().map(|m| m.id.as_str()).collect();
        scores.retain(|s| ids.contains(s.market_id.as_str()));
    }

    let summaries = match score_type {
        _ if !scores.is_empty() => {
            state.compute(|| summarize_scores(&scores, &markets, params.score_type.as_deref(), group_by))
        }
        // no precomputed rows: score the snapshot directly
        Some(ScoreType {
            rule,
            basis: ScoreBasis::Absolute(criterion),
        }) => state.compute(|| summarize_market_scores(&markets, rule, criterion, group_by)),
        Some(ScoreType {
            rule,
            basis: ScoreBasis::Relative,
        }) => {
            let peers = loader::load_markets(&state.pool, &MarketFilter::default()).await?;
            state.compute(|| summarize_relative_scores(&peers, &markets, rule, group_by))
        }
        None => {
            debug!("no stored scores and no score_type to compute");
            state.compute(Vec::new)
        }
    };

    Ok(Json(summaries))
}

async fn get_relative_scores(
    State(state): State<ApiState>,
    Query(params): Query<RelativeQuery>,
) -> Result<Json<RelativeResponse>> {
    let rule = parse_or(params.rule.as_deref(), ScoringRule::Brier)?;
    let criterion = parse_or(params.criterion.as_deref(), Criterion::Midpoint)?;

    let question = loader::load_question(&state.pool, params.question_id).await?;
    let filter = MarketFilter {
        question_id: Some(params.question_id),
        ..Default::default()
    };
    let markets = loader::load_markets(&state.pool, &filter).await?;
    let daily = loader::load_daily_probabilities(&state.pool, params.question_id).await?;

    let resolutions = question_resolutions(&markets);
    let platforms = state.compute(|| relative_daily_scores(&daily, &resolutions, rule));
    let market_scores = state.compute(|| relative_market_scores(&markets, rule, criterion));

    Ok(Json(RelativeResponse {
        question,
        platforms,
        markets: market_scores,
    }))
}

async fn get_histogram(
    State(state): State<ApiState>,
    Query(params): Query<HistogramQuery>,
) -> Result<Json<Vec<HistogramBar>>> {
    let bin = parse_or(params.bin.as_deref(), DateBin::Month)?;
    let filter = MarketFilter {
        platform: params.platform,
        category: params.category,
        question_id: None,
    };
    let markets = loader::load_markets(&state.pool, &filter).await?;
    let bars = state.compute(|| close_date_histogram(&markets, bin));
    Ok(Json(bars))
}

async fn get_health(State(state): State<ApiState>) -> Result<Json<HealthResponse>> {
    let markets = loader::market_count(&state.pool).await?;
    Ok(Json(HealthResponse {
        status: "ok",
        markets,
        requests_served: state.health.requests_served(),
        empty_results: state.health.empty_results(),
        last_request_at_ns: state.health.last_request_at_ns(),
        compute_latency: state.latency.snapshot(),
    }))
}

fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}
