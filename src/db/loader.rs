use sqlx::SqlitePool;

use crate::db::models::{DailyProbabilityRow, MarketRow, MarketScoreRow, QuestionRow};
use crate::error::Result;
use crate::types::{DailyProbability, Market, MarketScore, Question};

/// Optional equality filters applied when loading markets.
#[derive(Debug, Clone, Default)]
pub struct MarketFilter {
    pub platform: Option<String>,
    pub category: Option<String>,
    pub question_id: Option<i64>,
}

pub async fn load_markets(pool: &SqlitePool, filter: &MarketFilter) -> Result<Vec<Market>> {
    let rows: Vec<MarketRow> = sqlx::query_as(
        r#"
        SELECT * FROM markets
        WHERE (?1 IS NULL OR platform_slug = ?1)
          AND (?2 IS NULL OR category_slug = ?2)
          AND (?3 IS NULL OR question_id = ?3)
        ORDER BY id
        "#,
    )
    .bind(filter.platform.as_deref())
    .bind(filter.category.as_deref())
    .bind(filter.question_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Market::from).collect())
}

pub async fn load_market_scores(pool: &SqlitePool, score_type: Option<&str>) -> Result<Vec<MarketScore>> {
    let rows: Vec<MarketScoreRow> = sqlx::query_as(
        r#"
        SELECT market_id, platform_slug, score_type, score, resolution
        FROM market_scores
        WHERE (?1 IS NULL OR score_type = ?1)
        ORDER BY market_id, score_type
        "#,
    )
    .bind(score_type)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(MarketScore::from).collect())
}

pub async fn load_question(pool: &SqlitePool, question_id: i64) -> Result<Option<Question>> {
    let row: Option<QuestionRow> = sqlx::query_as("SELECT * FROM questions WHERE id = ?")
        .bind(question_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(Question::from))
}

pub async fn load_daily_probabilities(pool: &SqlitePool, question_id: i64) -> Result<Vec<DailyProbability>> {
    let rows: Vec<DailyProbabilityRow> = sqlx::query_as(
        r#"
        SELECT question_id, platform_slug, date, question_invert, prob
        FROM daily_probabilities
        WHERE question_id = ?
        ORDER BY date, platform_slug
        "#,
    )
    .bind(question_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(DailyProbability::from).collect())
}

pub async fn market_count(pool: &SqlitePool) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM markets")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
