use sqlx::SqlitePool;
use tracing::info;

use crate::error::Result;
use crate::types::{Category, DailyProbability, Market, MarketScore, Platform, Question};

/// Upserts snapshot records into SQLite, one transaction per batch.
pub struct SnapshotWriter {
    pool: SqlitePool,
}

impl SnapshotWriter {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn write_platforms(&self, platforms: &[Platform]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        for p in platforms {
            sqlx::query(
                r#"
                INSERT INTO platforms (slug, name, color_primary) VALUES (?, ?, ?)
                ON CONFLICT(slug) DO UPDATE SET
                    name = excluded.name,
                    color_primary = excluded.color_primary
                "#,
            )
            .bind(&p.slug)
            .bind(&p.name)
            .bind(&p.color_primary)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        info!(table = "platforms", rows = platforms.len(), "snapshot batch written");
        Ok(platforms.len())
    }

    pub async fn write_categories(&self, categories: &[Category]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        for c in categories {
            sqlx::query(
                r#"
                INSERT INTO categories (slug, name) VALUES (?, ?)
                ON CONFLICT(slug) DO UPDATE SET name = excluded.name
                "#,
            )
            .bind(&c.slug)
            .bind(&c.name)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        info!(table = "categories", rows = categories.len(), "snapshot batch written");
        Ok(categories.len())
    }

    pub async fn write_questions(&self, questions: &[Question]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        for q in questions {
            sqlx::query(
                r#"
                INSERT INTO questions (
                    id, slug, title, category_slug, start_date_override, end_date_override,
                    total_traders, total_volume, total_duration
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(id) DO UPDATE SET
                    slug = excluded.slug,
                    title = excluded.title,
                    category_slug = excluded.category_slug,
                    start_date_override = excluded.start_date_override,
                    end_date_override = excluded.end_date_override,
                    total_traders = excluded.total_traders,
                    total_volume = excluded.total_volume,
                    total_duration = excluded.total_duration
                "#,
            )
            .bind(q.id)
            .bind(&q.slug)
            .bind(&q.title)
            .bind(&q.category_slug)
            .bind(q.start_date_override)
            .bind(q.end_date_override)
            .bind(q.total_traders)
            .bind(q.total_volume)
            .bind(q.total_duration)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        info!(table = "questions", rows = questions.len(), "snapshot batch written");
        Ok(questions.len())
    }

    pub async fn write_markets(&self, markets: &[Market]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        for m in markets {
            sqlx::query(
                r#"
                INSERT OR REPLACE INTO markets (
                    id, title, url, platform_slug, category_slug, open_datetime, close_datetime,
                    resolution, traders_count, volume_usd, duration_days,
                    prob_at_midpoint, prob_at_close, prob_time_avg, prob_before_close_24h,
                    prob_before_close_30d, prob_before_close_90d, prob_before_close_365d,
                    prob_after_start_24h, question_id, question_invert
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&m.id)
            .bind(&m.title)
            .bind(&m.url)
            .bind(&m.platform_slug)
            .bind(&m.category_slug)
            .bind(m.open_datetime)
            .bind(m.close_datetime)
            .bind(m.resolution)
            .bind(m.traders_count)
            .bind(m.volume_usd)
            .bind(m.duration_days)
            .bind(m.prob_at_midpoint)
            .bind(m.prob_at_close)
            .bind(m.prob_time_avg)
            .bind(m.prob_before_close_24h)
            .bind(m.prob_before_close_30d)
            .bind(m.prob_before_close_90d)
            .bind(m.prob_before_close_365d)
            .bind(m.prob_after_start_24h)
            .bind(m.question_id)
            .bind(m.question_invert)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        info!(table = "markets", rows = markets.len(), "snapshot batch written");
        Ok(markets.len())
    }

    pub async fn write_market_scores(&self, scores: &[MarketScore]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        for s in scores {
            sqlx::query(
                r#"
                INSERT INTO market_scores (market_id, platform_slug, score_type, score, resolution)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT(market_id, score_type) DO UPDATE SET
                    platform_slug = excluded.platform_slug,
                    score = excluded.score,
                    resolution = excluded.resolution
                "#,
            )
            .bind(&s.market_id)
            .bind(&s.platform_slug)
            .bind(&s.score_type)
            .bind(s.score)
            .bind(s.resolution)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        info!(table = "market_scores", rows = scores.len(), "snapshot batch written");
        Ok(scores.len())
    }

    pub async fn write_daily_probabilities(&self, rows: &[DailyProbability]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        for d in rows {
            sqlx::query(
                r#"
                INSERT INTO daily_probabilities (question_id, platform_slug, date, question_invert, prob)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT(question_id, platform_slug, date) DO UPDATE SET
                    question_invert = excluded.question_invert,
                    prob = excluded.prob
                "#,
            )
            .bind(d.question_id)
            .bind(&d.platform_slug)
            .bind(d.date)
            .bind(d.question_invert)
            .bind(d.prob)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        info!(table = "daily_probabilities", rows = rows.len(), "snapshot batch written");
        Ok(rows.len())
    }
}
