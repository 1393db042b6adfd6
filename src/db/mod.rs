pub mod loader;
pub mod models;
pub mod snapshot;
pub mod writer;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::error::Result;

pub use loader::MarketFilter;
pub use writer::SnapshotWriter;

/// Open (creating if needed) the snapshot database and apply migrations.
pub async fn connect(db_path: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))?.create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

/// Single-connection in-memory database, migrated. Every connection to
/// `sqlite::memory:` is a separate database, hence the pool size of one.
pub async fn connect_in_memory() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DailyProbability, Market, MarketScore, Question};
    use chrono::{TimeZone, Utc};

    fn market(id: &str, platform: &str, question_id: Option<i64>) -> Market {
        Market {
            id: id.to_string(),
            title: format!("market {id}"),
            platform_slug: platform.to_string(),
            category_slug: Some("politics".to_string()),
            close_datetime: Some(Utc.with_ymd_and_hms(2024, 11, 5, 0, 0, 0).unwrap()),
            resolution: Some(1.0),
            volume_usd: Some(1200.5),
            prob_at_midpoint: Some(0.62),
            question_id,
            question_invert: question_id.is_some(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn markets_round_trip_with_filters() {
        let pool = connect_in_memory().await.unwrap();
        let writer = SnapshotWriter::new(pool.clone());
        writer
            .write_markets(&[market("a", "kalshi", Some(1)), market("b", "polymarket", None)])
            .await
            .unwrap();

        let all = loader::load_markets(&pool, &MarketFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, "a");
        assert_eq!(all[0].prob_at_midpoint, Some(0.62));
        assert!(all[0].question_invert);
        assert_eq!(all[0].close_datetime, Some(Utc.with_ymd_and_hms(2024, 11, 5, 0, 0, 0).unwrap()));
        assert_eq!(all[1].prob_time_avg, None);

        let filter = MarketFilter {
            platform: Some("polymarket".to_string()),
            ..Default::default()
        };
        let only = loader::load_markets(&pool, &filter).await.unwrap();
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].id, "b");

        assert_eq!(loader::market_count(&pool).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn scores_and_daily_probabilities_round_trip() {
        let pool = connect_in_memory().await.unwrap();
        let writer = SnapshotWriter::new(pool.clone());
        writer
            .write_market_scores(&[
                MarketScore {
                    market_id: "a".into(),
                    platform_slug: "kalshi".into(),
                    score_type: "brier-midpoint".into(),
                    score: 0.1,
                    resolution: Some(1.0),
                },
                MarketScore {
                    market_id: "a".into(),
                    platform_slug: "kalshi".into(),
                    score_type: "brier-relative".into(),
                    score: -0.02,
                    resolution: Some(1.0),
                },
            ])
            .await
            .unwrap();
        writer
            .write_daily_probabilities(&[DailyProbability {
                date: "2024-06-01".parse().unwrap(),
                platform_slug: "kalshi".into(),
                question_id: 4,
                question_invert: false,
                prob: 0.4,
            }])
            .await
            .unwrap();
        writer
            .write_questions(&[Question {
                id: 4,
                slug: "election".into(),
                title: "Who wins?".into(),
                category_slug: None,
                start_date_override: None,
                end_date_override: None,
                total_traders: Some(10),
                total_volume: None,
                total_duration: None,
            }])
            .await
            .unwrap();

        let scores = loader::load_market_scores(&pool, Some("brier-midpoint")).await.unwrap();
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].score, 0.1);

        let daily = loader::load_daily_probabilities(&pool, 4).await.unwrap();
        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].date, "2024-06-01".parse::<chrono::NaiveDate>().unwrap());

        let question = loader::load_question(&pool, 4).await.unwrap().unwrap();
        assert_eq!(question.slug, "election");
        assert!(loader::load_question(&pool, 5).await.unwrap().is_none());
    }
}
