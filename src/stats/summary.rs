use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use crate::error::AppError;
use crate::stats::percentile::{quartiles, sort_finite, whiskers};
use crate::stats::relative::relative_market_scores;
use crate::stats::scoring::{score_markets, ScoreBasis, ScoreType, ScoringRule};
use crate::types::{Criterion, GroupSummary, Market, MarketScore};

/// Facet used to split scores into box-plot groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupBy {
    #[default]
    Platform,
    Category,
    ScoreType,
}

impl FromStr for GroupBy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "platform" => Ok(GroupBy::Platform),
            "category" => Ok(GroupBy::Category),
            "score_type" => Ok(GroupBy::ScoreType),
            other => Err(AppError::InvalidParameter(format!("unknown grouping: {other}"))),
        }
    }
}

/// Box-plot summary of one group. Non-finite values are ignored;
/// `None` when nothing finite remains.
pub fn summarize(group: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Option<GroupSummary> {
    let sorted = sort_finite(values);
    let q = quartiles(&sorted)?;
    let (whisker_low, whisker_high) = whiskers(&sorted, &q)?;
    let count = sorted.len();
    Some(GroupSummary {
        group: group.into(),
        count,
        min: sorted[0],
        q1: q.q1,
        median: q.median,
        q3: q.q3,
        max: sorted[count - 1],
        mean: sorted.iter().sum::<f64>() / count as f64,
        whisker_low,
        whisker_high,
    })
}

/// Group records by `key` and summarize `value` per group, ordered by key.
/// Records with no key or no value are skipped; empty groups are dropped.
pub fn summarize_by<T, K, FK, FV>(records: &[T], key: FK, value: FV) -> Vec<GroupSummary>
where
    K: Ord + ToString,
    FK: Fn(&T) -> Option<K>,
    FV: Fn(&T) -> Option<f64>,
{
    let mut groups: BTreeMap<K, Vec<f64>> = BTreeMap::new();
    for record in records {
        let (Some(k), Some(v)) = (key(record), value(record)) else {
            continue;
        };
        groups.entry(k).or_default().push(v);
    }
    groups
        .into_iter()
        .filter_map(|(k, values)| summarize(k.to_string(), values))
        .collect()
}

/// Summaries of precomputed scores, optionally restricted to one score type.
/// Category grouping looks up each score's market in `markets`.
///
/// Rules differ in scale and direction, so without a `score_type` filter
/// platform and category groups are split per score type and labelled
/// `<group>/<score_type>`.
pub fn summarize_scores(
    scores: &[MarketScore],
    markets: &[Market],
    score_type: Option<&str>,
    group_by: GroupBy,
) -> Vec<GroupSummary> {
    let filtered: Vec<&MarketScore> = scores
        .iter()
        .filter(|s| score_type.map_or(true, |t| s.score_type == t))
        .collect();
    let label = |group: &str, s: &MarketScore| match score_type {
        Some(_) => group.to_string(),
        None => format!("{group}/{}", s.score_type),
    };

    match group_by {
        GroupBy::Platform => {
            summarize_by(&filtered, |s| Some(label(&s.platform_slug, s)), |s| Some(s.score))
        }
        GroupBy::ScoreType => {
            summarize_by(&filtered, |s| Some(s.score_type.clone()), |s| Some(s.score))
        }
        GroupBy::Category => {
            let categories: HashMap<&str, &str> = markets
                .iter()
                .filter_map(|m| Some((m.id.as_str(), m.category_slug.as_deref()?)))
                .collect();
            summarize_by(
                &filtered,
                |s| categories.get(s.market_id.as_str()).map(|c| label(*c, s)),
                |s| Some(s.score),
            )
        }
    }
}

/// Relative scores computed from the snapshot and summarized like stored ones.
/// Baselines come from every market in `peers`; only markets in `markets`
/// are reported.
pub fn summarize_relative_scores(
    peers: &[Market],
    markets: &[Market],
    rule: ScoringRule,
    group_by: GroupBy,
) -> Vec<GroupSummary> {
    let tag = ScoreType {
        rule,
        basis: ScoreBasis::Relative,
    }
    .to_string();
    let by_id: HashMap<&str, &Market> = markets.iter().map(|m| (m.id.as_str(), m)).collect();
    let scores: Vec<MarketScore> = relative_market_scores(peers, rule, Criterion::Midpoint)
        .into_iter()
        .filter_map(|r| {
            let market = by_id.get(r.key.as_str())?;
            Some(MarketScore {
                market_id: r.key,
                platform_slug: market.platform_slug.clone(),
                score_type: tag.clone(),
                score: r.relative_score,
                resolution: market.resolution,
            })
        })
        .collect();
    summarize_scores(&scores, markets, Some(&tag), group_by)
}

/// Score markets on the fly and summarize them by platform or category.
pub fn summarize_market_scores(
    markets: &[Market],
    rule: ScoringRule,
    criterion: Criterion,
    group_by: GroupBy,
) -> Vec<GroupSummary> {
    let scored = score_markets(markets, rule, criterion);
    match group_by {
        GroupBy::Platform => {
            summarize_by(&scored, |(m, _)| Some(m.platform_slug.clone()), |(_, s)| Some(*s))
        }
        GroupBy::Category => {
            summarize_by(&scored, |(m, _)| m.category_slug.clone(), |(_, s)| Some(*s))
        }
        GroupBy::ScoreType => {
            let tag = format!("{rule}-{criterion}");
            summarize_by(&scored, |_| Some(tag.clone()), |(_, s)| Some(*s))
        }
    }
}
