//! Scores standardized against peer platforms on the same question.
//! The baseline is the median of the peer scores.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::stats::percentile::{percentile, sort_finite};
use crate::stats::scoring::{oriented_pair, ScoringRule};
use crate::types::{Criterion, DailyProbability, Market, RelativeScore};

fn median(values: &[f64]) -> Option<f64> {
    percentile(&sort_finite(values.iter().copied()), 0.5)
}

/// Per-market relative scores: each market's score minus the median score of
/// all scored markets linked to the same question. Questions with fewer than
/// two scored markets have no peers and are skipped.
pub fn relative_market_scores(
    markets: &[Market],
    rule: ScoringRule,
    criterion: Criterion,
) -> Vec<RelativeScore> {
    let mut by_question: BTreeMap<i64, Vec<(&str, f64)>> = BTreeMap::new();
    for market in markets {
        let Some(question_id) = market.question_id else {
            continue;
        };
        let Some((p, r)) = oriented_pair(market, criterion, true) else {
            continue;
        };
        let Some(score) = rule.score(r, p) else {
            continue;
        };
        by_question
            .entry(question_id)
            .or_default()
            .push((market.id.as_str(), score));
    }

    let mut out = Vec::new();
    for (question_id, mut entries) in by_question {
        if entries.len() < 2 {
            continue;
        }
        let scores: Vec<f64> = entries.iter().map(|(_, s)| *s).collect();
        let Some(baseline) = median(&scores) else {
            continue;
        };
        entries.sort_by(|a, b| a.0.cmp(b.0));
        out.extend(entries.into_iter().map(|(id, score)| RelativeScore {
            key: id.to_string(),
            question_id,
            score,
            relative_score: score - baseline,
            samples: scores.len(),
        }));
    }
    out
}

/// Resolution of each question in its own orientation, taken as the median
/// of the (polarity-corrected) resolutions of its linked markets.
pub fn question_resolutions(markets: &[Market]) -> BTreeMap<i64, f64> {
    let mut linked: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
    for market in markets {
        let (Some(question_id), Some(r)) = (market.question_id, market.resolution) else {
            continue;
        };
        let r = if market.question_invert { 1.0 - r } else { r };
        linked.entry(question_id).or_default().push(r);
    }
    linked
        .into_iter()
        .filter_map(|(q, rs)| median(&rs).map(|m| (q, m)))
        .collect()
}

#[derive(Default)]
struct PlatformAcc {
    score_sum: f64,
    relative_sum: f64,
    days: usize,
}

/// Per-platform relative scores from daily probability series.
///
/// For every (question, date) with at least two platforms, each platform's
/// score against the question resolution is compared with that day's median;
/// the differences are averaged per platform over all such days.
pub fn relative_daily_scores(
    daily: &[DailyProbability],
    resolutions: &BTreeMap<i64, f64>,
    rule: ScoringRule,
) -> Vec<RelativeScore> {
    let mut by_day: BTreeMap<(i64, NaiveDate), Vec<(&str, f64)>> = BTreeMap::new();
    for row in daily {
        let Some(&resolution) = resolutions.get(&row.question_id) else {
            continue;
        };
        let prob = if row.question_invert { 1.0 - row.prob } else { row.prob };
        let Some(score) = rule.score(resolution, prob) else {
            continue;
        };
        by_day
            .entry((row.question_id, row.date))
            .or_default()
            .push((row.platform_slug.as_str(), score));
    }

    let mut acc: BTreeMap<(i64, &str), PlatformAcc> = BTreeMap::new();
    for ((question_id, _), entries) in &by_day {
        if entries.len() < 2 {
            continue;
        }
        let scores: Vec<f64> = entries.iter().map(|(_, s)| *s).collect();
        let Some(baseline) = median(&scores) else {
            continue;
        };
        for (platform, score) in entries {
            let a = acc.entry((*question_id, *platform)).or_default();
            a.score_sum += score;
            a.relative_sum += score - baseline;
            a.days += 1;
        }
    }

    acc.into_iter()
        .map(|((question_id, platform), a)| RelativeScore {
            key: platform.to_string(),
            question_id,
            score: a.score_sum / a.days as f64,
            relative_score: a.relative_sum / a.days as f64,
            samples: a.days,
        })
        .collect()
}
