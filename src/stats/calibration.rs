//! Reliability-diagram data: markets grouped into equal-width probability
//! buckets, with the (optionally weighted) mean resolution per bucket.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::DEFAULT_BUCKET_COUNT;
use crate::stats::scoring::oriented_pair;
use crate::types::{CalibrationPoint, Criterion, Market, WeightAttribute};

#[derive(Debug, Clone)]
pub struct CalibrationOptions {
    pub criterion: Criterion,
    pub weight: WeightAttribute,
    /// Collapse all platforms into a single series.
    pub aggregate: bool,
    pub bucket_count: usize,
    /// Flip probability and resolution for markets linked with inverted polarity.
    pub align_to_question: bool,
}

impl Default for CalibrationOptions {
    fn default() -> Self {
        Self {
            criterion: Criterion::Midpoint,
            weight: WeightAttribute::None,
            aggregate: false,
            bucket_count: DEFAULT_BUCKET_COUNT,
            align_to_question: false,
        }
    }
}

impl CalibrationOptions {
    pub fn new(criterion: Criterion, weight: WeightAttribute) -> Self {
        Self {
            criterion,
            weight,
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Bucket geometry
// ---------------------------------------------------------------------------

pub fn bucket_start(idx: usize, count: usize) -> f64 {
    idx as f64 / count as f64
}

pub fn bucket_end(idx: usize, count: usize) -> f64 {
    (idx + 1) as f64 / count as f64
}

/// Bucket holding `p`. Interior boundaries belong to the lower bucket,
/// 0 to the first and 1 to the last. `None` outside [0, 1] or for zero buckets.
pub fn bucket_index(p: f64, count: usize) -> Option<usize> {
    if count == 0 || !p.is_finite() || !(0.0..=1.0).contains(&p) {
        return None;
    }
    if p == 0.0 {
        return Some(0);
    }
    let mut idx = ((p * count as f64).ceil() as usize)
        .saturating_sub(1)
        .min(count - 1);
    // p * count can land a hair past an exact boundary
    while idx > 0 && p <= bucket_start(idx, count) {
        idx -= 1;
    }
    while idx + 1 < count && p > bucket_end(idx, count) {
        idx += 1;
    }
    Some(idx)
}

// ---------------------------------------------------------------------------
// Weights
// ---------------------------------------------------------------------------

/// Dense rank of close date, 1 for the oldest. Equal dates share a rank.
fn recency_ranks(markets: &[&Market]) -> Vec<Option<f64>> {
    let mut dates: Vec<DateTime<Utc>> = markets.iter().filter_map(|m| m.close_datetime).collect();
    dates.sort();
    dates.dedup();
    markets
        .iter()
        .map(|m| {
            let close = m.close_datetime?;
            dates.binary_search(&close).ok().map(|i| (i + 1) as f64)
        })
        .collect()
}

/// Weight per market, `None` where the attribute is missing or not positive.
pub fn market_weights(markets: &[&Market], weight: WeightAttribute) -> Vec<Option<f64>> {
    let raw: Vec<Option<f64>> = match weight {
        WeightAttribute::None => vec![Some(1.0); markets.len()],
        WeightAttribute::VolumeUsd => markets.iter().map(|m| m.volume_usd).collect(),
        WeightAttribute::TradersCount => markets
            .iter()
            .map(|m| m.traders_count.map(|t| t as f64))
            .collect(),
        WeightAttribute::DurationDays => markets.iter().map(|m| m.duration_days).collect(),
        WeightAttribute::Recency => recency_ranks(markets),
    };
    raw.into_iter()
        .map(|w| w.filter(|w| w.is_finite() && *w > 0.0))
        .collect()
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct BucketAcc {
    count: usize,
    weight_sum: f64,
    weighted_resolution: f64,
}

/// Build calibration points from `markets`.
///
/// Markets missing the requested probability, a resolution, or a usable weight
/// are excluded. Empty buckets are never emitted; points are ordered by bucket,
/// then by platform. An empty or fully-excluded input yields an empty list.
pub fn calculate_calibration_points(
    markets: &[Market],
    opts: &CalibrationOptions,
) -> Vec<CalibrationPoint> {
    let count = opts.bucket_count;
    if count == 0 || markets.is_empty() {
        return Vec::new();
    }

    let candidates: Vec<(&Market, f64, f64)> = markets
        .iter()
        .filter_map(|m| {
            let (p, r) = oriented_pair(m, opts.criterion, opts.align_to_question)?;
            (r.is_finite() && (0.0..=1.0).contains(&r)).then_some((m, p, r))
        })
        .collect();
    let refs: Vec<&Market> = candidates.iter().map(|(m, _, _)| *m).collect();
    let weights = market_weights(&refs, opts.weight);

    let mut buckets: BTreeMap<(usize, Option<&str>), BucketAcc> = BTreeMap::new();
    let mut excluded = markets.len() - candidates.len();

    for ((market, p, r), w) in candidates.iter().zip(weights) {
        let (Some(idx), Some(w)) = (bucket_index(*p, count), w) else {
            excluded += 1;
            continue;
        };
        let platform = (!opts.aggregate).then_some(market.platform_slug.as_str());
        let acc = buckets.entry((idx, platform)).or_default();
        acc.count += 1;
        acc.weight_sum += w;
        acc.weighted_resolution += w * r;
    }

    if excluded > 0 {
        debug!(
            criterion = %opts.criterion,
            weight = %opts.weight,
            excluded,
            "calibration: excluded markets lacking inputs"
        );
    }

    buckets
        .into_iter()
        .filter(|(_, acc)| acc.count > 0 && acc.weight_sum > 0.0)
        .map(|((idx, platform), acc)| {
            let x_start = bucket_start(idx, count);
            let x_end = bucket_end(idx, count);
            CalibrationPoint {
                x_start,
                x_center: (x_start + x_end) / 2.0,
                x_end,
                y_center: acc.weighted_resolution / acc.weight_sum,
                count: acc.count,
                weight_total: acc.weight_sum,
                platform: platform.map(str::to_string),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn market(platform: &str, p: f64, r: f64) -> Market {
        Market {
            id: format!("{platform}-{p}-{r}"),
            platform_slug: platform.to_string(),
            prob_at_midpoint: Some(p),
            resolution: Some(r),
            ..Default::default()
        }
    }

    #[test]
    fn empty_input_gives_no_points() {
        let points = calculate_calibration_points(&[], &CalibrationOptions::default());
        assert!(points.is_empty());
    }

    #[test]
    fn no_market_has_criterion() {
        let markets = vec![market("a", 0.5, 1.0)];
        let opts = CalibrationOptions::new(Criterion::BeforeCloseDays365, WeightAttribute::None);
        assert!(calculate_calibration_points(&markets, &opts).is_empty());
    }

    #[test]
    fn coin_flips_land_in_middle_bucket() {
        let markets: Vec<Market> = (0..100)
            .map(|i| market("manifold", 0.5, if i < 50 { 1.0 } else { 0.0 }))
            .collect();
        let points = calculate_calibration_points(&markets, &CalibrationOptions::default());
        assert_eq!(points.len(), 1);
        let pt = &points[0];
        assert_eq!(pt.count, 100);
        assert!((pt.y_center - 0.5).abs() < 1e-12);
        assert!((pt.x_center - 0.5).abs() < 1e-12);
        assert!(pt.x_start < 0.5 && 0.5 < pt.x_end);
    }

    #[test]
    fn weighted_mean_uses_attribute() {
        let mut no = market("kalshi", 0.7, 0.0);
        no.volume_usd = Some(1.0);
        let mut yes = market("kalshi", 0.7, 1.0);
        yes.volume_usd = Some(3.0);
        let opts = CalibrationOptions::new(Criterion::Midpoint, WeightAttribute::VolumeUsd);
        let points = calculate_calibration_points(&[no, yes], &opts);
        assert_eq!(points.len(), 1);
        assert!((points[0].y_center - 0.75).abs() < 1e-12);
        assert_eq!(points[0].weight_total, 4.0);
    }

    #[test]
    fn missing_weight_excludes_market() {
        let mut with_volume = market("polymarket", 0.2, 1.0);
        with_volume.volume_usd = Some(50.0);
        let without_volume = market("polymarket", 0.2, 0.0);
        let opts = CalibrationOptions::new(Criterion::Midpoint, WeightAttribute::VolumeUsd);
        let points = calculate_calibration_points(&[with_volume, without_volume], &opts);
        assert_eq!(points[0].count, 1);
        assert_eq!(points[0].y_center, 1.0);
    }

    #[test]
    fn boundaries_go_to_lower_bucket() {
        assert_eq!(bucket_index(0.0, 10), Some(0));
        assert_eq!(bucket_index(0.1, 10), Some(0));
        assert_eq!(bucket_index(0.2, 10), Some(1));
        assert_eq!(bucket_index(0.3, 10), Some(2));
        assert_eq!(bucket_index(0.7, 10), Some(6));
        assert_eq!(bucket_index(0.1000001, 10), Some(1));
        assert_eq!(bucket_index(1.0, 10), Some(9));
        assert_eq!(bucket_index(1.5, 10), None);
        assert_eq!(bucket_index(0.5, 0), None);
    }

    #[test]
    fn every_probability_hits_exactly_one_bucket() {
        for n in [1usize, 7, 10, 11, 20] {
            for i in 0..=1000 {
                let p = i as f64 / 1000.0;
                let idx = bucket_index(p, n).unwrap();
                assert!(idx < n);
                assert!(p <= bucket_end(idx, n) + 1e-15);
                assert!(idx == 0 || p > bucket_start(idx, n));
            }
        }
    }

    #[test]
    fn recency_weight_increases_with_close_date() {
        let dates = [
            Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
        ];
        let markets: Vec<Market> = dates
            .iter()
            .map(|d| Market {
                close_datetime: Some(*d),
                ..Default::default()
            })
            .collect();
        let refs: Vec<&Market> = markets.iter().collect();
        let w = market_weights(&refs, WeightAttribute::Recency);
        assert_eq!(w, vec![Some(2.0), Some(1.0), Some(3.0), Some(2.0)]);
    }

    #[test]
    fn per_platform_points_are_ordered() {
        let markets = vec![
            market("polymarket", 0.95, 1.0),
            market("kalshi", 0.05, 0.0),
            market("polymarket", 0.05, 1.0),
            market("kalshi", 0.95, 1.0),
        ];
        let points = calculate_calibration_points(&markets, &CalibrationOptions::default());
        let keys: Vec<(f64, Option<&str>)> = points
            .iter()
            .map(|p| (p.x_start, p.platform.as_deref()))
            .collect();
        assert_eq!(keys.len(), 4);
        assert_eq!(keys[0].1, Some("kalshi"));
        assert_eq!(keys[1].1, Some("polymarket"));
        assert!(keys[0].0 == keys[1].0 && keys[1].0 < keys[2].0);
        assert_eq!(keys[2].1, Some("kalshi"));
    }

    #[test]
    fn aggregate_collapses_platforms() {
        let markets = vec![market("polymarket", 0.05, 1.0), market("kalshi", 0.05, 0.0)];
        let opts = CalibrationOptions {
            aggregate: true,
            ..Default::default()
        };
        let points = calculate_calibration_points(&markets, &opts);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].count, 2);
        assert_eq!(points[0].platform, None);
        assert_eq!(points[0].y_center, 0.5);
    }

    #[test]
    fn repeated_calls_are_identical() {
        let markets: Vec<Market> = (0..40)
            .map(|i| market(if i % 2 == 0 { "a" } else { "b" }, i as f64 / 40.0, (i % 3 == 0) as u8 as f64))
            .collect();
        let opts = CalibrationOptions::default();
        let first = calculate_calibration_points(&markets, &opts);
        let second = calculate_calibration_points(&markets, &opts);
        assert_eq!(first, second);
    }

    #[test]
    fn aligned_inverted_market_flips_bucket() {
        let mut m = market("metaculus", 0.9, 1.0);
        m.question_invert = true;
        let opts = CalibrationOptions {
            align_to_question: true,
            aggregate: true,
            bucket_count: 10,
            ..Default::default()
        };
        let points = calculate_calibration_points(&[m], &opts);
        assert_eq!(points[0].x_start, 0.0);
        assert_eq!(points[0].y_center, 0.0);
    }
}
