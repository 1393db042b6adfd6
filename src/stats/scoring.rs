use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::LOG_PROB_EPSILON;
use crate::error::AppError;
use crate::types::{Criterion, Market};

// ---------------------------------------------------------------------------
// Scoring rules
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringRule {
    Brier,
    Logarithmic,
    Spherical,
}

impl ScoringRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringRule::Brier => "brier",
            ScoringRule::Logarithmic => "logarithmic",
            ScoringRule::Spherical => "spherical",
        }
    }

    /// Brier and logarithmic are losses; spherical is a reward.
    pub fn lower_is_better(&self) -> bool {
        !matches!(self, ScoringRule::Spherical)
    }

    /// Score a probability against a resolution, both in [0, 1].
    /// Out-of-range or non-finite inputs yield `None`.
    pub fn score(&self, resolution: f64, probability: f64) -> Option<f64> {
        if !in_unit_interval(resolution) || !in_unit_interval(probability) {
            return None;
        }
        let value = match self {
            ScoringRule::Brier => brier(resolution, probability),
            ScoringRule::Logarithmic => logarithmic(resolution, probability),
            ScoringRule::Spherical => spherical(resolution, probability),
        };
        value.is_finite().then_some(value)
    }
}

impl std::fmt::Display for ScoringRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ScoringRule {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "brier" => Ok(ScoringRule::Brier),
            "logarithmic" => Ok(ScoringRule::Logarithmic),
            "spherical" => Ok(ScoringRule::Spherical),
            other => Err(AppError::InvalidParameter(format!("unknown scoring rule: {other}"))),
        }
    }
}

fn in_unit_interval(x: f64) -> bool {
    x.is_finite() && (0.0..=1.0).contains(&x)
}

pub fn brier(resolution: f64, probability: f64) -> f64 {
    (resolution - probability).powi(2)
}

/// Cross-entropy form; equals `-ln p` for YES and `-ln(1 - p)` for NO.
pub fn logarithmic(resolution: f64, probability: f64) -> f64 {
    let p = probability.clamp(LOG_PROB_EPSILON, 1.0 - LOG_PROB_EPSILON);
    -(resolution * p.ln() + (1.0 - resolution) * (1.0 - p).ln())
}

pub fn spherical(resolution: f64, probability: f64) -> f64 {
    let p = probability;
    let norm = (p * p + (1.0 - p) * (1.0 - p)).sqrt();
    (resolution * p + (1.0 - resolution) * (1.0 - p)) / norm
}

// ---------------------------------------------------------------------------
// Score type tags ("brier-midpoint", "logarithmic-relative", ...)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScoreBasis {
    /// Scored directly at a reference point.
    Absolute(Criterion),
    /// Standardized against peer platforms on the same question.
    Relative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScoreType {
    pub rule: ScoringRule,
    pub basis: ScoreBasis,
}

impl ScoreType {
    pub fn new(rule: ScoringRule, basis: ScoreBasis) -> Self {
        Self { rule, basis }
    }
}

impl std::fmt::Display for ScoreType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.basis {
            ScoreBasis::Absolute(c) => write!(f, "{}-{}", self.rule, c),
            ScoreBasis::Relative => write!(f, "{}-relative", self.rule),
        }
    }
}

impl FromStr for ScoreType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((rule, basis)) = s.split_once('-') else {
            return Err(AppError::InvalidParameter(format!("malformed score type: {s}")));
        };
        let rule: ScoringRule = rule.parse()?;
        let basis = match basis {
            "relative" => ScoreBasis::Relative,
            other => ScoreBasis::Absolute(other.parse()?),
        };
        Ok(Self { rule, basis })
    }
}

// ---------------------------------------------------------------------------
// Per-market scoring
// ---------------------------------------------------------------------------

/// The (probability, resolution) pair for `criterion`, oriented by the
/// market's question polarity when `align` is set. `None` if either is missing.
pub fn oriented_pair(market: &Market, criterion: Criterion, align: bool) -> Option<(f64, f64)> {
    let p = criterion.select(market)?;
    let r = market.resolution?;
    if align && market.question_invert {
        Some((1.0 - p, 1.0 - r))
    } else {
        Some((p, r))
    }
}

/// Score one market at a reference point. Markets lacking the reference
/// probability or a resolution are not scored.
pub fn score_market(market: &Market, rule: ScoringRule, criterion: Criterion) -> Option<f64> {
    let (p, r) = oriented_pair(market, criterion, true)?;
    rule.score(r, p)
}

/// Score every market that has the requested inputs, keeping input order.
pub fn score_markets<'a>(
    markets: &'a [Market],
    rule: ScoringRule,
    criterion: Criterion,
) -> Vec<(&'a Market, f64)> {
    markets
        .iter()
        .filter_map(|m| score_market(m, rule, criterion).map(|s| (m, s)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn brier_corners() {
        let rule = ScoringRule::Brier;
        assert_eq!(rule.score(0.0, 0.0), Some(0.0));
        assert_eq!(rule.score(1.0, 1.0), Some(0.0));
        assert_eq!(rule.score(0.0, 1.0), Some(1.0));
        assert_eq!(rule.score(1.0, 0.0), Some(1.0));
        assert!(close(rule.score(1.0, 0.7).unwrap(), 0.09));
    }

    #[test]
    fn all_rules_symmetric_under_inversion() {
        for rule in [ScoringRule::Brier, ScoringRule::Logarithmic, ScoringRule::Spherical] {
            for (r, p) in [(0.0, 0.2), (1.0, 0.65), (0.4, 0.9)] {
                let a = rule.score(r, p).unwrap();
                let b = rule.score(1.0 - r, 1.0 - p).unwrap();
                assert!(close(a, b), "{rule}: {a} vs {b}");
            }
        }
    }

    #[test]
    fn logarithmic_clamps_certain_wrong_answer() {
        let s = ScoringRule::Logarithmic.score(1.0, 0.0).unwrap();
        assert!(s.is_finite());
        assert!(close(s, -(LOG_PROB_EPSILON.ln())));
        assert!(close(ScoringRule::Logarithmic.score(1.0, 0.5).unwrap(), 2f64.ln()));
    }

    #[test]
    fn spherical_perfect_is_one() {
        assert!(close(ScoringRule::Spherical.score(1.0, 1.0).unwrap(), 1.0));
        assert!(close(ScoringRule::Spherical.score(0.0, 0.0).unwrap(), 1.0));
        assert!(!ScoringRule::Spherical.lower_is_better());
    }

    #[test]
    fn spherical_interior_is_normalized() {
        let expected = 0.6 / (0.6f64 * 0.6 + 0.4 * 0.4).sqrt();
        assert!(close(ScoringRule::Spherical.score(1.0, 0.6).unwrap(), expected));
        assert!(close(ScoringRule::Spherical.score(0.0, 0.6).unwrap(), 0.4 / 0.52f64.sqrt()));
        assert!(close(spherical(0.5, 0.5), 0.5 / 0.5f64.sqrt()));
    }

    #[test]
    fn out_of_range_inputs_are_rejected() {
        assert_eq!(ScoringRule::Brier.score(1.2, 0.5), None);
        assert_eq!(ScoringRule::Brier.score(1.0, f64::NAN), None);
    }

    #[test]
    fn score_type_tags_parse_and_print() {
        let t: ScoreType = "brier-midpoint".parse().unwrap();
        assert_eq!(t, ScoreType::new(ScoringRule::Brier, ScoreBasis::Absolute(Criterion::Midpoint)));
        let t: ScoreType = "spherical-before-close-days-30".parse().unwrap();
        assert_eq!(t.basis, ScoreBasis::Absolute(Criterion::BeforeCloseDays30));
        assert_eq!(t.to_string(), "spherical-before-close-days-30");
        let t: ScoreType = "logarithmic-relative".parse().unwrap();
        assert_eq!(t.basis, ScoreBasis::Relative);
        assert!("brier".parse::<ScoreType>().is_err());
        assert!("hinge-midpoint".parse::<ScoreType>().is_err());
    }

    #[test]
    fn market_without_reference_probability_is_skipped() {
        let scored = Market {
            id: "a".into(),
            resolution: Some(1.0),
            prob_at_midpoint: Some(0.8),
            ..Default::default()
        };
        let missing_prob = Market {
            id: "b".into(),
            resolution: Some(0.0),
            ..Default::default()
        };
        let unresolved = Market {
            id: "c".into(),
            prob_at_midpoint: Some(0.4),
            ..Default::default()
        };
        let markets = vec![scored, missing_prob, unresolved];
        let out = score_markets(&markets, ScoringRule::Brier, Criterion::Midpoint);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0.id, "a");
        assert!(close(out[0].1, 0.04));
    }

    #[test]
    fn inverted_market_orients_both_sides() {
        let m = Market {
            resolution: Some(1.0),
            prob_at_midpoint: Some(0.9),
            question_invert: true,
            ..Default::default()
        };
        assert_eq!(oriented_pair(&m, Criterion::Midpoint, true), Some((1.0 - 0.9, 0.0)));
        assert_eq!(oriented_pair(&m, Criterion::Midpoint, false), Some((0.9, 1.0)));
        assert!(close(score_market(&m, ScoringRule::Brier, Criterion::Midpoint).unwrap(), 0.01));
    }
}
