use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};

use crate::error::AppError;
use crate::types::{HistogramBar, Market};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateBin {
    Year,
    #[default]
    Month,
}

impl DateBin {
    /// First day of the bin containing `date`.
    pub fn floor(&self, date: NaiveDate) -> Option<NaiveDate> {
        match self {
            DateBin::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1),
            DateBin::Month => NaiveDate::from_ymd_opt(date.year(), date.month(), 1),
        }
    }
}

impl FromStr for DateBin {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "year" => Ok(DateBin::Year),
            "month" => Ok(DateBin::Month),
            other => Err(AppError::InvalidParameter(format!("unknown date bin: {other}"))),
        }
    }
}

/// Count markets per (close-date bin, platform). Markets without a close date
/// are skipped. Bars are ordered by bin, then platform.
pub fn close_date_histogram(markets: &[Market], bin: DateBin) -> Vec<HistogramBar> {
    let mut counts: BTreeMap<(NaiveDate, &str), usize> = BTreeMap::new();
    for market in markets {
        let Some(close) = market.close_datetime else {
            continue;
        };
        let Some(start) = bin.floor(close.date_naive()) else {
            continue;
        };
        *counts.entry((start, market.platform_slug.as_str())).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|((bin_start, platform), count)| HistogramBar {
            bin_start,
            platform: platform.to_string(),
            count,
        })
        .collect()
}
