use crate::config::WHISKER_IQR_FACTOR;

/// Drop non-finite values and sort ascending.
pub fn sort_finite(values: impl IntoIterator<Item = f64>) -> Vec<f64> {
    let mut out: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
    out.sort_by(f64::total_cmp);
    out
}

/// Linear-interpolation percentile over a pre-sorted slice.
///
/// Index is `p * (n - 1)`; an integral index returns that element, otherwise
/// the two neighbouring elements are interpolated. `p` is clamped to [0, 1].
/// Returns `None` for an empty slice.
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() || p.is_nan() {
        return None;
    }
    let p = p.clamp(0.0, 1.0);
    let idx = p * (sorted.len() - 1) as f64;
    let lo = idx.floor() as usize;
    let hi = idx.ceil() as usize;
    if lo == hi {
        return Some(sorted[lo]);
    }
    let frac = idx - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quartiles {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
}

impl Quartiles {
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

pub fn quartiles(sorted: &[f64]) -> Option<Quartiles> {
    Some(Quartiles {
        q1: percentile(sorted, 0.25)?,
        median: percentile(sorted, 0.5)?,
        q3: percentile(sorted, 0.75)?,
    })
}

/// Tukey whisker bounds clipped to the observed range of `sorted`.
pub fn whiskers(sorted: &[f64], q: &Quartiles) -> Option<(f64, f64)> {
    let min = *sorted.first()?;
    let max = *sorted.last()?;
    let fence = WHISKER_IQR_FACTOR * q.iqr();
    Some(((q.q1 - fence).max(min), (q.q3 + fence).min(max)))
}

/// Round to `digits` significant figures. Zero and non-finite values pass through.
pub fn round_sf(value: f64, digits: u32) -> f64 {
    if value == 0.0 || !value.is_finite() || digits == 0 {
        return value;
    }
    // f64 carries at most 17 significant digits
    let digits = digits.min(17) as i32;
    let magnitude = value.abs().log10().floor() as i32;
    let factor = 10f64.powi(digits - 1 - magnitude);
    let rounded = (value * factor).round() / factor;
    if rounded.is_finite() {
        rounded
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn even_length_median_interpolates() {
        assert_eq!(percentile(&[1.0, 2.0, 3.0, 4.0], 0.5), Some(2.5));
    }

    #[test]
    fn odd_length_median_is_middle_element() {
        assert_eq!(percentile(&[1.0, 2.0, 3.0], 0.5), Some(2.0));
    }

    #[test]
    fn extremes_are_min_and_max() {
        let xs = [0.2, 0.4, 0.9, 1.7];
        assert_eq!(percentile(&xs, 0.0), Some(0.2));
        assert_eq!(percentile(&xs, 1.0), Some(1.7));
    }

    #[test]
    fn empty_has_no_percentile() {
        assert_eq!(percentile(&[], 0.5), None);
        assert!(quartiles(&[]).is_none());
    }

    #[test]
    fn quartiles_of_one_to_ten() {
        let xs: Vec<f64> = (1..=10).map(f64::from).collect();
        let q = quartiles(&xs).unwrap();
        assert!(close(q.q1, 3.25));
        assert!(close(q.median, 5.5));
        assert!(close(q.q3, 7.75));
    }

    #[test]
    fn whiskers_clip_to_observed_range() {
        let xs: Vec<f64> = (1..=10).map(f64::from).collect();
        let q = quartiles(&xs).unwrap();
        assert_eq!(whiskers(&xs, &q), Some((1.0, 10.0)));
    }

    #[test]
    fn whiskers_stop_at_fence_with_outlier() {
        let xs = [1.0, 2.0, 3.0, 4.0, 100.0];
        let q = quartiles(&xs).unwrap();
        // q1 = 2, q3 = 4, fence = 3
        assert_eq!(whiskers(&xs, &q), Some((1.0, 7.0)));
    }

    #[test]
    fn sort_finite_drops_nan_and_infinity() {
        let sorted = sort_finite([3.0, f64::NAN, 1.0, f64::INFINITY, 2.0]);
        assert_eq!(sorted, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn round_sf_keeps_leading_digits() {
        assert!(close(round_sf(0.123456, 3), 0.123));
        assert!(close(round_sf(98765.0, 2), 99000.0));
        assert_eq!(round_sf(0.0, 3), 0.0);
    }

    #[test]
    fn round_sf_at_float_extremes_stays_finite() {
        assert_eq!(round_sf(1e-300, 20), 1e-300);
        assert_eq!(round_sf(5e-324, 3), 5e-324);
        assert_eq!(round_sf(1.5e308, 1), 1.5e308);
        assert!(round_sf(-2.5e-310, 2).is_finite());
        assert!(close(round_sf(0.123456, u32::MAX), 0.123456));
    }
}
