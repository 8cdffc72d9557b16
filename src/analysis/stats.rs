//! Descriptive statistics over amplitude maxima
//!
//! Used by the cross-sensor aggregation queries: for every step (or every
//! step/depth cell) the maxima of all sensors are folded into one
//! [`Statistics`] value.

use serde::{Deserialize, Serialize};

/// Summary statistics of a set of values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// Number of finite values that went in
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    /// Undefined when any value is zero or negative
    pub geometric_mean: Option<f64>,
    /// Undefined when any value is negative
    pub harmonic_mean: Option<f64>,
    /// Median of grouped continuous data with class width 1
    pub grouped_median: f64,
}

impl Statistics {
    /// Compute statistics over the finite values of `values`.
    ///
    /// Returns `None` when no finite value is left.
    pub fn compute(values: &[f64]) -> Option<Self> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(|a, b| a.total_cmp(b));

        let count = sorted.len();
        let mean = sorted.iter().sum::<f64>() / count as f64;

        Some(Self {
            count,
            min: sorted[0],
            max: sorted[count - 1],
            mean,
            median: median_sorted(&sorted),
            geometric_mean: geometric_mean(&sorted),
            harmonic_mean: harmonic_mean(&sorted),
            grouped_median: grouped_median_sorted(&sorted, 1.0),
        })
    }
}

fn median_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Geometric mean, `None` unless every value is positive
pub fn geometric_mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() || values.iter().any(|&v| v <= 0.0) {
        return None;
    }
    let log_sum: f64 = values.iter().map(|v| v.ln()).sum();
    Some((log_sum / values.len() as f64).exp())
}

/// Harmonic mean; a zero value yields 0, a negative value yields `None`
pub fn harmonic_mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() || values.iter().any(|&v| v < 0.0) {
        return None;
    }
    if values.iter().any(|&v| v == 0.0) {
        return Some(0.0);
    }
    let reciprocal_sum: f64 = values.iter().map(|v| 1.0 / v).sum();
    Some(values.len() as f64 / reciprocal_sum)
}

/// Median of grouped data, interpolated within the median class.
///
/// `L + interval * (n/2 - cf) / f` where `L` is the lower bound of the class
/// holding the middle value, `cf` the count below it, `f` its frequency.
pub fn median_grouped(values: &[f64], interval: f64) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));
    Some(grouped_median_sorted(&sorted, interval))
}

fn grouped_median_sorted(sorted: &[f64], interval: f64) -> f64 {
    let n = sorted.len();
    let x = sorted[n / 2];
    let lower = x - interval / 2.0;
    let below = sorted.partition_point(|&v| v < x);
    let freq = sorted[below..].iter().take_while(|&&v| v == x).count();
    lower + interval * (n as f64 / 2.0 - below as f64) / freq as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn test_compute_basic() {
        let stats = Statistics::compute(&[4.0, 1.0, 2.0]).unwrap();
        assert_eq!(stats.count, 3);
        approx(stats.mean, 7.0 / 3.0);
        approx(stats.median, 2.0);
        approx(stats.geometric_mean.unwrap(), 2.0);
        approx(stats.harmonic_mean.unwrap(), 3.0 / 1.75);
        approx(stats.grouped_median, 2.0);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 4.0);
    }

    #[test]
    fn test_even_median() {
        let stats = Statistics::compute(&[1.0, 3.0, 3.0, 5.0]).unwrap();
        approx(stats.median, 3.0);
        approx(stats.grouped_median, 3.0);
    }

    #[test]
    fn test_grouped_median_interpolates() {
        // x = 3, L = 2.5, cf = 2, f = 3 -> 2.5 + (3 - 2) / 3
        approx(median_grouped(&[1.0, 2.0, 3.0, 3.0, 3.0, 4.0], 1.0).unwrap(), 2.5 + 1.0 / 3.0);
    }

    #[test]
    fn test_non_finite_ignored() {
        let stats = Statistics::compute(&[f64::NEG_INFINITY, 2.0, f64::NAN]).unwrap();
        assert_eq!(stats.count, 1);
        approx(stats.mean, 2.0);
    }

    #[test]
    fn test_empty() {
        assert!(Statistics::compute(&[]).is_none());
        assert!(Statistics::compute(&[f64::NEG_INFINITY]).is_none());
    }

    #[test]
    fn test_undefined_means() {
        assert_eq!(geometric_mean(&[1.0, 0.0]), None);
        assert_eq!(harmonic_mean(&[1.0, 0.0]), Some(0.0));
        assert_eq!(harmonic_mean(&[1.0, -2.0]), None);
    }
}
