//! Descriptive statistics over the valid subsequence of a sample.
//!
//! # Examples
//!
//! ```
//! use u_verdict::descriptive::describe;
//!
//! let s = describe(&[2.0, 4.0, f64::NAN, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
//! assert_eq!(s.n, 8);
//! assert!((s.mean - 5.0).abs() < 1e-12);
//! assert!((s.median - 4.5).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};
use u_numflow::stats;

use crate::distribution::{percentile_sorted, sorted_valid};

/// Summary of a sample.
///
/// `std` is the sample standard deviation (denominator n − 1).
/// `skewness` and `kurtosis` are population standardized moments, with
/// `kurtosis` reported as excess kurtosis (normal ⇒ 0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Number of valid (finite) observations.
    pub n: usize,
    pub mean: f64,
    pub std: f64,
    pub median: f64,
    /// 25th percentile.
    pub q1: f64,
    /// 75th percentile.
    pub q3: f64,
    pub min: f64,
    pub max: f64,
    pub skewness: f64,
    pub kurtosis: f64,
}

impl Summary {
    /// All-NaN summary for an empty sample.
    pub fn empty() -> Self {
        Self {
            n: 0,
            mean: f64::NAN,
            std: f64::NAN,
            median: f64::NAN,
            q1: f64::NAN,
            q3: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
            skewness: f64::NAN,
            kurtosis: f64::NAN,
        }
    }

    /// Sample variance (std²).
    pub fn variance(&self) -> f64 {
        self.std * self.std
    }

    /// Interquartile range q3 − q1.
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

/// Describes the valid (finite) entries of `data`.
///
/// # Edge cases
///
/// - No valid entries: [`Summary::empty`] (n = 0, every other field NaN).
/// - One valid entry: `std` is NaN, skewness and kurtosis are 0.
/// - Constant sample: `std` is 0 and skewness/kurtosis degrade to 0.
///
/// # Complexity
///
/// Time: O(n log n) for the sort, Space: O(n)
pub fn describe(data: &[f64]) -> Summary {
    let sorted = sorted_valid(data);
    let n = sorted.len();
    let Some(mean) = stats::mean(&sorted) else {
        return Summary::empty();
    };

    let std = stats::std_dev(&sorted).unwrap_or(f64::NAN);
    let (skewness, kurtosis) = shape_moments(&sorted, mean);

    Summary {
        n,
        mean,
        std,
        median: percentile_sorted(&sorted, 50.0),
        q1: percentile_sorted(&sorted, 25.0),
        q3: percentile_sorted(&sorted, 75.0),
        min: sorted[0],
        max: sorted[n - 1],
        skewness,
        kurtosis,
    }
}

// Population skewness m3/m2^1.5 and excess kurtosis m4/m2² − 3.
fn shape_moments(values: &[f64], mean: f64) -> (f64, f64) {
    let nf = values.len() as f64;
    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for &x in values {
        let d = x - mean;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
    }
    m2 /= nf;
    m3 /= nf;
    m4 /= nf;

    if m2 < 1e-300 {
        return (0.0, 0.0);
    }
    (m3 / m2.powf(1.5), m4 / (m2 * m2) - 3.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_all_nan() {
        let s = describe(&[]);
        assert_eq!(s.n, 0);
        assert!(s.mean.is_nan());
        assert!(s.std.is_nan());
        assert!(s.median.is_nan());
        assert!(s.q1.is_nan() && s.q3.is_nan());
        assert!(s.skewness.is_nan() && s.kurtosis.is_nan());
    }

    #[test]
    fn all_missing_is_empty() {
        let s = describe(&[f64::NAN, f64::NAN]);
        assert_eq!(s.n, 0);
        assert!(s.mean.is_nan());
    }

    #[test]
    fn constant_sample_has_zero_shape() {
        let s = describe(&[3.0, 3.0, 3.0, 3.0]);
        assert_eq!(s.n, 4);
        assert!((s.std).abs() < 1e-15);
        assert_eq!(s.skewness, 0.0);
        assert_eq!(s.kurtosis, 0.0);
    }

    #[test]
    fn single_value() {
        let s = describe(&[7.0]);
        assert_eq!(s.n, 1);
        assert!((s.mean - 7.0).abs() < 1e-15);
        assert!(s.std.is_nan());
        assert_eq!(s.skewness, 0.0);
    }

    #[test]
    fn known_moments() {
        let s = describe(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!((s.mean - 3.0).abs() < 1e-12);
        assert!((s.std - 2.5_f64.sqrt()).abs() < 1e-12);
        assert!(s.skewness.abs() < 1e-12);
        // Uniform-like: population excess kurtosis = 6.8/4 − 3 = −1.3
        assert!((s.kurtosis + 1.3).abs() < 1e-12);
        assert!((s.q1 - 2.0).abs() < 1e-12);
        assert!((s.q3 - 4.0).abs() < 1e-12);
        assert!((s.iqr() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn right_skewed_is_positive() {
        let s = describe(&[1.0, 1.0, 1.0, 2.0, 2.0, 3.0, 10.0]);
        assert!(s.skewness > 1.0, "skew = {}", s.skewness);
        assert!(s.kurtosis > 0.0, "kurt = {}", s.kurtosis);
    }

    #[test]
    fn missing_entries_are_dropped() {
        let a = describe(&[1.0, f64::NAN, 2.0, 3.0]);
        let b = describe(&[1.0, 2.0, 3.0]);
        assert_eq!(a, b);
    }
}
