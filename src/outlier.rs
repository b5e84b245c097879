//! Outlier detection for per-sample metric arrays.
//!
//! Two rules run side by side:
//!
//! - **IQR rule** (Tukey fences): flag x outside [Q1 − c·IQR, Q3 + c·IQR],
//!   c = 1.5 by default.
//! - **z-score rule**: flag |z| > threshold (3 by default). By default z is
//!   the robust score (x − median) / (1.4826·MAD), since with the classic
//!   mean/std score a single extreme value in a sample of n points can
//!   never exceed (n−1)/√n and small samples would hide it.
//!
//! Both rules need at least 4 valid values.
//!
//! # Examples
//!
//! ```
//! use u_verdict::outlier::{detect_outliers, OutlierConfig};
//!
//! let set = detect_outliers(&[1.0, 2.0, 2.0, 3.0, 2.0, 1.0, 100.0], &OutlierConfig::default());
//! assert_eq!(set.by_iqr, vec![6]);
//! assert_eq!(set.by_z_score, vec![6]);
//! assert_eq!(set.combined, vec![6]);
//! ```
//!
//! # References
//!
//! - Tukey (1977). *Exploratory Data Analysis*.
//! - Iglewicz & Hoaglin (1993). *How to Detect and Handle Outliers*.

use serde::{Deserialize, Serialize};

use crate::distribution::{percentile_sorted, sorted_valid};
use crate::error::ConfigError;
use crate::sample::{valid_indices, valid_values};

/// Minimum valid values for either rule.
pub const MIN_OUTLIER_SIZE: usize = 4;

// 1/Φ⁻¹(0.75): makes MAD a consistent estimator of σ under normality.
const MAD_SCALE: f64 = 1.482_6;
// √(π/2): same for the mean absolute deviation.
const MEAN_AD_SCALE: f64 = 1.253_314;

/// Outlier rule parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierConfig {
    /// Fence multiplier for the IQR rule.
    pub iqr_factor: f64,
    /// |z| above this is an outlier.
    pub z_threshold: f64,
    /// Median/MAD z-score instead of mean/std.
    pub robust: bool,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            iqr_factor: 1.5,
            z_threshold: 3.0,
            robust: true,
        }
    }
}

impl OutlierConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.iqr_factor.is_finite() && self.iqr_factor >= 0.0) {
            return Err(ConfigError::InvalidIqrFactor(self.iqr_factor));
        }
        if !(self.z_threshold.is_finite() && self.z_threshold > 0.0) {
            return Err(ConfigError::InvalidZThreshold(self.z_threshold));
        }
        Ok(())
    }
}

/// Flagged positions for one metric array.
///
/// `by_iqr`, `by_z_score` and `combined` index the valid (non-missing)
/// subsequence. `combined_original` is `combined` mapped back to positions
/// in the caller's array, missing entries included.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlierSet {
    pub by_iqr: Vec<usize>,
    pub by_z_score: Vec<usize>,
    /// Sorted, de-duplicated union of both rules.
    pub combined: Vec<usize>,
    pub combined_original: Vec<usize>,
}

impl OutlierSet {
    pub fn is_empty(&self) -> bool {
        self.combined.is_empty()
    }

    pub fn len(&self) -> usize {
        self.combined.len()
    }
}

/// Runs both outlier rules on the valid entries of `data`.
pub fn detect_outliers(data: &[f64], config: &OutlierConfig) -> OutlierSet {
    let values = valid_values(data);
    if values.len() < MIN_OUTLIER_SIZE {
        return OutlierSet::default();
    }

    let by_iqr = iqr_outliers(&values, config.iqr_factor);
    let by_z_score = if config.robust {
        robust_z_outliers(&values, config.z_threshold)
    } else {
        z_outliers(&values, config.z_threshold)
    };

    let mut combined: Vec<usize> = by_iqr.iter().chain(by_z_score.iter()).copied().collect();
    combined.sort_unstable();
    combined.dedup();

    let positions = valid_indices(data);
    let combined_original = combined.iter().map(|&i| positions[i]).collect();

    OutlierSet {
        by_iqr,
        by_z_score,
        combined,
        combined_original,
    }
}

/// Indices of values outside the Tukey fences.
pub fn iqr_outliers(values: &[f64], factor: f64) -> Vec<usize> {
    let sorted = sorted_valid(values);
    if sorted.len() < MIN_OUTLIER_SIZE {
        return Vec::new();
    }
    let q1 = percentile_sorted(&sorted, 25.0);
    let q3 = percentile_sorted(&sorted, 75.0);
    let iqr = q3 - q1;
    let lower = q1 - factor * iqr;
    let upper = q3 + factor * iqr;

    values
        .iter()
        .enumerate()
        .filter(|&(_, &x)| x < lower || x > upper)
        .map(|(i, _)| i)
        .collect()
}

/// Indices with |x − mean| / s > `threshold` (classic z-score).
pub fn z_outliers(values: &[f64], threshold: f64) -> Vec<usize> {
    if values.len() < MIN_OUTLIER_SIZE {
        return Vec::new();
    }
    let (Some(mean), Some(sd)) = (
        u_numflow::stats::mean(values),
        u_numflow::stats::std_dev(values),
    ) else {
        return Vec::new();
    };
    flag_scaled(values, mean, sd, threshold)
}

/// Indices with |x − median| / (1.4826·MAD) > `threshold`.
///
/// Falls back to the scaled mean absolute deviation when MAD is zero (more
/// than half the values identical). If that is zero too, nothing is flagged.
pub fn robust_z_outliers(values: &[f64], threshold: f64) -> Vec<usize> {
    if values.len() < MIN_OUTLIER_SIZE {
        return Vec::new();
    }
    let sorted = sorted_valid(values);
    let median = percentile_sorted(&sorted, 50.0);

    let deviations: Vec<f64> = values.iter().map(|x| (x - median).abs()).collect();
    let mad = percentile_sorted(&sorted_valid(&deviations), 50.0);

    let scale = if mad > 1e-300 {
        MAD_SCALE * mad
    } else {
        let mean_ad = deviations.iter().sum::<f64>() / deviations.len() as f64;
        MEAN_AD_SCALE * mean_ad
    };
    flag_scaled(values, median, scale, threshold)
}

fn flag_scaled(values: &[f64], center: f64, scale: f64, threshold: f64) -> Vec<usize> {
    if !(scale > 1e-300) {
        return Vec::new();
    }
    values
        .iter()
        .enumerate()
        .filter(|&(_, &x)| ((x - center) / scale).abs() > threshold)
        .map(|(i, _)| i)
        .collect()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn combined_is_sorted_union(
            data in proptest::collection::vec(-1e3_f64..1e3, 0..=40)
        ) {
            let set = detect_outliers(&data, &OutlierConfig::default());
            prop_assert!(set.combined.windows(2).all(|w| w[0] < w[1]));
            for i in set.by_iqr.iter().chain(set.by_z_score.iter()) {
                prop_assert!(set.combined.contains(i));
            }
            prop_assert_eq!(set.combined.len(), set.combined_original.len());
            prop_assert!(set.combined.iter().all(|&i| i < data.len()));
        }
    }
}
