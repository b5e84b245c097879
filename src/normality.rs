//! Normality assessment.
//!
//! Classifies a sample as approximately normal or not with a
//! Kolmogorov–Smirnov surrogate: the sample is standardized by its own mean
//! and standard deviation, the distance D between its ECDF and Φ is taken,
//! and the Dvoretzky–Kiefer–Wolfowitz bound gives an approximate p-value
//!
//! ```text
//! p ≈ min(1, 2·exp(−2·n·D²))
//! ```
//!
//! This is deliberately coarse. It separates clearly normal from clearly
//! non-normal samples for test selection; it does not have Shapiro–Wilk
//! power and should not be reported as a formal normality test.
//!
//! # Examples
//!
//! ```
//! use u_verdict::normality::{NormalityAssessor, NormalityState};
//!
//! let assessor = NormalityAssessor::default();
//! let v = assessor.assess(&[0.71, 0.74, 0.69, 0.73, 0.70, 0.72, 0.75, 0.68]);
//! assert_eq!(v.state, NormalityState::AssessedNormal);
//!
//! let v = assessor.assess(&[0.7, 0.8]);
//! assert!(!v.is_normal()); // n < 3 defaults to non-normal
//! ```

use serde::{Deserialize, Serialize};

use crate::descriptive::describe;
use crate::distribution::ks_distance_normal;
use crate::error::ConfigError;
use crate::sample::MIN_TEST_SIZE;

/// Terminal outcome of a normality assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalityState {
    AssessedNormal,
    AssessedNonNormal,
}

/// Immutable normality verdict for one sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalityVerdict {
    pub state: NormalityState,
    /// KS distance D, `None` when the test could not run.
    pub statistic: Option<f64>,
    /// Approximate p-value, `None` when the test could not run
    /// (fewer than 3 valid values or zero variance).
    pub p_value: Option<f64>,
    /// Number of valid observations.
    pub sample_size: usize,
    pub mean: f64,
    pub std: f64,
    pub skewness: f64,
    pub kurtosis: f64,
}

impl NormalityVerdict {
    pub fn is_normal(&self) -> bool {
        self.state == NormalityState::AssessedNormal
    }
}

/// Assesses normality at a fixed significance level.
#[derive(Debug, Clone, Copy)]
pub struct NormalityAssessor {
    alpha: f64,
}

impl Default for NormalityAssessor {
    fn default() -> Self {
        Self { alpha: 0.05 }
    }
}

impl NormalityAssessor {
    /// Creates an assessor rejecting normality when p ≤ `alpha`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidAlpha`] unless 0 < alpha < 1.
    pub fn new(alpha: f64) -> Result<Self, ConfigError> {
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(ConfigError::InvalidAlpha(alpha));
        }
        Ok(Self { alpha })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Assesses the valid entries of `data`.
    ///
    /// Fewer than 3 valid values, or a constant sample, yields
    /// [`NormalityState::AssessedNonNormal`] so downstream comparison takes
    /// the non-parametric path.
    pub fn assess(&self, data: &[f64]) -> NormalityVerdict {
        let summary = describe(data);
        let n = summary.n;

        let test = if n < MIN_TEST_SIZE {
            None
        } else {
            ks_distance_normal(data).map(|d| (d, ks_p_value(d, n)))
        };

        let state = match test {
            Some((_, p)) if p > self.alpha => NormalityState::AssessedNormal,
            _ => NormalityState::AssessedNonNormal,
        };

        NormalityVerdict {
            state,
            statistic: test.map(|(d, _)| d),
            p_value: test.map(|(_, p)| p),
            sample_size: n,
            mean: summary.mean,
            std: summary.std,
            skewness: summary.skewness,
            kurtosis: summary.kurtosis,
        }
    }
}

/// Approximate p-value of a KS distance D on n observations.
pub fn ks_p_value(d: f64, n: usize) -> f64 {
    (2.0 * (-2.0 * n as f64 * d * d).exp()).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_sample_is_non_normal() {
        let a = NormalityAssessor::default();
        for data in [&[][..], &[1.0][..], &[1.0, 2.0][..], &[1.0, f64::NAN, 2.0][..]] {
            let v = a.assess(data);
            assert!(!v.is_normal());
            assert!(v.p_value.is_none());
        }
    }

    #[test]
    fn constant_sample_is_non_normal() {
        let v = NormalityAssessor::default().assess(&[0.5; 10]);
        assert_eq!(v.state, NormalityState::AssessedNonNormal);
        assert!(v.statistic.is_none());
        assert_eq!(v.sample_size, 10);
    }

    #[test]
    fn symmetric_sample_is_normal() {
        let data = [-1.2, -0.8, -0.3, 0.1, 0.5, 0.7, 1.1, 1.4, -0.1, 0.2];
        let v = NormalityAssessor::default().assess(&data);
        assert!(v.is_normal(), "p = {:?}", v.p_value);
    }

    #[test]
    fn heavily_skewed_large_sample_is_non_normal() {
        // 40 zeros and 10 large values: ECDF jumps far from Φ.
        let mut data = vec![0.0; 40];
        data.extend([100.0; 10]);
        let v = NormalityAssessor::default().assess(&data);
        assert!(!v.is_normal(), "p = {:?}", v.p_value);
        assert!(v.p_value.expect("test ran") < 0.05);
    }

    #[test]
    fn verdict_carries_moments() {
        let v = NormalityAssessor::default().assess(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(v.sample_size, 5);
        assert!((v.mean - 3.0).abs() < 1e-12);
        assert!(v.skewness.abs() < 1e-12);
    }

    #[test]
    fn invalid_alpha_rejected() {
        assert!(NormalityAssessor::new(0.0).is_err());
        assert!(NormalityAssessor::new(1.0).is_err());
        assert!(NormalityAssessor::new(f64::NAN).is_err());
        assert!(NormalityAssessor::new(0.1).is_ok());
    }

    #[test]
    fn ks_p_value_bounds() {
        assert_eq!(ks_p_value(0.0, 10), 1.0);
        assert!(ks_p_value(0.5, 100) < 1e-10);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn p_value_bounded(
            data in proptest::collection::vec(-1e3_f64..1e3, 3..=60)
        ) {
            let v = NormalityAssessor::default().assess(&data);
            if let Some(p) = v.p_value {
                prop_assert!((0.0..=1.0).contains(&p), "p = {p}");
            }
            prop_assert_eq!(v.sample_size, data.len());
        }
    }
}
