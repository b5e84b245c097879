//! Two-sample comparison with automatic test selection.
//!
//! [`Comparator::compare`] drops missing entries, assesses normality of
//! both samples, and then runs Welch's t-test when both are normal or the
//! Mann–Whitney rank-sum test otherwise. Effect sizes ([`cohens_d`]) and
//! mean confidence intervals ([`confidence_interval`]) complete the
//! per-metric picture.
//!
//! Sign convention: group 1 is the baseline. A positive Cohen's d means the
//! baseline mean exceeds the candidate mean.
//!
//! # Examples
//!
//! ```
//! use u_verdict::comparison::{cohens_d, compare, TestUsed};
//!
//! let a = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let b = [6.0, 7.0, 8.0, 9.0, 10.0];
//! let r = compare(&a, &b, 0.05);
//! assert!(r.significant);
//! assert_ne!(r.test_used, TestUsed::InsufficientData);
//! assert!(cohens_d(&a, &b).value().unwrap() < -2.0);
//!
//! let r = compare(&[1.0, 2.0], &[5.0], 0.05);
//! assert_eq!(r.test_used, TestUsed::InsufficientData);
//! ```

use serde::{Deserialize, Serialize};

use crate::descriptive::describe;
use crate::distribution::student_t_quantile;
use crate::error::ConfigError;
use crate::normality::{NormalityAssessor, NormalityVerdict};
use crate::sample::{valid_values, Measured, Metric, MIN_EFFECT_SIZE, MIN_TEST_SIZE};
use crate::testing::{mann_whitney_u_test, variance_ratio_test, welch_t_test, TestResult};

/// Which test produced a [`ComparisonResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestUsed {
    /// Welch's unequal-variance t-test (both samples assessed normal).
    WelchT,
    /// Mann–Whitney U rank-sum test.
    RankSum,
    /// Fewer than 3 valid values in at least one sample.
    InsufficientData,
}

impl TestUsed {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestUsed::WelchT => "welch_t",
            TestUsed::RankSum => "rank_sum",
            TestUsed::InsufficientData => "insufficient_data",
        }
    }
}

/// Outcome of comparing one metric between two models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub metric: Option<Metric>,
    pub n1: usize,
    pub n2: usize,
    pub mean1: f64,
    pub mean2: f64,
    pub std1: f64,
    pub std2: f64,
    /// t for Welch, U₁ for rank-sum.
    pub statistic: Option<f64>,
    /// Welch–Satterthwaite df; `None` for rank-sum.
    pub df: Option<f64>,
    /// Two-sided p-value, `None` iff `test_used` is `InsufficientData`.
    pub p_value: Option<f64>,
    pub test_used: TestUsed,
    /// `p_value < alpha`.
    pub significant: bool,
    /// Variance-ratio verdict, computed on the Welch path only.
    pub equal_variances: Option<bool>,
}

impl ComparisonResult {
    /// Attaches the metric this comparison belongs to.
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = Some(metric);
        self
    }

    /// Mean difference mean1 − mean2.
    pub fn mean_difference(&self) -> f64 {
        self.mean1 - self.mean2
    }
}

/// Cohen's conventional magnitude bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectMagnitude {
    /// |d| < 0.2
    Negligible,
    /// 0.2 ≤ |d| < 0.5
    Small,
    /// 0.5 ≤ |d| < 0.8
    Medium,
    /// |d| ≥ 0.8
    Large,
}

impl EffectMagnitude {
    pub fn from_cohens_d(d: f64) -> Self {
        let abs_d = d.abs();
        if abs_d < 0.2 {
            EffectMagnitude::Negligible
        } else if abs_d < 0.5 {
            EffectMagnitude::Small
        } else if abs_d < 0.8 {
            EffectMagnitude::Medium
        } else {
            EffectMagnitude::Large
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EffectMagnitude::Negligible => "negligible",
            EffectMagnitude::Small => "small",
            EffectMagnitude::Medium => "medium",
            EffectMagnitude::Large => "large",
        }
    }
}

/// Standardized mean difference for one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectSize {
    pub metric: Option<Metric>,
    pub cohens_d: Measured<f64>,
    pub magnitude: Option<EffectMagnitude>,
}

impl EffectSize {
    /// Computes Cohen's d of `a` against `b`.
    pub fn between(a: &[f64], b: &[f64]) -> Self {
        let cohens_d = cohens_d(a, b);
        Self {
            metric: None,
            cohens_d,
            magnitude: cohens_d.value().map(EffectMagnitude::from_cohens_d),
        }
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = Some(metric);
        self
    }
}

/// Confidence interval for the mean of one sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub metric: Option<Metric>,
    /// Confidence level, e.g. 0.95.
    pub level: f64,
    pub mean: f64,
    pub lower: f64,
    pub upper: f64,
    /// Half-width: upper − mean.
    pub margin: f64,
}

impl ConfidenceInterval {
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = Some(metric);
        self
    }

    pub fn contains(&self, x: f64) -> bool {
        x >= self.lower && x <= self.upper
    }
}

/// Selects and runs the two-sample test for a pair of samples.
#[derive(Debug, Clone, Copy)]
pub struct Comparator {
    alpha: f64,
    normality: NormalityAssessor,
}

impl Comparator {
    /// Creates a comparator judging significance (and normality) at `alpha`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidAlpha`] unless 0 < alpha < 1.
    pub fn new(alpha: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            alpha,
            normality: NormalityAssessor::new(alpha)?,
        })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn normality(&self) -> &NormalityAssessor {
        &self.normality
    }

    /// Compares sample `a` (baseline) with sample `b` (candidate).
    pub fn compare(&self, a: &[f64], b: &[f64]) -> ComparisonResult {
        let va = self.normality.assess(a);
        let vb = self.normality.assess(b);
        self.compare_assessed(a, b, &va, &vb)
    }

    /// Like [`Comparator::compare`] with normality verdicts already at hand.
    ///
    /// `va` and `vb` must be the verdicts for `a` and `b` from this
    /// comparator's assessor.
    pub fn compare_assessed(
        &self,
        a: &[f64],
        b: &[f64],
        va: &NormalityVerdict,
        vb: &NormalityVerdict,
    ) -> ComparisonResult {
        let a = valid_values(a);
        let b = valid_values(b);
        let sa = describe(&a);
        let sb = describe(&b);

        let mut result = ComparisonResult {
            metric: None,
            n1: sa.n,
            n2: sb.n,
            mean1: sa.mean,
            mean2: sb.mean,
            std1: sa.std,
            std2: sb.std,
            statistic: None,
            df: None,
            p_value: None,
            test_used: TestUsed::InsufficientData,
            significant: false,
            equal_variances: None,
        };

        if sa.n < MIN_TEST_SIZE || sb.n < MIN_TEST_SIZE {
            return result;
        }

        let welch = if va.is_normal() && vb.is_normal() {
            welch_t_test(&a, &b)
        } else {
            None
        };

        let (test_used, outcome) = match welch {
            Some(t) => {
                result.equal_variances =
                    variance_ratio_test(&a, &b).map(|f| f.p_value >= self.alpha);
                (TestUsed::WelchT, Some(t))
            }
            None => (TestUsed::RankSum, mann_whitney_u_test(&a, &b)),
        };

        // Both kernels accept any finite sample of size ≥ 2.
        let Some(TestResult {
            statistic,
            df,
            p_value,
        }) = outcome
        else {
            return result;
        };

        result.test_used = test_used;
        result.statistic = Some(statistic);
        result.df = (test_used == TestUsed::WelchT).then_some(df);
        result.p_value = Some(p_value);
        result.significant = p_value < self.alpha;
        result
    }
}

/// Compares `a` (baseline) with `b` (candidate) at significance `alpha`.
///
/// Normality is assessed at the default level 0.05. An `alpha` outside
/// (0, 1) is used as given for the significance decision.
pub fn compare(a: &[f64], b: &[f64], alpha: f64) -> ComparisonResult {
    let comparator = Comparator {
        alpha,
        normality: NormalityAssessor::default(),
    };
    comparator.compare(a, b)
}

/// Cohen's d = (mean₁ − mean₂) / pooled standard deviation.
///
/// pooled = √(((n₁−1)s₁² + (n₂−1)s₂²) / (n₁+n₂−2))
///
/// # Returns
///
/// - [`Measured::InsufficientData`] if either sample has fewer than 2
///   valid values.
/// - [`Measured::Degenerate`] if the pooled standard deviation is zero.
///
/// # References
///
/// Cohen (1988). *Statistical Power Analysis for the Behavioral Sciences*,
/// 2nd ed.
pub fn cohens_d(a: &[f64], b: &[f64]) -> Measured<f64> {
    let sa = describe(a);
    let sb = describe(b);
    if sa.n < MIN_EFFECT_SIZE || sb.n < MIN_EFFECT_SIZE {
        return Measured::InsufficientData;
    }

    let n1 = sa.n as f64;
    let n2 = sb.n as f64;
    let pooled_var =
        ((n1 - 1.0) * sa.variance() + (n2 - 1.0) * sb.variance()) / (n1 + n2 - 2.0);
    let pooled = pooled_var.sqrt();
    if !(pooled > 1e-300) {
        return Measured::Degenerate;
    }
    Measured::Value((sa.mean - sb.mean) / pooled)
}

/// Confidence interval for the mean of the valid entries of `data`:
/// mean ± t(1 − α/2, n − 1) · s/√n with α = 1 − `level`.
///
/// # Returns
///
/// [`Measured::InsufficientData`] for fewer than 3 valid values.
///
/// # Examples
///
/// ```
/// use u_verdict::comparison::confidence_interval;
///
/// let ci = confidence_interval(&[0.70, 0.72, 0.74, 0.71, 0.73], 0.95)
///     .value()
///     .unwrap();
/// assert!(ci.lower < 0.72 && ci.upper > 0.72);
/// ```
pub fn confidence_interval(data: &[f64], level: f64) -> Measured<ConfidenceInterval> {
    let s = describe(data);
    if s.n < MIN_TEST_SIZE {
        return Measured::InsufficientData;
    }
    let alpha = 1.0 - level;
    let q = student_t_quantile(1.0 - alpha / 2.0, (s.n - 1) as f64);
    let margin = q * s.std / (s.n as f64).sqrt();
    Measured::Value(ConfidenceInterval {
        metric: None,
        level,
        mean: s.mean,
        lower: s.mean - margin,
        upper: s.mean + margin,
        margin,
    })
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn p_value_bounded_and_symmetric(
            a in proptest::collection::vec(-1e3_f64..1e3, 0..=20),
            b in proptest::collection::vec(-1e3_f64..1e3, 0..=20),
        ) {
            let ab = compare(&a, &b, 0.05);
            let ba = compare(&b, &a, 0.05);
            prop_assert_eq!(ab.test_used, ba.test_used);
            match (ab.p_value, ba.p_value) {
                (Some(p), Some(q)) => {
                    prop_assert!((0.0..=1.0).contains(&p), "p = {p}");
                    prop_assert!((p - q).abs() < 1e-9);
                }
                (None, None) => prop_assert_eq!(ab.test_used, TestUsed::InsufficientData),
                _ => prop_assert!(false, "asymmetric availability"),
            }
        }

        #[test]
        fn insufficient_iff_small(
            a in proptest::collection::vec(-1e3_f64..1e3, 0..=6),
            b in proptest::collection::vec(-1e3_f64..1e3, 0..=6),
        ) {
            let r = compare(&a, &b, 0.05);
            let small = a.len() < 3 || b.len() < 3;
            prop_assert_eq!(r.test_used == TestUsed::InsufficientData, small);
        }

        #[test]
        fn cohens_d_antisymmetric(
            a in proptest::collection::vec(-1e3_f64..1e3, 2..=20),
            b in proptest::collection::vec(-1e3_f64..1e3, 2..=20),
        ) {
            if let (Some(x), Some(y)) = (cohens_d(&a, &b).value(), cohens_d(&b, &a).value()) {
                prop_assert_eq!(x, -y);
            }
        }
    }
}
