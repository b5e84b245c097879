//! Two-sample hypothesis tests.
//!
//! Kernels used by the comparator: Welch's t-test, the Mann–Whitney U
//! rank-sum test, and a variance-ratio F test for the equal-variance flag.
//! Inputs are expected to be finite; callers drop missing entries first.
//!
//! # Examples
//!
//! ```
//! use u_verdict::testing::{mann_whitney_u_test, welch_t_test};
//!
//! let a = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let b = [6.0, 7.0, 8.0, 9.0, 10.0];
//! assert!(welch_t_test(&a, &b).unwrap().p_value < 0.05);
//! assert!(mann_whitney_u_test(&a, &b).unwrap().p_value < 0.05);
//! ```

use serde::{Deserialize, Serialize};
use u_numflow::special;
use u_numflow::stats;

use crate::distribution::{average_ranks, tie_correction, two_sided_p};

/// Result of a hypothesis test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// Test statistic (t, U, or F depending on test).
    pub statistic: f64,
    /// Degrees of freedom (fractional for Welch, 0 for rank tests).
    pub df: f64,
    /// Two-tailed p-value.
    pub p_value: f64,
}

// ---------------------------------------------------------------------------
// Welch t-test
// ---------------------------------------------------------------------------

/// Two-sample Welch t-test: H₀: μ₁ = μ₂ (unequal variances).
///
/// # Algorithm
///
/// t = (x̄₁ − x̄₂) / √(s₁²/n₁ + s₂²/n₂)
/// df = Welch–Satterthwaite approximation.
///
/// The p-value is 2·(1 − Φ(|t|)), a normal approximation to the t
/// distribution. It is slightly anti-conservative for small df.
///
/// # Returns
///
/// `None` if either sample has fewer than 2 observations, non-finite
/// values, or both samples have zero variance.
///
/// # References
///
/// Welch (1947). "The generalization of Student's problem when several
/// different population variances are involved". Biometrika, 34, 28–35.
pub fn welch_t_test(a: &[f64], b: &[f64]) -> Option<TestResult> {
    let n1 = a.len();
    let n2 = b.len();
    if n1 < 2 || n2 < 2 {
        return None;
    }
    if a.iter().any(|v| !v.is_finite()) || b.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let mean1 = stats::mean(a)?;
    let mean2 = stats::mean(b)?;
    let var1 = stats::variance(a)?;
    let var2 = stats::variance(b)?;

    let n1f = n1 as f64;
    let n2f = n2 as f64;

    let v1 = var1 / n1f;
    let v2 = var2 / n2f;
    let se_sq = v1 + v2;
    if se_sq < 1e-300 {
        return None;
    }

    let t = (mean1 - mean2) / se_sq.sqrt();
    let df = se_sq.powi(2) / (v1 * v1 / (n1f - 1.0) + v2 * v2 / (n2f - 1.0));

    Some(TestResult {
        statistic: t,
        df,
        p_value: two_sided_p(t),
    })
}

// ---------------------------------------------------------------------------
// Mann-Whitney U
// ---------------------------------------------------------------------------

/// Mann–Whitney U test (Wilcoxon rank-sum): H₀: both samples come from
/// the same distribution.
///
/// # Algorithm
///
/// 1. Pool both samples and assign average ranks (ties share a rank)
/// 2. U₁ = R₁ − n₁(n₁+1)/2 where R₁ is the rank sum of sample 1
/// 3. Normal approximation: z = (U₁ − n₁n₂/2) / σ with
///    σ² = n₁n₂/12 · (N + 1 − Σtₖ(tₖ²−1) / (N(N−1)))
///
/// Without ties σ² reduces to n₁n₂(N+1)/12. When every pooled value is
/// tied the ranks carry no information and p = 1.
///
/// # Returns
///
/// `None` if either sample has fewer than 2 observations or non-finite
/// values.
///
/// # References
///
/// Mann & Whitney (1947). "On a test of whether one of two random
/// variables is stochastically larger than the other". Annals of
/// Mathematical Statistics, 18(1), 50–60.
pub fn mann_whitney_u_test(a: &[f64], b: &[f64]) -> Option<TestResult> {
    let n1 = a.len();
    let n2 = b.len();
    if n1 < 2 || n2 < 2 {
        return None;
    }
    if a.iter().any(|v| !v.is_finite()) || b.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let n = n1 + n2;
    let n1f = n1 as f64;
    let n2f = n2 as f64;
    let nf = n as f64;

    let mut combined: Vec<(f64, usize)> = Vec::with_capacity(n);
    combined.extend(a.iter().map(|&v| (v, 0)));
    combined.extend(b.iter().map(|&v| (v, 1)));
    combined.sort_by(|x, y| x.0.total_cmp(&y.0));

    let ranks = average_ranks(&combined);

    let r1: f64 = combined
        .iter()
        .zip(ranks.iter())
        .filter(|((_, g), _)| *g == 0)
        .map(|(_, &r)| r)
        .sum();

    let u1 = r1 - n1f * (n1f + 1.0) / 2.0;

    let ties = tie_correction(&combined);
    let mu = n1f * n2f / 2.0;
    let sigma_sq = n1f * n2f / 12.0 * (nf + 1.0 - ties / (nf * (nf - 1.0)));

    if sigma_sq <= 1e-12 {
        return Some(TestResult {
            statistic: u1,
            df: 0.0,
            p_value: 1.0,
        });
    }

    let z = (u1 - mu) / sigma_sq.sqrt();

    Some(TestResult {
        statistic: u1,
        df: 0.0,
        p_value: two_sided_p(z),
    })
}

// ---------------------------------------------------------------------------
// Variance ratio
// ---------------------------------------------------------------------------

/// Two-sided F test for equal variances.
///
/// # Algorithm
///
/// F = max(s₁², s₂²) / min(s₁², s₂²) with numerator df taken from the
/// sample with the larger variance. p = 2·(1 − F_cdf(F)), clamped to 1.
///
/// Both variances zero gives F = 1, p = 1. Exactly one zero gives
/// F = ∞, p = 0.
///
/// # Returns
///
/// `None` if either sample has fewer than 2 observations or non-finite
/// values.
pub fn variance_ratio_test(a: &[f64], b: &[f64]) -> Option<TestResult> {
    if a.len() < 2 || b.len() < 2 {
        return None;
    }
    if a.iter().any(|v| !v.is_finite()) || b.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let var1 = stats::variance(a)?;
    let var2 = stats::variance(b)?;
    let ((var_hi, n_hi), (var_lo, n_lo)) = if var1 >= var2 {
        ((var1, a.len()), (var2, b.len()))
    } else {
        ((var2, b.len()), (var1, a.len()))
    };
    let d1 = (n_hi - 1) as f64;
    let d2 = (n_lo - 1) as f64;

    if var_lo < 1e-300 {
        let (f, p) = if var_hi < 1e-300 {
            (1.0, 1.0)
        } else {
            (f64::INFINITY, 0.0)
        };
        return Some(TestResult {
            statistic: f,
            df: d1,
            p_value: p,
        });
    }

    let f = var_hi / var_lo;
    let p_value = (2.0 * (1.0 - special::f_distribution_cdf(f, d1, d2))).clamp(0.0, 1.0);

    Some(TestResult {
        statistic: f,
        df: d1,
        p_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // Welch
    // -----------------------------------------------------------------------

    #[test]
    fn welch_same_mean() {
        let a = [5.0, 5.1, 4.9, 5.0, 5.1, 4.9, 5.0, 5.0];
        let b = [5.0, 5.2, 4.8, 5.1, 4.9, 5.0, 5.1, 4.9];
        let r = welch_t_test(&a, &b).expect("should compute");
        assert!(r.p_value > 0.3, "p = {}", r.p_value);
    }

    #[test]
    fn welch_different_means() {
        let a = [1.0, 2.0, 3.0, 2.0, 1.5, 2.5];
        let b = [10.0, 11.0, 12.0, 10.5, 11.5, 10.5];
        let r = welch_t_test(&a, &b).expect("should compute");
        assert!(r.p_value < 0.001, "p = {}", r.p_value);
        assert!(r.statistic < 0.0);
    }

    #[test]
    fn welch_known_statistic() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let b = [6.0, 7.0, 8.0, 9.0, 10.0];
        let r = welch_t_test(&a, &b).expect("should compute");
        // var = 2.5 each → se = 1, t = −5, df = 8
        assert!((r.statistic + 5.0).abs() < 1e-12);
        assert!((r.df - 8.0).abs() < 1e-12);
    }

    #[test]
    fn welch_edge_cases() {
        assert!(welch_t_test(&[1.0], &[2.0, 3.0]).is_none());
        assert!(welch_t_test(&[1.0, 2.0], &[3.0]).is_none());
        assert!(welch_t_test(&[1.0, f64::NAN], &[2.0, 3.0]).is_none());
        assert!(welch_t_test(&[2.0, 2.0], &[2.0, 2.0]).is_none());
    }

    // -----------------------------------------------------------------------
    // Mann-Whitney U
    // -----------------------------------------------------------------------

    #[test]
    fn mw_clearly_different() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let b = [6.0, 7.0, 8.0, 9.0, 10.0];
        let r = mann_whitney_u_test(&a, &b).expect("should compute");
        assert!(r.p_value < 0.05, "p = {}", r.p_value);
        assert!((r.statistic - 0.0).abs() < 1e-12); // U₁ = 0
    }

    #[test]
    fn mw_same_distribution() {
        let a = [1.0, 3.0, 5.0, 7.0, 9.0, 11.0, 13.0, 15.0];
        let b = [2.0, 4.0, 6.0, 8.0, 10.0, 12.0, 14.0, 16.0];
        let r = mann_whitney_u_test(&a, &b).expect("should compute");
        assert!(r.p_value > 0.3, "p = {} (interleaved)", r.p_value);
    }

    #[test]
    fn mw_with_ties() {
        let a = [1.0, 2.0, 2.0, 3.0, 3.0];
        let b = [3.0, 4.0, 4.0, 5.0, 5.0];
        let r = mann_whitney_u_test(&a, &b).expect("should compute");
        assert!(r.p_value < 0.05, "p = {} (shifted with ties)", r.p_value);
    }

    #[test]
    fn mw_all_tied() {
        let r = mann_whitney_u_test(&[4.0; 5], &[4.0; 6]).expect("should compute");
        assert_eq!(r.p_value, 1.0);
    }

    #[test]
    fn mw_symmetric_p() {
        let a = [0.61, 0.72, 0.55, 0.80, 0.66];
        let b = [0.70, 0.75, 0.79, 0.83, 0.90, 0.71];
        let ab = mann_whitney_u_test(&a, &b).expect("should compute");
        let ba = mann_whitney_u_test(&b, &a).expect("should compute");
        assert!((ab.p_value - ba.p_value).abs() < 1e-12);
    }

    #[test]
    fn mw_edge_cases() {
        assert!(mann_whitney_u_test(&[1.0], &[2.0, 3.0]).is_none());
        assert!(mann_whitney_u_test(&[1.0, 2.0], &[3.0]).is_none());
        assert!(mann_whitney_u_test(&[1.0, f64::NAN], &[2.0, 3.0]).is_none());
    }

    // -----------------------------------------------------------------------
    // Variance ratio
    // -----------------------------------------------------------------------

    #[test]
    fn variance_ratio_equal() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let b = [6.0, 7.0, 8.0, 9.0, 10.0];
        let r = variance_ratio_test(&a, &b).expect("should compute");
        assert!((r.statistic - 1.0).abs() < 1e-12);
        assert!(r.p_value > 0.9, "p = {}", r.p_value);
    }

    #[test]
    fn variance_ratio_unequal() {
        let a = [4.9, 5.0, 5.1, 5.0, 4.95, 5.05, 5.0, 5.02];
        let b = [0.0, 3.0, 5.0, 7.0, 10.0, 1.0, 9.0, 6.0];
        let r = variance_ratio_test(&a, &b).expect("should compute");
        assert!(r.statistic > 100.0);
        assert!(r.p_value < 0.01, "p = {}", r.p_value);
    }

    #[test]
    fn variance_ratio_degenerate() {
        let r = variance_ratio_test(&[1.0, 1.0], &[2.0, 2.0]).expect("should compute");
        assert_eq!(r.p_value, 1.0);
        let r = variance_ratio_test(&[1.0, 1.0], &[2.0, 3.0]).expect("should compute");
        assert_eq!(r.p_value, 0.0);
        assert!(variance_ratio_test(&[1.0], &[2.0, 3.0]).is_none());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn welch_p_bounded(
            a in proptest::collection::vec(-1e3_f64..1e3, 3..=20),
            b in proptest::collection::vec(-1e3_f64..1e3, 3..=20),
        ) {
            if let Some(r) = welch_t_test(&a, &b) {
                prop_assert!(r.p_value >= 0.0 && r.p_value <= 1.0, "p = {}", r.p_value);
            }
        }

        #[test]
        fn welch_symmetric(
            a in proptest::collection::vec(-1e3_f64..1e3, 3..=20),
            b in proptest::collection::vec(-1e3_f64..1e3, 3..=20),
        ) {
            if let (Some(ab), Some(ba)) = (welch_t_test(&a, &b), welch_t_test(&b, &a)) {
                prop_assert!((ab.p_value - ba.p_value).abs() < 1e-12);
                prop_assert!((ab.statistic + ba.statistic).abs() < 1e-9);
            }
        }

        #[test]
        fn mann_whitney_p_bounded(
            a in proptest::collection::vec(-1e3_f64..1e3, 3..=20),
            b in proptest::collection::vec(-1e3_f64..1e3, 3..=20),
        ) {
            if let Some(r) = mann_whitney_u_test(&a, &b) {
                prop_assert!(r.p_value >= 0.0 && r.p_value <= 1.0, "p = {}", r.p_value);
                prop_assert!(r.statistic >= 0.0, "U = {}", r.statistic);
            }
        }

        #[test]
        fn variance_ratio_p_bounded(
            a in proptest::collection::vec(-1e3_f64..1e3, 2..=20),
            b in proptest::collection::vec(-1e3_f64..1e3, 2..=20),
        ) {
            if let Some(r) = variance_ratio_test(&a, &b) {
                prop_assert!(r.p_value >= 0.0 && r.p_value <= 1.0, "p = {}", r.p_value);
                prop_assert!(r.statistic >= 1.0, "F = {}", r.statistic);
            }
        }
    }
}
