//! Distribution primitives.
//!
//! The standard normal CDF and quantile, the Student-t quantile, and
//! order-statistic utilities (percentiles, ranks, the Kolmogorov–Smirnov
//! distance to a fitted normal).
//!
//! All functions are pure. Probabilities outside (0, 1) produce signed
//! infinities rather than panics so interval construction can handle
//! one-sided degenerate cases.
//!
//! # Accuracy
//!
//! | Function | Method | Max abs. error |
//! |----------|--------|----------------|
//! | [`normal_cdf`] | `u_numflow::special::standard_normal_cdf` | < 1e-7 |
//! | [`normal_quantile`] | `u_numflow::special::inverse_normal_cdf` | < 1e-3 |
//! | [`student_t_quantile`] | Cornish–Fisher expansion | < 1e-2 for df ≥ 4 |
//!
//! # Examples
//!
//! ```
//! use u_verdict::distribution::{normal_cdf, normal_quantile, percentile};
//!
//! assert!((normal_cdf(0.0) - 0.5).abs() < 1e-7);
//! assert!((normal_quantile(0.975) - 1.959964).abs() < 1e-3);
//! assert!((percentile(&[1.0, 2.0, 3.0, 4.0], 50.0) - 2.5).abs() < 1e-12);
//! ```

use u_numflow::{special, stats};

use crate::sample::valid_values;

// ---------------------------------------------------------------------------
// Normal distribution
// ---------------------------------------------------------------------------

/// Standard normal CDF Φ(x).
///
/// # Examples
///
/// ```
/// use u_verdict::distribution::normal_cdf;
///
/// assert!((normal_cdf(1.96) - 0.975).abs() < 1e-4);
/// assert!(normal_cdf(f64::INFINITY) == 1.0);
/// ```
pub fn normal_cdf(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x == f64::INFINITY {
        return 1.0;
    }
    if x == f64::NEG_INFINITY {
        return 0.0;
    }
    special::standard_normal_cdf(x)
}

/// Upper tail of the standard normal: 1 − Φ(x), taken as Φ(−x) so that
/// two-sided p-values stay strictly positive in the far tail.
pub fn normal_sf(x: f64) -> f64 {
    normal_cdf(-x)
}

/// Two-sided p-value of a standard normal statistic: 2·(1 − Φ(|z|)).
///
/// Returns 1 for NaN input (no evidence either way), clamped to [0, 1].
pub fn two_sided_p(z: f64) -> f64 {
    if z.is_nan() {
        return 1.0;
    }
    (2.0 * normal_sf(z.abs())).clamp(0.0, 1.0)
}

/// Inverse standard normal CDF.
///
/// # Returns
///
/// `−∞` for p ≤ 0, `+∞` for p ≥ 1, NaN for NaN input.
///
/// # Examples
///
/// ```
/// use u_verdict::distribution::normal_quantile;
///
/// assert!(normal_quantile(0.5).abs() < 1e-3);
/// assert!(normal_quantile(0.0).is_infinite());
/// assert!((normal_quantile(0.025) + 1.959964).abs() < 1e-3);
/// ```
pub fn normal_quantile(p: f64) -> f64 {
    if p.is_nan() {
        return f64::NAN;
    }
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }
    special::inverse_normal_cdf(p)
}

// ---------------------------------------------------------------------------
// Student-t
// ---------------------------------------------------------------------------

/// Degrees of freedom above which the t quantile is taken as normal.
pub const T_NORMAL_DF: f64 = 30.0;

/// Student-t quantile with `df` degrees of freedom.
///
/// # Algorithm
///
/// Cornish–Fisher expansion around z = Φ⁻¹(p):
///
/// ```text
/// t ≈ z + g₁(z)/ν + g₂(z)/ν² + g₃(z)/ν³ + g₄(z)/ν⁴
/// g₁ = (z³ + z) / 4
/// g₂ = (5z⁵ + 16z³ + 3z) / 96
/// g₃ = (3z⁷ + 19z⁵ + 17z³ − 15z) / 384
/// g₄ = (79z⁹ + 776z⁷ + 1482z⁵ − 1920z³ − 945z) / 92160
/// ```
///
/// The correction vanishes as ν → ∞; for ν > 30 the normal quantile is
/// returned unchanged.
///
/// # Returns
///
/// Signed infinity for p outside (0, 1); NaN if `df` is not positive.
///
/// # References
///
/// Abramowitz & Stegun (1964), formula 26.7.5.
///
/// # Examples
///
/// ```
/// use u_verdict::distribution::student_t_quantile;
///
/// // t(0.975, 4) = 2.776
/// assert!((student_t_quantile(0.975, 4.0) - 2.776).abs() < 0.02);
/// ```
pub fn student_t_quantile(p: f64, df: f64) -> f64 {
    if df.is_nan() || df <= 0.0 {
        return f64::NAN;
    }
    let z = normal_quantile(p);
    if !z.is_finite() || df > T_NORMAL_DF {
        return z;
    }

    let z2 = z * z;
    let z3 = z2 * z;
    let z5 = z3 * z2;
    let z7 = z5 * z2;
    let z9 = z7 * z2;

    let g1 = (z3 + z) / 4.0;
    let g2 = (5.0 * z5 + 16.0 * z3 + 3.0 * z) / 96.0;
    let g3 = (3.0 * z7 + 19.0 * z5 + 17.0 * z3 - 15.0 * z) / 384.0;
    let g4 = (79.0 * z9 + 776.0 * z7 + 1482.0 * z5 - 1920.0 * z3 - 945.0 * z) / 92160.0;

    z + g1 / df + g2 / df.powi(2) + g3 / df.powi(3) + g4 / df.powi(4)
}

// ---------------------------------------------------------------------------
// Order statistics
// ---------------------------------------------------------------------------

/// Sorts finite values ascending.
pub(crate) fn sorted_valid(data: &[f64]) -> Vec<f64> {
    let mut v = valid_values(data);
    v.sort_by(f64::total_cmp);
    v
}

/// Percentile of a sample by linear interpolation between order statistics.
///
/// Missing entries are dropped. The p-th percentile sits at 1-indexed
/// position `p/100·(n−1) + 1` in the sorted valid values and is
/// interpolated between the two bracketing order statistics.
///
/// # Returns
///
/// NaN if no valid values remain or `p` is outside [0, 100].
///
/// # Examples
///
/// ```
/// use u_verdict::distribution::percentile;
///
/// let data = [4.0, 1.0, f64::NAN, 3.0, 2.0];
/// assert!((percentile(&data, 50.0) - 2.5).abs() < 1e-12);
/// assert!((percentile(&data, 0.0) - 1.0).abs() < 1e-12);
/// assert!((percentile(&data, 100.0) - 4.0).abs() < 1e-12);
/// ```
pub fn percentile(data: &[f64], p: f64) -> f64 {
    percentile_sorted(&sorted_valid(data), p)
}

/// [`percentile`] on data already sorted ascending and free of NaN.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    stats::quantile_sorted(sorted, p / 100.0).unwrap_or(f64::NAN)
}

/// Assigns average ranks (1-based) to values sorted ascending.
///
/// Tied values share the mean of the ranks they span.
pub(crate) fn average_ranks(sorted: &[(f64, usize)]) -> Vec<f64> {
    let n = sorted.len();
    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let j = tie_run_end(sorted, i);
        let avg_rank = (i + 1 + j) as f64 / 2.0;
        for rank in ranks.iter_mut().take(j).skip(i) {
            *rank = avg_rank;
        }
        i = j;
    }
    ranks
}

/// Tie correction term Σ tₖ(tₖ² − 1) over groups of tied values.
pub(crate) fn tie_correction(sorted: &[(f64, usize)]) -> f64 {
    let n = sorted.len();
    let mut correction = 0.0;
    let mut i = 0;
    while i < n {
        let j = tie_run_end(sorted, i);
        let t = (j - i) as f64;
        if t > 1.0 {
            correction += t * (t * t - 1.0);
        }
        i = j;
    }
    correction
}

fn tie_run_end(sorted: &[(f64, usize)], start: usize) -> usize {
    let mut j = start + 1;
    while j < sorted.len() && (sorted[j].0 - sorted[start].0).abs() < 1e-12 {
        j += 1;
    }
    j
}

/// Average ranks of the valid values of `data`, in their original order.
///
/// # Examples
///
/// ```
/// use u_verdict::distribution::rank;
///
/// assert_eq!(rank(&[30.0, 10.0, 20.0, 20.0]), vec![4.0, 1.0, 2.5, 2.5]);
/// ```
pub fn rank(data: &[f64]) -> Vec<f64> {
    let mut tagged: Vec<(f64, usize)> = valid_values(data)
        .into_iter()
        .enumerate()
        .map(|(i, v)| (v, i))
        .collect();
    tagged.sort_by(|a, b| a.0.total_cmp(&b.0));
    let sorted_ranks = average_ranks(&tagged);
    let mut out = vec![0.0; tagged.len()];
    for ((_, orig), r) in tagged.iter().zip(sorted_ranks) {
        out[*orig] = r;
    }
    out
}

/// Kolmogorov–Smirnov distance between the sample ECDF and a normal
/// distribution fitted by the sample mean and standard deviation.
///
/// D = maxᵢ max(|i/n − Φ(zᵢ)|, |(i−1)/n − Φ(zᵢ)|) over the sorted
/// standardized values zᵢ.
///
/// # Returns
///
/// `None` for fewer than 2 valid values or zero standard deviation.
pub fn ks_distance_normal(data: &[f64]) -> Option<f64> {
    let sorted = sorted_valid(data);
    let n = sorted.len();
    if n < 2 {
        return None;
    }
    let mean = stats::mean(&sorted)?;
    let sd = stats::std_dev(&sorted)?;
    if sd < 1e-300 {
        return None;
    }

    let nf = n as f64;
    let mut d_stat = 0.0_f64;
    for (i, &x) in sorted.iter().enumerate() {
        let cdf = normal_cdf((x - mean) / sd);
        let ecdf_above = (i + 1) as f64 / nf;
        let ecdf_below = i as f64 / nf;
        d_stat = d_stat.max((ecdf_above - cdf).abs());
        d_stat = d_stat.max((ecdf_below - cdf).abs());
    }
    Some(d_stat)
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // Normal
    // -----------------------------------------------------------------------

    #[test]
    fn cdf_at_zero_is_half() {
        assert!((normal_cdf(0.0) - 0.5).abs() < 1e-7);
    }

    #[test]
    fn cdf_known_values() {
        assert!((normal_cdf(1.0) - 0.841_344_7).abs() < 1e-6);
        assert!((normal_cdf(-1.0) - 0.158_655_3).abs() < 1e-6);
        assert!((normal_cdf(2.575_829) - 0.995).abs() < 1e-6);
        assert!(normal_cdf(f64::NAN).is_nan());
        assert_eq!(normal_cdf(f64::NEG_INFINITY), 0.0);
    }

    #[test]
    fn cdf_symmetry() {
        for &x in &[0.1, 0.5, 1.3, 2.2, 3.7] {
            assert!((normal_cdf(x) + normal_cdf(-x) - 1.0).abs() < 1e-7);
        }
    }

    #[test]
    fn sf_matches_cdf() {
        for &x in &[-2.0, -0.3, 0.0, 0.7, 1.9] {
            assert!((normal_sf(x) - (1.0 - normal_cdf(x))).abs() < 1e-7);
        }
        assert!(normal_sf(5.0) > 0.0);
        assert!(normal_sf(5.0) < 1e-6);
    }

    #[test]
    fn two_sided_p_known() {
        assert!((two_sided_p(1.959_964) - 0.05).abs() < 1e-4);
        assert!((two_sided_p(0.0) - 1.0).abs() < 1e-6);
        assert_eq!(two_sided_p(f64::NAN), 1.0);
        assert!(two_sided_p(40.0) >= 0.0);
    }

    #[test]
    fn quantile_known_values() {
        assert!(normal_quantile(0.5).abs() < 1e-3);
        assert!((normal_quantile(0.975) - 1.959_964).abs() < 1e-3);
        assert!((normal_quantile(0.995) - 2.575_829).abs() < 1e-3);
        assert!((normal_quantile(0.001) + 3.090_232).abs() < 1e-3);
    }

    #[test]
    fn quantile_inverts_cdf() {
        for &p in &[0.01, 0.1, 0.3, 0.5, 0.7, 0.9, 0.99] {
            let x = normal_quantile(p);
            assert!((normal_cdf(x) - p).abs() < 1e-3, "p = {p}, x = {x}");
        }
    }

    #[test]
    fn quantile_out_of_range() {
        assert_eq!(normal_quantile(0.0), f64::NEG_INFINITY);
        assert_eq!(normal_quantile(-0.2), f64::NEG_INFINITY);
        assert_eq!(normal_quantile(1.0), f64::INFINITY);
        assert!(normal_quantile(f64::NAN).is_nan());
    }

    // -----------------------------------------------------------------------
    // Student-t
    // -----------------------------------------------------------------------

    #[test]
    fn t_quantile_small_df() {
        // Reference values from standard t tables.
        assert!((student_t_quantile(0.975, 4.0) - 2.776).abs() < 0.02);
        assert!((student_t_quantile(0.975, 9.0) - 2.262).abs() < 0.01);
        assert!((student_t_quantile(0.975, 20.0) - 2.086).abs() < 0.005);
    }

    #[test]
    fn t_quantile_exceeds_normal() {
        let z = normal_quantile(0.975);
        for df in [3.0, 5.0, 10.0, 29.0] {
            assert!(student_t_quantile(0.975, df) > z);
        }
    }

    #[test]
    fn t_quantile_large_df_is_normal() {
        assert_eq!(student_t_quantile(0.9, 31.0), normal_quantile(0.9));
        assert_eq!(student_t_quantile(0.9, 1e6), normal_quantile(0.9));
    }

    #[test]
    fn t_quantile_degenerate() {
        assert!(student_t_quantile(0.9, 0.0).is_nan());
        assert_eq!(student_t_quantile(1.0, 5.0), f64::INFINITY);
        assert_eq!(student_t_quantile(0.0, 5.0), f64::NEG_INFINITY);
    }

    // -----------------------------------------------------------------------
    // Order statistics
    // -----------------------------------------------------------------------

    #[test]
    fn percentile_interpolates() {
        assert!((percentile(&[1.0, 2.0, 3.0, 4.0], 50.0) - 2.5).abs() < 1e-12);
        assert!((percentile(&[1.0, 2.0, 3.0, 4.0], 25.0) - 1.75).abs() < 1e-12);
        assert!((percentile(&[10.0], 90.0) - 10.0).abs() < 1e-12);
    }

    #[test]
    fn percentile_edge_cases() {
        assert!(percentile(&[], 50.0).is_nan());
        assert!(percentile(&[f64::NAN], 50.0).is_nan());
        assert!(percentile(&[1.0, 2.0], 101.0).is_nan());
        assert!(percentile(&[1.0, 2.0], -1.0).is_nan());
    }

    #[test]
    fn ranks_with_ties() {
        assert_eq!(rank(&[1.0, 2.0, 2.0, 3.0]), vec![1.0, 2.5, 2.5, 4.0]);
        assert_eq!(rank(&[5.0, f64::NAN, 1.0]), vec![2.0, 1.0]);
    }

    #[test]
    fn tie_correction_counts_groups() {
        let sorted = [(1.0, 0), (2.0, 0), (2.0, 1), (3.0, 0), (3.0, 1), (3.0, 1)];
        // groups of 2 and 3: 2·3 + 3·8 = 30
        assert!((tie_correction(&sorted) - 30.0).abs() < 1e-12);
    }

    #[test]
    fn ks_distance_bounds() {
        let data = [-1.2, -0.8, -0.3, 0.1, 0.5, 0.7, 1.1, 1.4];
        let d = ks_distance_normal(&data).expect("should compute");
        assert!(d > 0.0 && d < 0.3, "D = {d}");
        assert!(ks_distance_normal(&[1.0]).is_none());
        assert!(ks_distance_normal(&[2.0, 2.0, 2.0]).is_none());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn cdf_in_unit_interval(x in -50.0_f64..50.0) {
            let p = normal_cdf(x);
            prop_assert!((0.0..=1.0).contains(&p), "Φ({x}) = {p}");
        }

        #[test]
        fn cdf_monotone(a in -8.0_f64..8.0, b in -8.0_f64..8.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(normal_cdf(lo) <= normal_cdf(hi) + 1e-15);
        }

        #[test]
        fn quantile_monotone(a in 0.001_f64..0.999, b in 0.001_f64..0.999) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(normal_quantile(lo) <= normal_quantile(hi) + 1e-3);
        }

        #[test]
        fn percentile_within_range(
            data in proptest::collection::vec(-1e3_f64..1e3, 1..=40),
            p in 0.0_f64..=100.0,
        ) {
            let v = percentile(&data, p);
            let min = data.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = data.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            prop_assert!(v >= min - 1e-9 && v <= max + 1e-9);
        }
    }
}
