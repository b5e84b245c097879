//! Multiple-comparison correction.
//!
//! Adjusts a batch of p-values so that decisions across several metrics
//! keep their error rate under control. All methods are stateless and
//! order-preserving: output index `i` always belongs to input index `i`.
//!
//! Non-finite inputs (tests that could not run) pass through as NaN and do
//! not count toward the number of tests `k`.
//!
//! # Examples
//!
//! ```
//! use u_verdict::correction::{adjust_p_values, CorrectionMethod};
//!
//! let adj = adjust_p_values(&[0.01, 0.04, 0.03], CorrectionMethod::Bonferroni);
//! assert!((adj[0] - 0.03).abs() < 1e-12);
//! assert!((adj[1] - 0.12).abs() < 1e-12);
//! assert!((adj[2] - 0.09).abs() < 1e-12);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::comparison::ComparisonResult;
use crate::error::ConfigError;
use crate::sample::Metric;

/// Multiple-comparison procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CorrectionMethod {
    /// Family-wise error control: pᵢ·k.
    #[default]
    #[serde(rename = "bonferroni")]
    Bonferroni,
    /// False discovery rate control (Benjamini–Hochberg step-up).
    #[serde(rename = "fdr")]
    BenjaminiHochberg,
    /// Family-wise error control, uniformly more powerful than Bonferroni.
    #[serde(rename = "holm")]
    Holm,
}

impl CorrectionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            CorrectionMethod::Bonferroni => "bonferroni",
            CorrectionMethod::BenjaminiHochberg => "fdr",
            CorrectionMethod::Holm => "holm",
        }
    }
}

impl fmt::Display for CorrectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CorrectionMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bonferroni" => Ok(CorrectionMethod::Bonferroni),
            "fdr" | "fdr_bh" | "bh" | "benjamini_hochberg" | "benjamini-hochberg" => {
                Ok(CorrectionMethod::BenjaminiHochberg)
            }
            "holm" | "holm_bonferroni" | "holm-bonferroni" => Ok(CorrectionMethod::Holm),
            _ => Err(ConfigError::UnknownCorrectionMethod(s.to_string())),
        }
    }
}

/// Adjusts `p_values` with `method`.
///
/// # Algorithm
///
/// With k finite p-values sorted ascending as p₍₁₎ ≤ … ≤ p₍ₖ₎:
///
/// - **Bonferroni**: min(1, pᵢ·k).
/// - **Benjamini–Hochberg**: p₍ᵢ₎·k/i, then the running minimum from the
///   largest p-value down so adjusted values stay monotone in rank.
/// - **Holm**: p₍ᵢ₎·(k−i+1), then the running maximum from the smallest
///   p-value up.
///
/// Every result is clipped to [0, 1]. For Bonferroni and Holm the adjusted
/// value is never below the original.
///
/// # References
///
/// - Holm (1979). "A simple sequentially rejective multiple test
///   procedure". Scandinavian Journal of Statistics, 6(2), 65–70.
/// - Benjamini & Hochberg (1995). "Controlling the false discovery rate".
///   JRSS-B, 57(1), 289–300.
pub fn adjust_p_values(p_values: &[f64], method: CorrectionMethod) -> Vec<f64> {
    let mut adjusted = vec![f64::NAN; p_values.len()];

    let mut order: Vec<usize> = (0..p_values.len())
        .filter(|&i| p_values[i].is_finite())
        .collect();
    let k = order.len();
    if k == 0 {
        return adjusted;
    }
    let kf = k as f64;
    order.sort_by(|&a, &b| p_values[a].total_cmp(&p_values[b]));

    match method {
        CorrectionMethod::Bonferroni => {
            for &i in &order {
                adjusted[i] = clip(p_values[i] * kf);
            }
        }
        CorrectionMethod::BenjaminiHochberg => {
            let mut cummin = f64::INFINITY;
            for (rank0, &i) in order.iter().enumerate().rev() {
                let rank = (rank0 + 1) as f64;
                cummin = cummin.min(clip(p_values[i] * kf / rank));
                adjusted[i] = cummin;
            }
        }
        CorrectionMethod::Holm => {
            let mut cummax = 0.0_f64;
            for (rank0, &i) in order.iter().enumerate() {
                let factor = (k - rank0) as f64;
                cummax = cummax.max(clip(p_values[i] * factor));
                adjusted[i] = cummax;
            }
        }
    }

    adjusted
}

fn clip(p: f64) -> f64 {
    p.clamp(0.0, 1.0)
}

/// Original and adjusted p-value for one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrectedEntry {
    pub original_p: Option<f64>,
    pub corrected_p: Option<f64>,
    /// `corrected_p < alpha`.
    pub significant: bool,
}

/// A batch of comparisons after multiple-comparison correction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectedResult {
    pub method: CorrectionMethod,
    pub alpha: f64,
    /// Aligned with the input comparisons; `None` where no test ran.
    pub original_p: Vec<Option<f64>>,
    pub corrected_p: Vec<Option<f64>>,
    pub per_metric: BTreeMap<Metric, CorrectedEntry>,
}

impl CorrectedResult {
    /// Corrects the p-values of `results` as one family of tests.
    ///
    /// Comparisons without a metric tag are corrected but not listed in
    /// `per_metric`.
    pub fn from_comparisons(
        results: &[ComparisonResult],
        method: CorrectionMethod,
        alpha: f64,
    ) -> Self {
        let raw: Vec<f64> = results
            .iter()
            .map(|r| r.p_value.unwrap_or(f64::NAN))
            .collect();
        let adjusted = adjust_p_values(&raw, method);

        let original_p: Vec<Option<f64>> = results.iter().map(|r| r.p_value).collect();
        let corrected_p: Vec<Option<f64>> = adjusted
            .iter()
            .map(|&p| p.is_finite().then_some(p))
            .collect();

        let per_metric = results
            .iter()
            .zip(original_p.iter().zip(corrected_p.iter()))
            .filter_map(|(r, (&orig, &corr))| {
                r.metric.map(|m| {
                    (
                        m,
                        CorrectedEntry {
                            original_p: orig,
                            corrected_p: corr,
                            significant: corr.is_some_and(|p| p < alpha),
                        },
                    )
                })
            })
            .collect();

        Self {
            method,
            alpha,
            original_p,
            corrected_p,
            per_metric,
        }
    }

    /// Metrics still significant after correction.
    pub fn significant_metrics(&self) -> Vec<Metric> {
        self.per_metric
            .iter()
            .filter(|(_, e)| e.significant)
            .map(|(&m, _)| m)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparison::compare;

    #[test]
    fn bonferroni_known_values() {
        let adj = adjust_p_values(&[0.01, 0.04, 0.03], CorrectionMethod::Bonferroni);
        assert!((adj[0] - 0.03).abs() < 1e-12);
        assert!((adj[1] - 0.12).abs() < 1e-12);
        assert!((adj[2] - 0.09).abs() < 1e-12);
    }

    #[test]
    fn bonferroni_capped_at_one() {
        let adj = adjust_p_values(&[0.5, 0.6], CorrectionMethod::Bonferroni);
        assert_eq!(adj, vec![1.0, 1.0]);
    }

    #[test]
    fn holm_known_values() {
        // sorted: 0.01 (×3), 0.03 (×2), 0.04 (×1)
        let adj = adjust_p_values(&[0.01, 0.04, 0.03], CorrectionMethod::Holm);
        assert!((adj[0] - 0.03).abs() < 1e-12);
        assert!((adj[1] - 0.06).abs() < 1e-12); // max(0.04, 0.06)
        assert!((adj[2] - 0.06).abs() < 1e-12);
    }

    #[test]
    fn bh_known_values() {
        // sorted: 0.01·3/1 = 0.03, 0.03·3/2 = 0.045, 0.04·3/3 = 0.04 → cummin
        let adj = adjust_p_values(&[0.01, 0.04, 0.03], CorrectionMethod::BenjaminiHochberg);
        assert!((adj[0] - 0.03).abs() < 1e-12);
        assert!((adj[1] - 0.04).abs() < 1e-12);
        assert!((adj[2] - 0.04).abs() < 1e-12);
    }

    #[test]
    fn bh_all_significant() {
        let adj = adjust_p_values(&[0.001, 0.002, 0.003], CorrectionMethod::BenjaminiHochberg);
        assert!(adj.iter().all(|&a| a < 0.05));
    }

    #[test]
    fn nan_passes_through() {
        let adj = adjust_p_values(&[0.01, f64::NAN, 0.02], CorrectionMethod::Bonferroni);
        assert!((adj[0] - 0.02).abs() < 1e-12); // k = 2
        assert!(adj[1].is_nan());
        assert!((adj[2] - 0.04).abs() < 1e-12);
    }

    #[test]
    fn empty_input() {
        assert!(adjust_p_values(&[], CorrectionMethod::Holm).is_empty());
        assert!(adjust_p_values(&[f64::NAN], CorrectionMethod::Holm)[0].is_nan());
    }

    #[test]
    fn method_names() {
        assert_eq!("fdr".parse::<CorrectionMethod>(), Ok(CorrectionMethod::BenjaminiHochberg));
        assert_eq!("Holm".parse::<CorrectionMethod>(), Ok(CorrectionMethod::Holm));
        assert_eq!("bonferroni".parse::<CorrectionMethod>(), Ok(CorrectionMethod::Bonferroni));
        assert_eq!(
            "sidak".parse::<CorrectionMethod>(),
            Err(ConfigError::UnknownCorrectionMethod("sidak".into()))
        );
        assert_eq!(CorrectionMethod::default(), CorrectionMethod::Bonferroni);
    }

    #[test]
    fn method_serde_names() {
        let json = serde_json::to_string(&CorrectionMethod::BenjaminiHochberg).expect("serialize");
        assert_eq!(json, "\"fdr\"");
        let bad: Result<CorrectionMethod, _> = serde_json::from_str("\"sidak\"");
        assert!(bad.is_err());
    }

    #[test]
    fn corrected_result_from_comparisons() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let b = [6.0, 7.0, 8.0, 9.0, 10.0];
        let results = vec![
            compare(&a, &b, 0.05).with_metric(Metric::Iou),
            compare(&a, &a, 0.05).with_metric(Metric::Dice),
            compare(&a, &[1.0], 0.05).with_metric(Metric::Accuracy),
        ];
        let c = CorrectedResult::from_comparisons(&results, CorrectionMethod::Bonferroni, 0.05);
        assert_eq!(c.original_p.len(), 3);
        assert!(c.corrected_p[2].is_none());
        assert!(c.per_metric[&Metric::Iou].significant);
        assert!(!c.per_metric[&Metric::Dice].significant);
        assert!(!c.per_metric[&Metric::Accuracy].significant);
        assert_eq!(c.significant_metrics(), vec![Metric::Iou]);
        let orig = c.original_p[0].unwrap();
        let corr = c.corrected_p[0].unwrap();
        assert!((corr - (orig * 2.0).min(1.0)).abs() < 1e-15);
    }
}
