//! Confusion-matrix analysis for ordinal multi-class classifiers.
//!
//! Beyond accuracy and per-class precision/recall/F1, the error pattern
//! splits misclassifications by class distance: *adjacent* errors confuse
//! neighbouring classes (|i − j| = 1, e.g. light vs. moderate corrosion),
//! *critical* errors skip at least one class (|i − j| ≥ 2). For ordinal
//! severity labels a model with only adjacent errors is far safer than its
//! accuracy alone suggests.
//!
//! # Examples
//!
//! ```
//! use u_verdict::confusion::ConfusionMatrix;
//!
//! let cm = ConfusionMatrix::from_rows(&[
//!     vec![50, 3, 0],
//!     vec![2, 45, 3],
//!     vec![0, 4, 43],
//! ]).unwrap();
//! assert!((cm.accuracy().value().unwrap() - 0.92).abs() < 1e-12);
//! let errors = cm.error_pattern();
//! assert_eq!((errors.total, errors.adjacent, errors.critical), (12, 12, 0));
//! ```
//!
//! # References
//!
//! - Wilson, E.B. (1927). "Probable Inference, the Law of Succession, and
//!   Statistical Inference", *JASA* 22(158), pp. 209-212.

use serde::{Deserialize, Serialize};

use crate::distribution::normal_quantile;
use crate::sample::Measured;

/// Square count matrix: rows are true classes, columns predicted classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    classes: usize,
    counts: Vec<u64>,
}

/// Precision, recall and F1 of one class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub class: usize,
    /// True instances of the class (row sum).
    pub support: u64,
    pub precision: Measured<f64>,
    pub recall: Measured<f64>,
    pub f1: Measured<f64>,
}

/// Misclassifications split by class distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPattern {
    pub total: u64,
    /// |true − predicted| = 1.
    pub adjacent: u64,
    /// |true − predicted| ≥ 2.
    pub critical: u64,
}

impl ErrorPattern {
    /// Share of errors that are adjacent; `None` without errors.
    pub fn adjacent_share(&self) -> Option<f64> {
        (self.total > 0).then(|| self.adjacent as f64 / self.total as f64)
    }
}

/// Confidence interval for a binomial proportion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProportionInterval {
    pub level: f64,
    pub estimate: f64,
    pub lower: f64,
    pub upper: f64,
}

impl ConfusionMatrix {
    /// Builds a matrix from rows of counts.
    ///
    /// Returns `None` if `rows` is empty or not square.
    pub fn from_rows(rows: &[Vec<u64>]) -> Option<Self> {
        let classes = rows.len();
        if classes == 0 || rows.iter().any(|r| r.len() != classes) {
            return None;
        }
        Some(Self {
            classes,
            counts: rows.iter().flatten().copied().collect(),
        })
    }

    /// Tallies paired true/predicted labels in `0..classes`.
    ///
    /// Returns `None` if `classes` is zero, the slices differ in length, or
    /// a label is out of range.
    pub fn from_labels(actual: &[usize], predicted: &[usize], classes: usize) -> Option<Self> {
        if classes == 0 || actual.len() != predicted.len() {
            return None;
        }
        let mut counts = vec![0u64; classes * classes];
        for (&t, &p) in actual.iter().zip(predicted) {
            if t >= classes || p >= classes {
                return None;
            }
            counts[t * classes + p] += 1;
        }
        Some(Self { classes, counts })
    }

    pub fn classes(&self) -> usize {
        self.classes
    }

    /// Count of true class `actual` predicted as `predicted`.
    ///
    /// # Panics
    ///
    /// Panics if either class is out of range.
    pub fn count(&self, actual: usize, predicted: usize) -> u64 {
        assert!(actual < self.classes && predicted < self.classes, "class out of range");
        self.counts[actual * self.classes + predicted]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Diagonal sum.
    pub fn correct(&self) -> u64 {
        (0..self.classes).map(|i| self.count(i, i)).sum()
    }

    /// Correct / total; `InsufficientData` for an all-zero matrix.
    pub fn accuracy(&self) -> Measured<f64> {
        ratio(self.correct(), self.total())
    }

    /// Each row divided by its sum. All-zero rows stay zero.
    pub fn row_normalized(&self) -> Vec<Vec<f64>> {
        (0..self.classes)
            .map(|i| {
                let row = &self.counts[i * self.classes..(i + 1) * self.classes];
                let sum: u64 = row.iter().sum();
                row.iter()
                    .map(|&c| if sum > 0 { c as f64 / sum as f64 } else { 0.0 })
                    .collect()
            })
            .collect()
    }

    /// Per-class precision, recall and F1.
    ///
    /// Precision is `Degenerate` when the class is never predicted, recall
    /// when it never occurs.
    pub fn class_metrics(&self) -> Vec<ClassMetrics> {
        (0..self.classes)
            .map(|k| {
                let tp = self.count(k, k);
                let support: u64 = (0..self.classes).map(|j| self.count(k, j)).sum();
                let predicted: u64 = (0..self.classes).map(|i| self.count(i, k)).sum();
                let precision = degenerate_if_empty(tp, predicted);
                let recall = degenerate_if_empty(tp, support);
                let f1 = match (precision, recall) {
                    (Measured::Value(p), Measured::Value(r)) if p + r > 0.0 => {
                        Measured::Value(2.0 * p * r / (p + r))
                    }
                    (Measured::Value(_), Measured::Value(_)) => Measured::Value(0.0),
                    _ => Measured::Degenerate,
                };
                ClassMetrics {
                    class: k,
                    support,
                    precision,
                    recall,
                    f1,
                }
            })
            .collect()
    }

    /// Unweighted mean F1 over classes with a defined F1.
    pub fn macro_f1(&self) -> Measured<f64> {
        let f1s: Vec<f64> = self
            .class_metrics()
            .iter()
            .filter_map(|m| m.f1.value())
            .collect();
        if f1s.is_empty() {
            return Measured::InsufficientData;
        }
        Measured::Value(f1s.iter().sum::<f64>() / f1s.len() as f64)
    }

    /// Off-diagonal counts split into adjacent and critical errors.
    pub fn error_pattern(&self) -> ErrorPattern {
        let mut pattern = ErrorPattern {
            total: 0,
            adjacent: 0,
            critical: 0,
        };
        for i in 0..self.classes {
            for j in 0..self.classes {
                let c = self.count(i, j);
                match i.abs_diff(j) {
                    0 => {}
                    1 => pattern.adjacent += c,
                    _ => pattern.critical += c,
                }
            }
        }
        pattern.total = pattern.adjacent + pattern.critical;
        pattern
    }

    /// Wilson score interval for accuracy at confidence `level`.
    ///
    /// # Returns
    ///
    /// - `InsufficientData` for an all-zero matrix
    /// - `Degenerate` if `level` is outside (0, 1)
    pub fn accuracy_interval(&self, level: f64) -> Measured<ProportionInterval> {
        wilson_interval(self.correct(), self.total(), level)
    }
}

/// Wilson score interval for `successes` out of `trials`.
///
/// ```text
/// center = (p̂ + z²/2n) / (1 + z²/n)
/// half   = z·√(p̂(1−p̂)/n + z²/4n²) / (1 + z²/n)
/// ```
pub fn wilson_interval(successes: u64, trials: u64, level: f64) -> Measured<ProportionInterval> {
    if trials == 0 {
        return Measured::InsufficientData;
    }
    if !(level > 0.0 && level < 1.0) {
        return Measured::Degenerate;
    }
    let n = trials as f64;
    let p = successes as f64 / n;
    let z = normal_quantile(0.5 + level / 2.0);
    let z2 = z * z;
    let denom = 1.0 + z2 / n;
    let center = (p + z2 / (2.0 * n)) / denom;
    let half = z * (p * (1.0 - p) / n + z2 / (4.0 * n * n)).sqrt() / denom;
    Measured::Value(ProportionInterval {
        level,
        estimate: p,
        lower: (center - half).max(0.0),
        upper: (center + half).min(1.0),
    })
}

fn ratio(num: u64, den: u64) -> Measured<f64> {
    if den == 0 {
        Measured::InsufficientData
    } else {
        Measured::Value(num as f64 / den as f64)
    }
}

fn degenerate_if_empty(num: u64, den: u64) -> Measured<f64> {
    if den == 0 {
        Measured::Degenerate
    } else {
        Measured::Value(num as f64 / den as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_matrix() -> ConfusionMatrix {
        ConfusionMatrix::from_rows(&[vec![50, 3, 0], vec![2, 45, 3], vec![0, 4, 43]]).unwrap()
    }

    #[test]
    fn rejects_malformed() {
        assert!(ConfusionMatrix::from_rows(&[]).is_none());
        assert!(ConfusionMatrix::from_rows(&[vec![1, 2], vec![3]]).is_none());
        assert!(ConfusionMatrix::from_labels(&[0, 1], &[0], 2).is_none());
        assert!(ConfusionMatrix::from_labels(&[0, 2], &[0, 1], 2).is_none());
    }

    #[test]
    fn from_labels_tallies() {
        let cm = ConfusionMatrix::from_labels(&[0, 0, 1, 2, 2], &[0, 1, 1, 2, 0], 3).unwrap();
        assert_eq!(cm.count(0, 0), 1);
        assert_eq!(cm.count(0, 1), 1);
        assert_eq!(cm.count(2, 0), 1);
        assert_eq!(cm.total(), 5);
        assert_eq!(cm.correct(), 3);
        let e = cm.error_pattern();
        assert_eq!((e.total, e.adjacent, e.critical), (2, 1, 1));
        assert_eq!(e.adjacent_share(), Some(0.5));
    }

    #[test]
    fn per_class_metrics() {
        let m = sample_matrix().class_metrics();
        assert_eq!(m[0].support, 53);
        assert!((m[0].precision.value().unwrap() - 50.0 / 52.0).abs() < 1e-12);
        assert!((m[0].recall.value().unwrap() - 50.0 / 53.0).abs() < 1e-12);
        let (p, r) = (50.0 / 52.0, 50.0 / 53.0);
        assert!((m[0].f1.value().unwrap() - 2.0 * p * r / (p + r)).abs() < 1e-12);
    }

    #[test]
    fn never_predicted_class_is_degenerate() {
        let cm = ConfusionMatrix::from_rows(&[vec![5, 0], vec![3, 0]]).unwrap();
        let m = cm.class_metrics();
        assert_eq!(m[1].precision, Measured::Degenerate);
        assert_eq!(m[1].recall, Measured::Value(0.0));
        assert_eq!(m[1].f1, Measured::Degenerate);
        // Only class 0 contributes to macro F1.
        let f1_0 = m[0].f1.value().unwrap();
        assert_eq!(cm.macro_f1(), Measured::Value(f1_0));
    }

    #[test]
    fn empty_matrix() {
        let cm = ConfusionMatrix::from_rows(&[vec![0, 0], vec![0, 0]]).unwrap();
        assert_eq!(cm.accuracy(), Measured::InsufficientData);
        assert_eq!(cm.accuracy_interval(0.95).value(), None);
        assert_eq!(cm.error_pattern().adjacent_share(), None);
        assert_eq!(cm.row_normalized(), vec![vec![0.0, 0.0], vec![0.0, 0.0]]);
    }

    #[test]
    fn row_normalized_sums_to_one() {
        for row in sample_matrix().row_normalized() {
            assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn wilson_known_value() {
        // p̂ = 0.5, n = 100, z = 1.96: [0.4038, 0.5962]
        let ci = wilson_interval(50, 100, 0.95).value().unwrap();
        assert!((ci.lower - 0.4038).abs() < 1e-3, "lower = {}", ci.lower);
        assert!((ci.upper - 0.5962).abs() < 1e-3, "upper = {}", ci.upper);
    }

    #[test]
    fn wilson_stays_inside_unit_interval() {
        let ci = wilson_interval(10, 10, 0.95).value().unwrap();
        assert!(ci.upper <= 1.0);
        assert!(ci.lower > 0.6 && ci.lower < 1.0);
        let ci = wilson_interval(0, 10, 0.95).value().unwrap();
        assert!(ci.lower >= 0.0);
        assert_eq!(wilson_interval(1, 2, 1.5), Measured::Degenerate);
    }
}
