//! Samples, metric names, and tagged per-record results.
//!
//! A sample is a plain `&[f64]` where NaN marks a missing entry. Every
//! statistic in this crate first reduces a sample to its *valid*
//! subsequence with [`valid_values`].
//!
//! # Examples
//!
//! ```
//! use u_verdict::sample::{valid_values, Measured, Metric};
//!
//! let iou = [0.71, f64::NAN, 0.68, 0.74];
//! assert_eq!(valid_values(&iou), vec![0.71, 0.68, 0.74]);
//!
//! let m: Metric = "dice".parse().unwrap();
//! assert_eq!(m, Metric::Dice);
//!
//! let d: Measured<f64> = Measured::InsufficientData;
//! assert!(d.or_nan().is_nan());
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Minimum valid entries for any test, interval, or normality verdict.
pub const MIN_TEST_SIZE: usize = 3;

/// Minimum valid entries per group for Cohen's d.
pub const MIN_EFFECT_SIZE: usize = 2;

/// Returns the finite entries of `data` in their original order.
pub fn valid_values(data: &[f64]) -> Vec<f64> {
    data.iter().copied().filter(|v| v.is_finite()).collect()
}

/// Returns the original positions of the finite entries of `data`.
///
/// `valid_indices(data)[k]` is the index in `data` of the k-th valid value,
/// which maps valid-subsequence indices back to the caller's index space.
pub fn valid_indices(data: &[f64]) -> Vec<usize> {
    data.iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .map(|(i, _)| i)
        .collect()
}

/// Metric vocabulary used to pair samples across models.
///
/// Every metric is "higher is better".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Intersection over union.
    Iou,
    /// Dice coefficient (F1 over pixels).
    Dice,
    /// Pixel or image accuracy.
    Accuracy,
    /// Precision (positive predictive value).
    Precision,
    /// Recall (sensitivity).
    Recall,
    /// F1 score.
    F1,
}

impl Metric {
    /// All metrics in canonical order.
    pub const ALL: [Metric; 6] = [
        Metric::Iou,
        Metric::Dice,
        Metric::Accuracy,
        Metric::Precision,
        Metric::Recall,
        Metric::F1,
    ];

    /// Lowercase identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Iou => "iou",
            Metric::Dice => "dice",
            Metric::Accuracy => "accuracy",
            Metric::Precision => "precision",
            Metric::Recall => "recall",
            Metric::F1 => "f1",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "iou" | "jaccard" => Ok(Metric::Iou),
            "dice" => Ok(Metric::Dice),
            "accuracy" | "acc" => Ok(Metric::Accuracy),
            "precision" => Ok(Metric::Precision),
            "recall" | "sensitivity" => Ok(Metric::Recall),
            "f1" | "f1score" | "f1_score" => Ok(Metric::F1),
            _ => Err(ConfigError::UnknownMetric(s.to_string())),
        }
    }
}

/// Outcome of a per-record computation that must not abort a batch.
///
/// Replaces the "NaN on failure" convention with an inspectable tag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Measured<T> {
    /// The value was computed.
    Value(T),
    /// Too few valid observations.
    InsufficientData,
    /// Input was present but degenerate (zero variance, empty raster).
    Degenerate,
    /// The source could not be read.
    Unavailable,
}

impl<T> Measured<T> {
    /// Returns the computed value, if any.
    pub fn value(self) -> Option<T> {
        match self {
            Measured::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Borrowing variant of [`Measured::value`].
    pub fn as_ref(&self) -> Measured<&T> {
        match self {
            Measured::Value(v) => Measured::Value(v),
            Measured::InsufficientData => Measured::InsufficientData,
            Measured::Degenerate => Measured::Degenerate,
            Measured::Unavailable => Measured::Unavailable,
        }
    }

    /// `true` if a value was computed.
    pub fn is_value(&self) -> bool {
        matches!(self, Measured::Value(_))
    }

    /// Applies `f` to a computed value, keeping the failure tag otherwise.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Measured<U> {
        match self {
            Measured::Value(v) => Measured::Value(f(v)),
            Measured::InsufficientData => Measured::InsufficientData,
            Measured::Degenerate => Measured::Degenerate,
            Measured::Unavailable => Measured::Unavailable,
        }
    }
}

impl Measured<f64> {
    /// The value, or NaN for any failure tag.
    pub fn or_nan(self) -> f64 {
        self.value().unwrap_or(f64::NAN)
    }
}
