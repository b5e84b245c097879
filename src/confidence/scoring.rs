//! Confidence and uncertainty scores for a single prediction raster.
//!
//! Every score lies in [0, 1]. Rasters with values outside [0, 1] are
//! min-max rescaled first (see [`Raster::unit_scaled`]).
//!
//! # Confidence strategies
//!
//! | Method | Score |
//! |---|---|
//! | [`ConfidenceMethod::Entropy`] | 1 − mean 3x3 local entropy / 1 bit |
//! | [`ConfidenceMethod::Variance`] | 1 − mean 3x3 local variance / global variance |
//! | [`ConfidenceMethod::Edge`] | strong-gradient pixels / edge pixels |
//!
//! # Uncertainty strategies
//!
//! | Method | Score |
//! |---|---|
//! | [`UncertaintyMethod::Variance`] | mean 3x3 local variance / 0.25 |
//! | [`UncertaintyMethod::Entropy`] | mean 3x3 local entropy / 1 bit |
//! | [`UncertaintyMethod::Gradient`] | mean gradient magnitude / √2 |
//!
//! Local entropy is the Shannon entropy of the two-bin (foreground /
//! background) soft histogram of each 3x3 window: every pixel adds p to the
//! foreground bin and 1 − p to the background bin, so the window entropy is
//! the binary entropy of its mean. Its maximum is 1 bit, reached by an
//! evenly split window (a 0/1 checkerboard or a uniform 0.5 map alike).
//!
//! 0.25 and √2 are the largest local variance and gradient magnitude a
//! raster in [0, 1] can reach.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use u_numflow::stats;

use super::raster::Raster;
use crate::error::ConfigError;
use crate::sample::Measured;

/// Gradient magnitude above which a pixel lies on an edge.
pub const EDGE_THRESHOLD: f64 = 0.1;

/// Gradient magnitude above which an edge is well defined.
pub const STRONG_EDGE_THRESHOLD: f64 = 0.3;

const MAX_UNIT_VARIANCE: f64 = 0.25;

/// Strategy for [`confidence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceMethod {
    #[default]
    Entropy,
    Variance,
    Edge,
}

impl ConfidenceMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceMethod::Entropy => "entropy",
            ConfidenceMethod::Variance => "variance",
            ConfidenceMethod::Edge => "edge",
        }
    }
}

impl fmt::Display for ConfidenceMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfidenceMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "entropy" => Ok(ConfidenceMethod::Entropy),
            "variance" => Ok(ConfidenceMethod::Variance),
            "edge" | "edge_coherence" => Ok(ConfidenceMethod::Edge),
            _ => Err(ConfigError::UnknownConfidenceMethod(s.to_string())),
        }
    }
}

/// Strategy for [`uncertainty`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UncertaintyMethod {
    #[default]
    Variance,
    Entropy,
    Gradient,
}

impl UncertaintyMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            UncertaintyMethod::Variance => "variance",
            UncertaintyMethod::Entropy => "entropy",
            UncertaintyMethod::Gradient => "gradient",
        }
    }
}

impl fmt::Display for UncertaintyMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UncertaintyMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "variance" => Ok(UncertaintyMethod::Variance),
            "entropy" => Ok(UncertaintyMethod::Entropy),
            "gradient" => Ok(UncertaintyMethod::Gradient),
            _ => Err(ConfigError::UnknownUncertaintyMethod(s.to_string())),
        }
    }
}

// ----------------------------------------------------------------------------
// Scores
// ----------------------------------------------------------------------------

/// Binary entropy H(p) in bits; 0 at p = 0 and p = 1.
pub fn binary_entropy(p: f64) -> f64 {
    if p <= 0.0 || p >= 1.0 {
        return 0.0;
    }
    -(p * p.log2() + (1.0 - p) * (1.0 - p).log2())
}

/// Confidence of one prediction raster.
///
/// # Returns
///
/// - `Degenerate` for the variance method on a constant raster, and for
///   the edge method when no pixel lies on an edge
///
/// # Examples
///
/// ```
/// use u_verdict::confidence::{confidence, ConfidenceMethod, Raster};
///
/// let solid = Raster::new(2, 2, vec![1.0; 4]).unwrap();
/// assert_eq!(confidence(&solid, ConfidenceMethod::Entropy).value(), Some(1.0));
///
/// let unsure = Raster::new(2, 2, vec![0.5; 4]).unwrap();
/// assert_eq!(confidence(&unsure, ConfidenceMethod::Entropy).value(), Some(0.0));
///
/// let checker = Raster::new(2, 2, vec![0.0, 1.0, 1.0, 0.0]).unwrap();
/// assert_eq!(confidence(&checker, ConfidenceMethod::Entropy).value(), Some(0.0));
/// ```
pub fn confidence(raster: &Raster, method: ConfidenceMethod) -> Measured<f64> {
    let r = raster.unit_scaled();
    let score = match method {
        ConfidenceMethod::Entropy => Some(1.0 - mean_local_entropy(&r)),
        ConfidenceMethod::Variance => {
            let global = r.variance();
            (!r.is_constant() && global > 0.0)
                .then(|| 1.0 - mean(&r.local_variance()) / global)
        }
        ConfidenceMethod::Edge => {
            let grad = r.gradient_magnitude();
            let edges = grad.iter().filter(|&&g| g > EDGE_THRESHOLD).count();
            let strong = grad.iter().filter(|&&g| g > STRONG_EDGE_THRESHOLD).count();
            (edges > 0).then(|| strong as f64 / edges as f64)
        }
    };
    bounded(score)
}

/// Uncertainty of one prediction raster. Always computable for a valid
/// raster.
pub fn uncertainty(raster: &Raster, method: UncertaintyMethod) -> Measured<f64> {
    let r = raster.unit_scaled();
    let score = match method {
        UncertaintyMethod::Variance => mean(&r.local_variance()) / MAX_UNIT_VARIANCE,
        UncertaintyMethod::Entropy => mean_local_entropy(&r),
        UncertaintyMethod::Gradient => mean(&r.gradient_magnitude()) / std::f64::consts::SQRT_2,
    };
    bounded(Some(score))
}

fn bounded(score: Option<f64>) -> Measured<f64> {
    match score {
        Some(s) if s.is_finite() => Measured::Value(s.clamp(0.0, 1.0)),
        _ => Measured::Degenerate,
    }
}

fn mean_local_entropy(r: &Raster) -> f64 {
    let entropies: Vec<f64> = r.local_mean().into_iter().map(binary_entropy).collect();
    mean(&entropies)
}

fn mean(values: &[f64]) -> f64 {
    stats::mean(values).unwrap_or(0.0)
}

/// Scores rasters with a fixed pair of strategies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceScorer {
    pub confidence_method: ConfidenceMethod,
    pub uncertainty_method: UncertaintyMethod,
}

impl ConfidenceScorer {
    pub fn new(confidence_method: ConfidenceMethod, uncertainty_method: UncertaintyMethod) -> Self {
        Self {
            confidence_method,
            uncertainty_method,
        }
    }

    /// `(confidence, uncertainty)` for one raster.
    pub fn score(&self, raster: &Raster) -> (Measured<f64>, Measured<f64>) {
        (
            confidence(raster, self.confidence_method),
            uncertainty(raster, self.uncertainty_method),
        )
    }
}
