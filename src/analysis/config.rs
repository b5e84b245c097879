//! Configuration for a comparative analysis run.

use serde::{Deserialize, Serialize};

use crate::confidence::{ConfidenceMethod, UncertaintyMethod};
use crate::correction::CorrectionMethod;
use crate::error::ConfigError;
use crate::outlier::OutlierConfig;

/// Every tunable of a [`ComparativeAnalysis`](super::ComparativeAnalysis).
///
/// Passed in at construction and never changed afterwards; two analyses
/// with different settings share no state.
///
/// # Examples
///
/// ```
/// use u_verdict::analysis::AnalysisConfig;
/// use u_verdict::correction::CorrectionMethod;
///
/// let config = AnalysisConfig::default();
/// assert_eq!(config.alpha, 0.05);
/// assert_eq!(config.correction, CorrectionMethod::Bonferroni);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Significance level for normality and comparison tests.
    pub alpha: f64,

    /// Multiple-comparison procedure applied across metrics.
    pub correction: CorrectionMethod,

    /// Level of the per-model confidence intervals, e.g. 0.95.
    pub confidence_level: f64,

    pub confidence_method: ConfidenceMethod,

    pub uncertainty_method: UncertaintyMethod,

    pub outlier: OutlierConfig,

    /// Predictions scoring below this confidence are reported.
    pub low_confidence_threshold: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            correction: CorrectionMethod::Bonferroni,
            confidence_level: 0.95,
            confidence_method: ConfidenceMethod::Entropy,
            uncertainty_method: UncertaintyMethod::Variance,
            outlier: OutlierConfig::default(),
            low_confidence_threshold: 0.5,
        }
    }
}

impl AnalysisConfig {
    /// Fewer false positives: α = 0.01, Holm, 99% intervals.
    pub fn strict() -> Self {
        Self {
            alpha: 0.01,
            correction: CorrectionMethod::Holm,
            confidence_level: 0.99,
            outlier: OutlierConfig {
                z_threshold: 3.5,
                ..OutlierConfig::default()
            },
            ..Self::default()
        }
    }

    /// Fewer false negatives: α = 0.10, Benjamini–Hochberg, 90% intervals.
    pub fn permissive() -> Self {
        Self {
            alpha: 0.10,
            correction: CorrectionMethod::BenjaminiHochberg,
            confidence_level: 0.90,
            outlier: OutlierConfig {
                z_threshold: 2.5,
                ..OutlierConfig::default()
            },
            ..Self::default()
        }
    }

    /// Checks every field.
    ///
    /// # Errors
    ///
    /// The first invalid field, as a [`ConfigError`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(ConfigError::InvalidAlpha(self.alpha));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(ConfigError::InvalidConfidenceLevel(self.confidence_level));
        }
        if !(0.0..=1.0).contains(&self.low_confidence_threshold) {
            return Err(ConfigError::InvalidLowConfidenceThreshold(
                self.low_confidence_threshold,
            ));
        }
        self.outlier.validate()
    }
}
