//! Error types.
//!
//! Data-quality problems never surface here: they become
//! [`Measured`](crate::sample::Measured) variants so a multi-metric batch
//! keeps running. Only configuration mistakes and raster construction
//! failures are reported as errors.

/// Invalid analysis configuration. Fatal at orchestrator construction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("alpha must be in (0, 1), got {0}")]
    InvalidAlpha(f64),

    #[error("confidence level must be in (0, 1), got {0}")]
    InvalidConfidenceLevel(f64),

    #[error("outlier z threshold must be positive and finite, got {0}")]
    InvalidZThreshold(f64),

    #[error("IQR factor must be non-negative and finite, got {0}")]
    InvalidIqrFactor(f64),

    #[error("low-confidence threshold must be in [0, 1], got {0}")]
    InvalidLowConfidenceThreshold(f64),

    #[error("unknown multiple-comparison method `{0}` (expected bonferroni, fdr or holm)")]
    UnknownCorrectionMethod(String),

    #[error("unknown confidence method `{0}` (expected entropy, variance or edge)")]
    UnknownConfidenceMethod(String),

    #[error("unknown uncertainty method `{0}` (expected variance, entropy or gradient)")]
    UnknownUncertaintyMethod(String),

    #[error("unknown metric `{0}`")]
    UnknownMetric(String),
}

/// A raster that cannot be scored.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RasterError {
    #[error("raster of {rows}x{cols} needs {expected} values, got {actual}")]
    DimensionMismatch {
        rows: usize,
        cols: usize,
        expected: usize,
        actual: usize,
    },

    #[error("raster rows have unequal lengths")]
    RaggedRows,

    #[error("raster is empty")]
    Empty,

    #[error("raster contains non-finite values")]
    NonFinite,

    #[error("raster unavailable: {0}")]
    Unavailable(String),
}
