//! # u-verdict
//!
//! Statistical comparison and decision engine for judging whether one
//! trained model outperforms another.
//!
//! The crate operates on raw per-sample metric arrays (`&[f64]`, NaN =
//! missing) and prediction rasters. It knows nothing about training,
//! inference, file formats or rendering.
//!
//! ## Modules
//!
//! - [`distribution`] — Normal CDF/quantile, Student-t quantile, percentiles, ranks
//! - [`descriptive`] — Summary statistics with shape moments
//! - [`sample`] — Valid-value filtering, metric vocabulary, tagged results
//! - [`normality`] — KS-based normal/non-normal assessment
//! - [`testing`] — Welch t, Mann–Whitney U, variance-ratio F test
//! - [`comparison`] — Automatic test selection, Cohen's d, confidence intervals
//! - [`correction`] — Bonferroni, Holm, Benjamini–Hochberg
//! - [`outlier`] — IQR and (robust) z-score outlier rules
//! - [`confidence`] — Per-prediction confidence and uncertainty scoring
//! - [`confusion`] — Confusion-matrix error patterns and accuracy intervals
//! - [`analysis`] — Multi-metric orchestrator producing a [`Verdict`](analysis::Verdict)
//!
//! ## Design Philosophy
//!
//! - **Never abort a batch**: data problems become tagged results, only
//!   configuration errors are `Err`
//! - **Numerical stability**: Leverages `u-numflow` for stable statistics
//! - **Research-backed**: All algorithms reference academic literature
//!
//! ## Features
//!
//! - `parallel` — fan per-metric analysis and raster scoring out over rayon

pub mod analysis;
pub mod comparison;
pub mod confidence;
pub mod confusion;
pub mod correction;
pub mod descriptive;
pub mod distribution;
pub mod error;
pub mod normality;
pub mod outlier;
pub mod sample;
pub mod testing;

pub use error::{ConfigError, RasterError};
