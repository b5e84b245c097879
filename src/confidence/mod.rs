//! Per-prediction confidence and uncertainty scoring.
//!
//! Consumes 2-D prediction rasters (probability maps, soft masks) and
//! scores how decisive each prediction is. The strategy is fixed per
//! [`ConfidenceScorer`], not chosen per call.
//!
//! - [`Raster`] — validated row-major raster, plus the [`RasterSource`]
//!   trait for inputs that may be missing or unreadable
//! - [`confidence`] / [`uncertainty`] — single-raster scores in [0, 1]
//! - [`score_batch`] — index-ordered batch scoring that never aborts on a
//!   bad record
//!
//! # References
//!
//! - Shannon, C.E. (1948). "A Mathematical Theory of Communication",
//!   *Bell System Technical Journal* 27(3), pp. 379-423.
//! - Kendall, A. & Gal, Y. (2017). "What Uncertainties Do We Need in
//!   Bayesian Deep Learning for Computer Vision?", *NeurIPS*.

mod batch;
mod raster;
mod scoring;

pub use batch::{score_batch, score_one, ConfidenceSummary, PredictionConfidenceRecord};
pub use raster::{Raster, RasterSource};
pub use scoring::{
    binary_entropy, confidence, uncertainty, ConfidenceMethod, ConfidenceScorer,
    UncertaintyMethod, EDGE_THRESHOLD, STRONG_EDGE_THRESHOLD,
};
