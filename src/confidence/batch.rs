//! Batch scoring across many predictions.
//!
//! Each record is scored independently. A source that fails to load marks
//! its own record [`Measured::Unavailable`], logs a warning, and the batch
//! carries on. With the `parallel` feature the batch fans out over rayon;
//! output order always matches input order.

use serde::{Deserialize, Serialize};

use super::raster::RasterSource;
use super::scoring::ConfidenceScorer;
use crate::sample::Measured;

/// Confidence and uncertainty of one prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionConfidenceRecord {
    /// Position of the prediction in the input batch.
    pub index: usize,
    pub confidence: Measured<f64>,
    pub uncertainty: Measured<f64>,
}

/// Scores one source.
pub fn score_one<S: RasterSource + ?Sized>(
    index: usize,
    source: &S,
    scorer: &ConfidenceScorer,
) -> PredictionConfidenceRecord {
    match source.load() {
        Ok(raster) => {
            let (confidence, uncertainty) = scorer.score(&raster);
            PredictionConfidenceRecord {
                index,
                confidence,
                uncertainty,
            }
        }
        Err(e) => {
            tracing::warn!(index, error = %e, "prediction raster unreadable; scoring skipped");
            PredictionConfidenceRecord {
                index,
                confidence: Measured::Unavailable,
                uncertainty: Measured::Unavailable,
            }
        }
    }
}

/// Scores every source in `sources`.
///
/// # Examples
///
/// ```
/// use u_verdict::confidence::{score_batch, ConfidenceScorer, Raster};
/// use u_verdict::sample::Measured;
///
/// let sources = vec![
///     Some(Raster::new(1, 2, vec![1.0, 1.0]).unwrap()),
///     None,
/// ];
/// let records = score_batch(&sources, &ConfidenceScorer::default());
/// assert_eq!(records[0].confidence, Measured::Value(1.0));
/// assert_eq!(records[1].confidence, Measured::Unavailable);
/// ```
pub fn score_batch<S: RasterSource + Sync>(
    sources: &[S],
    scorer: &ConfidenceScorer,
) -> Vec<PredictionConfidenceRecord> {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;

        sources
            .par_iter()
            .enumerate()
            .map(|(i, s)| score_one(i, s, scorer))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        sources
            .iter()
            .enumerate()
            .map(|(i, s)| score_one(i, s, scorer))
            .collect()
    }
}

/// Aggregate over a scored batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceSummary {
    pub total: usize,
    /// Records with a confidence value.
    pub scored: usize,
    pub unavailable: usize,
    pub mean_confidence: Measured<f64>,
    pub mean_uncertainty: Measured<f64>,
    /// Indices whose confidence is below the threshold.
    pub low_confidence: Vec<usize>,
}

impl ConfidenceSummary {
    /// Summarizes `records`, flagging confidence below `low_threshold`.
    pub fn from_records(records: &[PredictionConfidenceRecord], low_threshold: f64) -> Self {
        let confidences: Vec<f64> = records.iter().filter_map(|r| r.confidence.value()).collect();
        let uncertainties: Vec<f64> = records.iter().filter_map(|r| r.uncertainty.value()).collect();
        let unavailable = records
            .iter()
            .filter(|r| r.confidence == Measured::Unavailable)
            .count();
        let low_confidence = records
            .iter()
            .filter(|r| r.confidence.value().is_some_and(|c| c < low_threshold))
            .map(|r| r.index)
            .collect();

        Self {
            total: records.len(),
            scored: confidences.len(),
            unavailable,
            mean_confidence: mean_of(&confidences),
            mean_uncertainty: mean_of(&uncertainties),
            low_confidence,
        }
    }
}

fn mean_of(values: &[f64]) -> Measured<f64> {
    match u_numflow::stats::mean(values) {
        Some(m) => Measured::Value(m),
        None => Measured::InsufficientData,
    }
}
