//! Comparative analysis of two models across a set of metrics.
//!
//! [`ComparativeAnalysis`] composes the rest of the crate. For every metric
//! supplied by both models it
//!
//! 1. summarizes and normality-assesses each sample,
//! 2. picks and runs the two-sample test,
//! 3. computes Cohen's d, per-model confidence intervals and outlier sets,
//!
//! then corrects all p-values as one family, decides a winner per metric,
//! optionally scores prediction rasters, and interprets the result.
//!
//! Data problems never fail an analysis: they surface as
//! `insufficient_data` comparisons, [`Measured`](crate::sample::Measured)
//! tags, and findings. Only an invalid [`AnalysisConfig`] is an error, at
//! construction.
//!
//! # Examples
//!
//! ```
//! use u_verdict::analysis::{AnalysisConfig, ComparativeAnalysis, ModelMetrics, Side};
//! use u_verdict::sample::Metric;
//!
//! let baseline = ModelMetrics::new("custom_cnn")
//!     .with_metric(Metric::Iou, vec![0.61, 0.63, 0.60, 0.62, 0.64, 0.59, 0.62, 0.61]);
//! let candidate = ModelMetrics::new("resnet50")
//!     .with_metric(Metric::Iou, vec![0.74, 0.76, 0.73, 0.75, 0.77, 0.72, 0.75, 0.74]);
//!
//! let analysis = ComparativeAnalysis::new(AnalysisConfig::default()).unwrap();
//! let verdict = analysis.analyze(&baseline, &candidate);
//! assert_eq!(verdict.preferred, Some(Side::Candidate));
//! assert!(!verdict.findings.is_empty());
//! ```

mod config;
mod interpret;
mod verdict;

pub use config::AnalysisConfig;
pub use interpret::{Finding, FindingKind};
pub use verdict::{MetricAnalysis, ModelMetrics, Side, Verdict};

use crate::comparison::{confidence_interval, Comparator, EffectSize};
use crate::confidence::{
    score_batch, ConfidenceScorer, ConfidenceSummary, PredictionConfidenceRecord, Raster,
    RasterSource,
};
use crate::correction::CorrectedResult;
use crate::descriptive::describe;
use crate::error::ConfigError;
use crate::outlier::detect_outliers;
use crate::sample::Metric;

use interpret::Names;

/// Configured comparison engine. Stateless between runs.
#[derive(Debug, Clone)]
pub struct ComparativeAnalysis {
    config: AnalysisConfig,
    comparator: Comparator,
    scorer: ConfidenceScorer,
}

impl ComparativeAnalysis {
    /// Validates `config` and builds the engine.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`] from [`AnalysisConfig::validate`].
    pub fn new(config: AnalysisConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let comparator = Comparator::new(config.alpha)?;
        let scorer = ConfidenceScorer::new(config.confidence_method, config.uncertainty_method);
        Ok(Self {
            config,
            comparator,
            scorer,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyzes one metric. `winner` is left unset: it depends on the
    /// correction across all metrics.
    pub fn analyze_metric(
        &self,
        metric: Metric,
        baseline: &[f64],
        candidate: &[f64],
    ) -> MetricAnalysis {
        let assessor = self.comparator.normality();
        let baseline_normality = assessor.assess(baseline);
        let candidate_normality = assessor.assess(candidate);
        let comparison = self
            .comparator
            .compare_assessed(baseline, candidate, &baseline_normality, &candidate_normality)
            .with_metric(metric);
        tracing::debug!(
            metric = metric.as_str(),
            test = comparison.test_used.as_str(),
            n1 = comparison.n1,
            n2 = comparison.n2,
            p = ?comparison.p_value,
            "metric compared"
        );

        let level = self.config.confidence_level;
        MetricAnalysis {
            metric,
            baseline_summary: describe(baseline),
            candidate_summary: describe(candidate),
            baseline_normality,
            candidate_normality,
            comparison,
            effect_size: EffectSize::between(baseline, candidate).with_metric(metric),
            baseline_interval: confidence_interval(baseline, level)
                .map(|ci| ci.with_metric(metric)),
            candidate_interval: confidence_interval(candidate, level)
                .map(|ci| ci.with_metric(metric)),
            baseline_outliers: detect_outliers(baseline, &self.config.outlier),
            candidate_outliers: detect_outliers(candidate, &self.config.outlier),
            winner: None,
        }
    }

    /// Scores prediction rasters with the configured strategies.
    pub fn score_predictions<S: RasterSource + Sync>(
        &self,
        sources: &[S],
    ) -> Vec<PredictionConfidenceRecord> {
        score_batch(sources, &self.scorer)
    }

    /// Compares `candidate` against `baseline` on every shared metric.
    pub fn analyze(&self, baseline: &ModelMetrics, candidate: &ModelMetrics) -> Verdict {
        let paired: Vec<(Metric, &[f64], &[f64])> = baseline
            .metrics
            .iter()
            .filter_map(|(&m, a)| {
                candidate
                    .metrics
                    .get(&m)
                    .map(|b| (m, a.as_slice(), b.as_slice()))
            })
            .collect();

        let unpaired: Vec<Metric> = Metric::ALL
            .into_iter()
            .filter(|m| baseline.metrics.contains_key(m) != candidate.metrics.contains_key(m))
            .collect();
        for m in &unpaired {
            tracing::warn!(metric = m.as_str(), "metric supplied for only one model; skipped");
        }

        let mut metrics = self.analyze_pairs(&paired);

        let comparisons: Vec<_> = metrics.iter().map(|m| m.comparison.clone()).collect();
        let corrected = CorrectedResult::from_comparisons(
            &comparisons,
            self.config.correction,
            self.config.alpha,
        );

        for m in &mut metrics {
            let significant = corrected
                .per_metric
                .get(&m.metric)
                .is_some_and(|e| e.significant);
            if significant {
                let c = &m.comparison;
                m.winner = Some(if c.mean2 > c.mean1 {
                    Side::Candidate
                } else {
                    Side::Baseline
                });
            }
        }

        let preferred = preferred_side(&metrics);

        let baseline_confidence = self.summarize_predictions(&baseline.predictions);
        let candidate_confidence = self.summarize_predictions(&candidate.predictions);

        let names = Names {
            baseline: &baseline.name,
            candidate: &candidate.name,
        };
        let findings = interpret::findings(
            &names,
            &metrics,
            &corrected,
            &unpaired,
            [
                (Side::Baseline, baseline_confidence.as_ref()),
                (Side::Candidate, candidate_confidence.as_ref()),
            ],
            self.config.low_confidence_threshold,
        );
        let recommendations = interpret::recommendations(&names, &metrics, preferred, &findings);

        tracing::info!(
            baseline = %baseline.name,
            candidate = %candidate.name,
            metrics = metrics.len(),
            significant = corrected.significant_metrics().len(),
            unpaired = unpaired.len(),
            "comparative analysis finished"
        );

        Verdict {
            baseline: baseline.name.clone(),
            candidate: candidate.name.clone(),
            config: self.config.clone(),
            metrics,
            unpaired,
            corrected,
            baseline_confidence,
            candidate_confidence,
            preferred,
            findings,
            recommendations,
        }
    }

    fn analyze_pairs(&self, paired: &[(Metric, &[f64], &[f64])]) -> Vec<MetricAnalysis> {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            paired
                .par_iter()
                .map(|&(m, a, b)| self.analyze_metric(m, a, b))
                .collect()
        }

        #[cfg(not(feature = "parallel"))]
        {
            paired
                .iter()
                .map(|&(m, a, b)| self.analyze_metric(m, a, b))
                .collect()
        }
    }

    fn summarize_predictions(
        &self,
        predictions: &[Option<Raster>],
    ) -> Option<ConfidenceSummary> {
        if predictions.is_empty() {
            return None;
        }
        let records = self.score_predictions(predictions);
        Some(ConfidenceSummary::from_records(
            &records,
            self.config.low_confidence_threshold,
        ))
    }
}

fn preferred_side(metrics: &[MetricAnalysis]) -> Option<Side> {
    let won = |side| metrics.iter().any(|m| m.winner == Some(side));
    match (won(Side::Baseline), won(Side::Candidate)) {
        (true, false) => Some(Side::Baseline),
        (false, true) => Some(Side::Candidate),
        _ => None,
    }
}
