//! Inputs and outputs of a comparative analysis.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::config::AnalysisConfig;
use super::interpret::Finding;
use crate::comparison::{ComparisonResult, ConfidenceInterval, EffectSize};
use crate::confidence::{ConfidenceSummary, Raster};
use crate::correction::CorrectedResult;
use crate::descriptive::Summary;
use crate::normality::NormalityVerdict;
use crate::outlier::OutlierSet;
use crate::sample::{Measured, Metric};

/// Per-sample metric values (and optionally prediction rasters) of one model.
///
/// # Examples
///
/// ```
/// use u_verdict::analysis::ModelMetrics;
/// use u_verdict::sample::Metric;
///
/// let model = ModelMetrics::new("resnet50")
///     .with_metric(Metric::Iou, vec![0.71, 0.74, 0.69])
///     .with_metric(Metric::Dice, vec![0.82, 0.85, 0.80]);
/// assert_eq!(model.metrics.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub name: String,
    /// NaN entries are missing values.
    pub metrics: BTreeMap<Metric, Vec<f64>>,
    /// Prediction rasters to score; `None` marks an unreadable prediction.
    #[serde(default)]
    pub predictions: Vec<Option<Raster>>,
}

impl ModelMetrics {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_metric(mut self, metric: Metric, values: Vec<f64>) -> Self {
        self.metrics.insert(metric, values);
        self
    }

    pub fn with_predictions(mut self, predictions: Vec<Option<Raster>>) -> Self {
        self.predictions = predictions;
        self
    }
}

/// One of the two compared models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Baseline,
    Candidate,
}

/// Everything computed for one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricAnalysis {
    pub metric: Metric,
    pub baseline_summary: Summary,
    pub candidate_summary: Summary,
    pub baseline_normality: NormalityVerdict,
    pub candidate_normality: NormalityVerdict,
    pub comparison: ComparisonResult,
    /// Cohen's d of baseline against candidate.
    pub effect_size: EffectSize,
    pub baseline_interval: Measured<ConfidenceInterval>,
    pub candidate_interval: Measured<ConfidenceInterval>,
    pub baseline_outliers: OutlierSet,
    pub candidate_outliers: OutlierSet,
    /// Better model, set only when the difference survives correction.
    pub winner: Option<Side>,
}

/// Top-level result of [`ComparativeAnalysis::analyze`](super::ComparativeAnalysis::analyze).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub baseline: String,
    pub candidate: String,
    pub config: AnalysisConfig,
    /// One entry per metric present in both models, in [`Metric`] order.
    pub metrics: Vec<MetricAnalysis>,
    /// Metrics supplied for only one model.
    pub unpaired: Vec<Metric>,
    pub corrected: CorrectedResult,
    pub baseline_confidence: Option<ConfidenceSummary>,
    pub candidate_confidence: Option<ConfidenceSummary>,
    /// Model that wins at least one metric and loses none.
    pub preferred: Option<Side>,
    /// Ranked, most important first.
    pub findings: Vec<Finding>,
    pub recommendations: Vec<String>,
}

impl Verdict {
    /// Name of the model on `side`.
    pub fn name(&self, side: Side) -> &str {
        match side {
            Side::Baseline => &self.baseline,
            Side::Candidate => &self.candidate,
        }
    }

    pub fn metric(&self, metric: Metric) -> Option<&MetricAnalysis> {
        self.metrics.iter().find(|m| m.metric == metric)
    }

    pub fn comparisons(&self) -> impl Iterator<Item = &ComparisonResult> {
        self.metrics.iter().map(|m| &m.comparison)
    }

    pub fn effect_sizes(&self) -> impl Iterator<Item = &EffectSize> {
        self.metrics.iter().map(|m| &m.effect_size)
    }

    /// `(metric, baseline, candidate)` normality verdicts.
    pub fn normality_verdicts(
        &self,
    ) -> impl Iterator<Item = (Metric, &NormalityVerdict, &NormalityVerdict)> {
        self.metrics
            .iter()
            .map(|m| (m.metric, &m.baseline_normality, &m.candidate_normality))
    }

    /// Metrics won by `side` after correction.
    pub fn wins(&self, side: Side) -> Vec<Metric> {
        self.metrics
            .iter()
            .filter(|m| m.winner == Some(side))
            .map(|m| m.metric)
            .collect()
    }

    /// Plain-text report for terminals and logs. Same as the `Display` output.
    pub fn to_report_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} vs {}", self.baseline, self.candidate)?;
        writeln!(
            f,
            "alpha = {}, correction = {}, intervals at {}%",
            self.config.alpha,
            self.corrected.method,
            self.config.confidence_level * 100.0
        )?;
        match self.preferred {
            Some(side) => writeln!(f, "Preferred: {}", self.name(side))?,
            None => writeln!(f, "Preferred: none")?,
        }

        if !self.metrics.is_empty() {
            writeln!(f, "\nMetrics:")?;
        }
        for m in &self.metrics {
            let c = &m.comparison;
            let corrected = self
                .corrected
                .per_metric
                .get(&m.metric)
                .and_then(|e| e.corrected_p);
            writeln!(
                f,
                "  {:<10} {:.4} vs {:.4}  {:<17} p = {}  p_adj = {}  d = {}",
                m.metric.as_str(),
                c.mean1,
                c.mean2,
                c.test_used.as_str(),
                fmt_p(c.p_value),
                fmt_p(corrected),
                fmt_measured(m.effect_size.cohens_d),
            )?;
        }

        if !self.findings.is_empty() {
            writeln!(f, "\nFindings:")?;
            for (i, finding) in self.findings.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, finding.message)?;
            }
        }
        if !self.recommendations.is_empty() {
            writeln!(f, "\nRecommendations:")?;
            for r in &self.recommendations {
                writeln!(f, "  - {r}")?;
            }
        }
        Ok(())
    }
}

fn fmt_p(p: Option<f64>) -> String {
    p.map_or_else(|| "n/a".to_string(), |p| format!("{p:.4}"))
}

fn fmt_measured(m: Measured<f64>) -> String {
    match m {
        Measured::Value(v) => format!("{v:.2}"),
        Measured::InsufficientData => "insufficient data".to_string(),
        Measured::Degenerate => "degenerate".to_string(),
        Measured::Unavailable => "n/a".to_string(),
    }
}
