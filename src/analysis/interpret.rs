//! Ranked findings and recommendations derived from the numeric results.
//!
//! Messages are templated from structured fields; only the fields of
//! [`Finding`] other than `message` carry meaning for callers.

use serde::{Deserialize, Serialize};

use super::verdict::{MetricAnalysis, Side};
use crate::comparison::{EffectMagnitude, TestUsed};
use crate::confidence::ConfidenceSummary;
use crate::correction::CorrectedResult;
use crate::sample::Metric;

/// What a finding reports. Variants are listed in ranking order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// Difference survives multiple-comparison correction.
    SignificantDifference,
    /// Significant before correction only.
    LostAfterCorrection,
    /// A sample holds outlying values.
    Outliers,
    /// Predictions below the low-confidence threshold.
    LowConfidence,
    /// Too few valid values to test.
    InsufficientData,
    /// Metric supplied for one model only.
    UnpairedMetric,
    /// Non-normal data; the rank-sum test was used.
    NonNormal,
    NoDifference,
}

/// One line of interpretation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub metric: Option<Metric>,
    /// Effect magnitude for difference findings.
    pub magnitude: Option<EffectMagnitude>,
    pub message: String,
}

impl Finding {
    fn new(kind: FindingKind, metric: Option<Metric>, message: String) -> Self {
        Self {
            kind,
            metric,
            magnitude: None,
            message,
        }
    }
}

/// Model names used in messages.
pub(crate) struct Names<'a> {
    pub baseline: &'a str,
    pub candidate: &'a str,
}

impl Names<'_> {
    fn of(&self, side: Side) -> &str {
        match side {
            Side::Baseline => self.baseline,
            Side::Candidate => self.candidate,
        }
    }
}

/// Builds findings, most important first: kind, then larger effect, then
/// metric order.
pub(crate) fn findings(
    names: &Names<'_>,
    metrics: &[MetricAnalysis],
    corrected: &CorrectedResult,
    unpaired: &[Metric],
    confidence: [(Side, Option<&ConfidenceSummary>); 2],
    low_confidence_threshold: f64,
) -> Vec<Finding> {
    let mut out = Vec::new();

    for m in metrics {
        out.extend(metric_findings(names, m, corrected));
    }

    for &metric in unpaired {
        out.push(Finding::new(
            FindingKind::UnpairedMetric,
            Some(metric),
            format!("{metric}: supplied for only one model; not compared"),
        ));
    }

    for (side, summary) in confidence {
        let Some(s) = summary else { continue };
        if !s.low_confidence.is_empty() {
            out.push(Finding::new(
                FindingKind::LowConfidence,
                None,
                format!(
                    "{}: {} of {} predictions below confidence {}",
                    names.of(side),
                    s.low_confidence.len(),
                    s.total,
                    low_confidence_threshold
                ),
            ));
        }
    }

    out.sort_by(|a, b| {
        a.kind
            .cmp(&b.kind)
            .then_with(|| b.magnitude.cmp(&a.magnitude))
            .then_with(|| a.metric.cmp(&b.metric))
    });
    out
}

fn metric_findings(
    names: &Names<'_>,
    m: &MetricAnalysis,
    corrected: &CorrectedResult,
) -> Vec<Finding> {
    let mut out = Vec::new();
    let c = &m.comparison;
    let metric = m.metric;

    if c.test_used == TestUsed::InsufficientData {
        out.push(Finding::new(
            FindingKind::InsufficientData,
            Some(metric),
            format!(
                "{metric}: insufficient data ({} has {} valid values, {} has {})",
                names.baseline, c.n1, names.candidate, c.n2
            ),
        ));
        return out;
    }

    let entry = corrected.per_metric.get(&metric);
    let p_adj = entry.and_then(|e| e.corrected_p);
    let magnitude = m.effect_size.magnitude;
    let effect = match (magnitude, m.effect_size.cohens_d.value()) {
        (Some(mag), Some(d)) => format!("{} effect (d = {d:.2})", mag.as_str()),
        _ => "effect size undefined".to_string(),
    };

    let (kind, message) = match (m.winner, c.significant) {
        (Some(side), _) => {
            let (better, worse) = match side {
                Side::Baseline => (c.mean1, c.mean2),
                Side::Candidate => (c.mean2, c.mean1),
            };
            (
                FindingKind::SignificantDifference,
                format!(
                    "{metric}: {} is better ({better:.4} vs {worse:.4}), {}, corrected p = {}, {effect}",
                    names.of(side),
                    c.test_used.as_str(),
                    fmt_p(p_adj),
                ),
            )
        }
        (None, true) => (
            FindingKind::LostAfterCorrection,
            format!(
                "{metric}: p = {} is not significant after {} correction (p = {})",
                fmt_p(c.p_value),
                corrected.method,
                fmt_p(p_adj),
            ),
        ),
        (None, false) => (
            FindingKind::NoDifference,
            format!(
                "{metric}: no significant difference ({:.4} vs {:.4}, p = {})",
                c.mean1,
                c.mean2,
                fmt_p(c.p_value)
            ),
        ),
    };
    out.push(Finding {
        kind,
        metric: Some(metric),
        magnitude,
        message,
    });

    if c.test_used == TestUsed::RankSum {
        let non_normal: Vec<&str> = [
            (Side::Baseline, &m.baseline_normality),
            (Side::Candidate, &m.candidate_normality),
        ]
        .into_iter()
        .filter(|(_, v)| !v.is_normal())
        .map(|(side, _)| names.of(side))
        .collect();
        out.push(Finding::new(
            FindingKind::NonNormal,
            Some(metric),
            format!(
                "{metric}: {} not normally distributed; rank-sum test used",
                non_normal.join(" and ")
            ),
        ));
    }

    for (side, set) in [
        (Side::Baseline, &m.baseline_outliers),
        (Side::Candidate, &m.candidate_outliers),
    ] {
        if !set.is_empty() {
            out.push(Finding::new(
                FindingKind::Outliers,
                Some(metric),
                format!(
                    "{metric}: {} outlier(s) in {} at positions {:?}",
                    set.len(),
                    names.of(side),
                    set.combined_original
                ),
            ));
        }
    }
    out
}

/// Recommendations, one per applicable situation.
pub(crate) fn recommendations(
    names: &Names<'_>,
    metrics: &[MetricAnalysis],
    preferred: Option<Side>,
    findings: &[Finding],
) -> Vec<String> {
    let mut out = Vec::new();
    let wins = |side: Side| -> Vec<Metric> {
        metrics
            .iter()
            .filter(|m| m.winner == Some(side))
            .map(|m| m.metric)
            .collect()
    };
    let baseline_wins = wins(Side::Baseline);
    let candidate_wins = wins(Side::Candidate);

    match preferred {
        Some(side) => {
            let won = if side == Side::Baseline {
                &baseline_wins
            } else {
                &candidate_wins
            };
            out.push(format!(
                "Prefer {}: significantly better on {} and not significantly worse on any metric",
                names.of(side),
                join(won)
            ));
        }
        None if !baseline_wins.is_empty() && !candidate_wins.is_empty() => {
            out.push(format!(
                "No model dominates: {} wins on {}, {} wins on {}; choose by the metric that matters most",
                names.baseline,
                join(&baseline_wins),
                names.candidate,
                join(&candidate_wins)
            ));
        }
        None => {
            out.push(
                "No significant differences after correction; prefer the cheaper model to run"
                    .to_string(),
            );
        }
    }

    let weak: Vec<Metric> = metrics
        .iter()
        .filter(|m| {
            m.winner.is_some()
                && m.effect_size
                    .magnitude
                    .is_some_and(|mag| mag <= EffectMagnitude::Small)
        })
        .map(|m| m.metric)
        .collect();
    if !weak.is_empty() {
        out.push(format!(
            "Differences on {} are significant but small; check their practical relevance",
            join(&weak)
        ));
    }

    let of_kind = |kind: FindingKind| -> Vec<Metric> {
        let mut ms: Vec<Metric> = findings
            .iter()
            .filter(|f| f.kind == kind)
            .filter_map(|f| f.metric)
            .collect();
        ms.dedup();
        ms
    };

    let lost = of_kind(FindingKind::LostAfterCorrection);
    if !lost.is_empty() {
        out.push(format!(
            "Results on {} do not survive correction; confirm with a larger test set",
            join(&lost)
        ));
    }
    let insufficient = of_kind(FindingKind::InsufficientData);
    if !insufficient.is_empty() {
        out.push(format!(
            "Collect at least 3 valid values per model for {}",
            join(&insufficient)
        ));
    }
    let outliers = of_kind(FindingKind::Outliers);
    if !outliers.is_empty() {
        out.push(format!(
            "Inspect outlying samples on {} before drawing conclusions",
            join(&outliers)
        ));
    }
    if findings.iter().any(|f| f.kind == FindingKind::LowConfidence) {
        out.push("Review low-confidence predictions before deployment".to_string());
    }
    out
}

fn join(metrics: &[Metric]) -> String {
    metrics
        .iter()
        .map(Metric::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn fmt_p(p: Option<f64>) -> String {
    p.map_or_else(|| "n/a".to_string(), |p| format!("{p:.4}"))
}
