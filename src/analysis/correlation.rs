//! Statistical correlation of crosstalk metrics with anthropometry
//!
//! For every (direction, metric kind, feature index) the subjects are paired
//! up, skipping any subject whose feature value or metric value is NaN. The
//! exclusion is per feature index: a subject missing one measurement still
//! contributes to every other feature.
//!
//! # Example
//!
//! ```
//! use xfeed_dsp::analysis::correlation::paired_samples;
//!
//! let (feature, metric) = paired_samples(&[1.0, f64::NAN, 3.0], &[10.0, 20.0, 30.0]);
//! assert_eq!(feature, vec![1.0, 3.0]);
//! assert_eq!(metric, vec![10.0, 30.0]);
//! ```

use crate::analysis::result::{
    CorrelationResult, MetricKind, SignificanceReport, SkippedPair, SubjectMetrics,
};
use crate::analysis::statistics::{kendall, pearson, spearman};
use crate::error::AnalysisError;
use crate::io::names::FeatureNames;

/// Minimum paired samples for a correlation
pub const MIN_PAIRED_SAMPLES: usize = 2;

/// Pair feature and metric values, dropping positions where either is NaN
pub fn paired_samples(feature: &[f64], metric: &[f64]) -> (Vec<f64>, Vec<f64>) {
    feature
        .iter()
        .zip(metric.iter())
        .filter(|(f, m)| !f.is_nan() && !m.is_nan())
        .map(|(&f, &m)| (f, m))
        .unzip()
}

/// Run the three correlation tests on one (direction, metric, feature) pair
///
/// # Errors
///
/// Returns `AnalysisError::InsufficientData` if fewer than two valid pairs
/// remain after NaN exclusion.
pub fn correlate_pair(
    direction: &str,
    metric: MetricKind,
    feature_index: usize,
    feature_name: &str,
    feature_values: &[f64],
    metric_values: &[f64],
) -> Result<CorrelationResult, AnalysisError> {
    let (x, y) = paired_samples(feature_values, metric_values);

    if x.len() < MIN_PAIRED_SAMPLES {
        return Err(AnalysisError::InsufficientData {
            direction: direction.to_string(),
            metric,
            feature_index,
            samples: x.len(),
        });
    }

    Ok(CorrelationResult {
        direction: direction.to_string(),
        metric,
        feature_index,
        feature_name: feature_name.to_string(),
        samples: x.len(),
        pearson: pearson(&x, &y),
        spearman: spearman(&x, &y),
        kendall: kendall(&x, &y),
    })
}

/// One report per (result, threshold) where all three tests pass
///
/// Thresholds are checked independently, in the order given.
pub fn significance_reports(
    results: &[CorrelationResult],
    thresholds: &[f64],
) -> Vec<SignificanceReport> {
    results
        .iter()
        .flat_map(|result| {
            thresholds
                .iter()
                .filter(move |&&s| result.significant_at(s))
                .map(move |&threshold| SignificanceReport {
                    direction: result.direction.clone(),
                    metric: result.metric,
                    feature_index: result.feature_index,
                    feature_name: result.feature_name.clone(),
                    threshold,
                })
        })
        .collect()
}

/// Correlator output
#[derive(Debug, Clone, Default)]
pub struct CorrelationOutput {
    /// Tested pairs
    pub correlations: Vec<CorrelationResult>,
    /// Pairs skipped for insufficient data
    pub skipped: Vec<SkippedPair>,
    /// Satisfied thresholds
    pub significant: Vec<SignificanceReport>,
}

/// Correlate every (direction, metric kind, feature index) across subjects
///
/// A subject without a metric for a direction contributes NaN and is
/// dropped from that direction's pairs only.
pub fn correlate_all(
    subjects: &[SubjectMetrics],
    directions: &[String],
    metrics: &[MetricKind],
    feature_count: usize,
    names: &FeatureNames,
    thresholds: &[f64],
) -> CorrelationOutput {
    let mut output = CorrelationOutput::default();

    // feature-index × subject-index
    let feature_matrix: Vec<Vec<f64>> = (0..feature_count)
        .map(|f| {
            subjects
                .iter()
                .map(|s| s.features.get(f).copied().unwrap_or(f64::NAN))
                .collect()
        })
        .collect();

    for direction in directions {
        for &metric in metrics {
            let metric_values: Vec<f64> = subjects
                .iter()
                .map(|s| {
                    s.metric(direction)
                        .map(|m| m.value(metric))
                        .unwrap_or(f64::NAN)
                })
                .collect();

            for (feature_index, feature_values) in feature_matrix.iter().enumerate() {
                let name = names.name(feature_index);
                match correlate_pair(
                    direction,
                    metric,
                    feature_index,
                    &name,
                    feature_values,
                    &metric_values,
                ) {
                    Ok(result) => output.correlations.push(result),
                    Err(e) => {
                        log::warn!("Skipping pair: {}", e);
                        let samples = match &e {
                            AnalysisError::InsufficientData { samples, .. } => *samples,
                            _ => 0,
                        };
                        output.skipped.push(SkippedPair {
                            direction: direction.clone(),
                            metric,
                            feature_index,
                            samples,
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }
    }

    output.significant = significance_reports(&output.correlations, thresholds);

    log::debug!(
        "Correlated {} pairs ({} skipped), {} significance reports",
        output.correlations.len(),
        output.skipped.len(),
        output.significant.len()
    );

    output
}
