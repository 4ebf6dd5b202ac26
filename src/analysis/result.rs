//! Analysis result types

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::features::crosstalk::{CrosstalkMetric, QualityFlag};
use crate::io::dataset::LoadFailure;

/// Crosstalk scalar correlated against anthropometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Turnover frequency in Hz
    Frequency,
    /// Attenuation in dB
    AttenuationDb,
    /// Linear attenuation (RMS difference)
    AttenuationLinear,
}

impl MetricKind {
    /// Snake-case name used in reports
    pub fn name(&self) -> &'static str {
        match self {
            MetricKind::Frequency => "frequency",
            MetricKind::AttenuationDb => "attenuation_db",
            MetricKind::AttenuationLinear => "attenuation_linear",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Correlation coefficient with its two-sided p-value
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TestStatistic {
    /// Coefficient (r, rho or tau); NaN for a constant input
    pub coefficient: f64,
    /// Two-sided p-value; NaN for a constant input
    pub p_value: f64,
}

/// Three correlation tests of one (direction, metric, feature) pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationResult {
    /// Direction label
    pub direction: String,
    /// Metric kind
    pub metric: MetricKind,
    /// Anthropometric feature index
    pub feature_index: usize,
    /// Feature name from the name map
    pub feature_name: String,
    /// Number of paired samples used
    pub samples: usize,
    /// Pearson product-moment correlation
    pub pearson: TestStatistic,
    /// Spearman rank correlation
    pub spearman: TestStatistic,
    /// Kendall tau-b
    pub kendall: TestStatistic,
}

impl CorrelationResult {
    /// True when all three p-values are below `threshold`
    ///
    /// NaN p-values never pass.
    pub fn significant_at(&self, threshold: f64) -> bool {
        [self.pearson, self.spearman, self.kendall]
            .iter()
            .all(|t| t.p_value < threshold)
    }

    /// Strictest of `thresholds` passed by all three tests
    pub fn strictest_threshold(&self, thresholds: &[f64]) -> Option<f64> {
        thresholds
            .iter()
            .copied()
            .filter(|&s| self.significant_at(s))
            .fold(None, |best: Option<f64>, s| match best {
                Some(b) if b <= s => Some(b),
                _ => Some(s),
            })
    }
}

/// One satisfied significance threshold
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignificanceReport {
    /// Direction label
    pub direction: String,
    /// Metric kind
    pub metric: MetricKind,
    /// Anthropometric feature index
    pub feature_index: usize,
    /// Feature name from the name map
    pub feature_name: String,
    /// p-value cutoff met by all three tests
    pub threshold: f64,
}

/// A pair that could not be correlated
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedPair {
    /// Direction label
    pub direction: String,
    /// Metric kind
    pub metric: MetricKind,
    /// Anthropometric feature index
    pub feature_index: usize,
    /// Valid paired samples found
    pub samples: usize,
    /// Rendered `InsufficientData` error
    pub reason: String,
}

/// Why a subject was left out of correlation entirely
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ExclusionReason {
    /// No anthropometric row with the subject's id
    JoinMismatch,
}

/// A subject excluded from correlation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectExclusion {
    /// Subject id
    pub id: u32,
    /// Subject name
    pub name: String,
    /// Exclusion category
    pub reason: ExclusionReason,
    /// Rendered error
    pub detail: String,
}

/// A metric missing for one subject, direction and metric kind(s)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricIssue {
    /// Subject id
    pub id: u32,
    /// Subject name
    pub name: String,
    /// Direction label
    pub direction: String,
    /// Metric kinds left out of correlation for this subject and direction
    pub metrics: Vec<MetricKind>,
    /// Rendered `MetricUndefined` error
    pub detail: String,
}

/// Crosstalk metrics of one joined subject
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectMetrics {
    /// Subject id
    pub id: u32,
    /// Subject name
    pub name: String,
    /// One entry per direction where a turnover was found
    pub metrics: Vec<CrosstalkMetric>,
    /// Anthropometric features (NaN where missing)
    pub features: Vec<f64>,
}

impl SubjectMetrics {
    /// Metric for `direction`, if defined
    pub fn metric(&self, direction: &str) -> Option<&CrosstalkMetric> {
        self.metrics.iter().find(|m| m.direction == direction)
    }

    /// All quality flags raised for this subject
    pub fn flags(&self) -> impl Iterator<Item = (&str, QualityFlag)> + '_ {
        self.metrics
            .iter()
            .flat_map(|m| m.flags.iter().map(move |&f| (m.direction.as_str(), f)))
    }
}

/// Run metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisMetadata {
    /// Crate version
    pub algorithm_version: String,
    /// Subjects given to the pipeline
    pub subjects_total: usize,
    /// Directions analyzed
    pub directions: Vec<String>,
    /// Significance thresholds checked
    pub thresholds: Vec<f64>,
    /// Processing time in milliseconds
    pub processing_time_ms: f64,
}

/// Complete output of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    /// Subjects joined and correlated
    pub analyzed: Vec<SubjectMetrics>,
    /// Subjects excluded from all correlations
    pub excluded: Vec<SubjectExclusion>,
    /// Per-subject metrics excluded for one direction or metric kind
    pub metric_issues: Vec<MetricIssue>,
    /// Dataset files that failed to load
    pub load_failures: Vec<LoadFailure>,
    /// Every correlated pair, in (direction, metric, feature) order
    pub correlations: Vec<CorrelationResult>,
    /// Pairs skipped for insufficient data
    pub skipped: Vec<SkippedPair>,
    /// One entry per satisfied (pair, threshold)
    pub significant: Vec<SignificanceReport>,
    /// Run metadata
    pub metadata: AnalysisMetadata,
}

impl AnalysisReport {
    /// Correlations that satisfy none of the thresholds
    pub fn insignificant(&self) -> impl Iterator<Item = &CorrelationResult> + '_ {
        self.correlations.iter().filter(move |c| {
            !self.metadata.thresholds.iter().any(|&s| c.significant_at(s))
        })
    }

    /// Correlation result for one pair
    pub fn correlation(
        &self,
        direction: &str,
        metric: MetricKind,
        feature_index: usize,
    ) -> Option<&CorrelationResult> {
        self.correlations.iter().find(|c| {
            c.direction == direction && c.metric == metric && c.feature_index == feature_index
        })
    }

    /// Paths of files that failed to load
    pub fn failed_paths(&self) -> Vec<PathBuf> {
        self.load_failures.iter().map(|f| f.path.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with(p: [f64; 3]) -> CorrelationResult {
        let stat = |p_value| TestStatistic {
            coefficient: 0.9,
            p_value,
        };
        CorrelationResult {
            direction: "left_60".to_string(),
            metric: MetricKind::Frequency,
            feature_index: 0,
            feature_name: "head width".to_string(),
            samples: 10,
            pearson: stat(p[0]),
            spearman: stat(p[1]),
            kendall: stat(p[2]),
        }
    }

    #[test]
    fn test_metric_kind_names() {
        assert_eq!(MetricKind::Frequency.to_string(), "frequency");
        assert_eq!(
            serde_json::to_string(&MetricKind::AttenuationDb).unwrap(),
            "\"attenuation_db\""
        );
        let kind: MetricKind = serde_json::from_str("\"attenuation_linear\"").unwrap();
        assert_eq!(kind, MetricKind::AttenuationLinear);
    }

    #[test]
    fn test_significance_requires_all_three() {
        let result = result_with([0.0001, 0.004, 0.03]);
        assert!(result.significant_at(0.05));
        assert!(!result.significant_at(0.01));
        assert!(!result.significant_at(0.001));
        assert_eq!(result.strictest_threshold(&[0.05, 0.01, 0.001]), Some(0.05));

        let result = result_with([0.0001, 0.0002, 0.0003]);
        assert_eq!(result.strictest_threshold(&[0.05, 0.01, 0.001]), Some(0.001));
    }

    #[test]
    fn test_nan_never_significant() {
        let result = result_with([f64::NAN, 0.0, 0.0]);
        assert!(!result.significant_at(0.05));
        assert_eq!(result.strictest_threshold(&[0.05]), None);
    }
}
