//! Error types for the crosstalk analysis engine

use std::fmt;

use crate::analysis::result::MetricKind;

/// Errors that can occur during crosstalk analysis
///
/// `DatasetStructure`, `InvalidInput`, `Io` and `Parse` abort a run.
/// The remaining variants are per-subject or per-pair conditions that the
/// pipeline collects into the [`AnalysisReport`](crate::AnalysisReport)
/// instead of returning them.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Measurement grid does not match the configured geometry
    DatasetStructure(String),

    /// Subject id absent from the anthropometric table
    JoinMismatch {
        /// Subject name
        subject: String,
        /// Parsed subject id
        id: u32,
    },

    /// Crosstalk metric could not be derived for a subject
    MetricUndefined {
        /// Subject name
        subject: String,
        /// Direction label
        direction: String,
        /// What went wrong
        reason: String,
    },

    /// Too few paired samples to correlate a (metric, feature) pair
    InsufficientData {
        /// Direction label
        direction: String,
        /// Metric kind
        metric: MetricKind,
        /// Anthropometric feature index
        feature_index: usize,
        /// Number of valid pairs found
        samples: usize,
    },

    /// Invalid input parameters (configuration, arguments, subject names)
    InvalidInput(String),

    /// Filesystem error
    Io(String),

    /// Malformed dataset, table or configuration file
    Parse(String),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::DatasetStructure(msg) => write!(f, "Dataset structure error: {}", msg),
            AnalysisError::JoinMismatch { subject, id } => write!(
                f,
                "Join mismatch: subject {} (id {}) has no anthropometric row",
                subject, id
            ),
            AnalysisError::MetricUndefined {
                subject,
                direction,
                reason,
            } => write!(
                f,
                "Metric undefined: subject {} at {}: {}",
                subject, direction, reason
            ),
            AnalysisError::InsufficientData {
                direction,
                metric,
                feature_index,
                samples,
            } => write!(
                f,
                "Insufficient data: {} {} vs feature {} has {} paired samples (need 2)",
                direction, metric, feature_index, samples
            ),
            AnalysisError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AnalysisError::Io(msg) => write!(f, "I/O error: {}", msg),
            AnalysisError::Parse(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for AnalysisError {}

impl From<std::io::Error> for AnalysisError {
    fn from(err: std::io::Error) -> Self {
        AnalysisError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AnalysisError {
    fn from(err: serde_json::Error) -> Self {
        AnalysisError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_join_mismatch() {
        let err = AnalysisError::JoinMismatch {
            subject: "subject_021_hrir".to_string(),
            id: 21,
        };
        assert_eq!(
            err.to_string(),
            "Join mismatch: subject subject_021_hrir (id 21) has no anthropometric row"
        );
    }

    #[test]
    fn test_display_insufficient_data() {
        let err = AnalysisError::InsufficientData {
            direction: "left_60".to_string(),
            metric: MetricKind::AttenuationDb,
            feature_index: 3,
            samples: 1,
        };
        assert!(err.to_string().contains("attenuation_db"));
        assert!(err.to_string().contains("feature 3"));
    }

    #[test]
    fn test_from_json_error() {
        let err: AnalysisError = serde_json::from_str::<Vec<f64>>("[1.0,")
            .unwrap_err()
            .into();
        assert!(matches!(err, AnalysisError::Parse(_)));
    }
}
