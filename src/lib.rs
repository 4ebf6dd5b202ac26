//! # xfeed-dsp
//!
//! HRIR crosstalk analysis: measures how much of a sound aimed at one ear
//! leaks to the other for a set of listening directions, then correlates that
//! crosstalk signature with anthropometric measurements across a population.
//!
//! ## Features
//!
//! - **Directional extraction**: 0°-elevation slices per ear, with averaging of adjacent azimuths
//! - **Spectral transform**: fixed-length DFT (200 samples by default)
//! - **Crosstalk metric**: turnover frequency and attenuation (linear and dB) per subject
//! - **Correlation**: Pearson, Spearman and Kendall with multi-threshold significance
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use xfeed_dsp::io::anthropometry::AnthropometricTable;
//! use xfeed_dsp::io::dataset::load_dataset;
//! use xfeed_dsp::io::names::FeatureNames;
//! use xfeed_dsp::{analyze_dataset, AnalysisConfig};
//!
//! let dataset = load_dataset(Path::new("standard_hrir_database"))?;
//! let table = AnthropometricTable::from_json_file(Path::new("anthro.json"))?;
//!
//! let report = analyze_dataset(dataset, &table, &FeatureNames::cipic(), &AnalysisConfig::default())?;
//! for s in &report.significant {
//!     println!("{} {} ~ {} (p < {})", s.direction, s.metric, s.feature_name, s.threshold);
//! }
//! # Ok::<(), xfeed_dsp::AnalysisError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Dataset → Directional Extraction → Spectrum → Crosstalk Metric → Join → Correlation → Report
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod features;
pub mod io;

// Re-export main types
pub use analysis::report::{JsonRenderer, ReportRenderer, TextRenderer};
pub use analysis::result::{
    AnalysisMetadata, AnalysisReport, CorrelationResult, MetricKind, SignificanceReport,
};
pub use config::{AnalysisConfig, DirectionConfig, Ear};
pub use error::AnalysisError;
pub use features::crosstalk::CrosstalkMetric;

use analysis::correlation::correlate_all;
use analysis::join::AnthropometricIndex;
use analysis::result::{ExclusionReason, MetricIssue, SubjectExclusion, SubjectMetrics};
use features::crosstalk::extract_crosstalk;
use features::directional::extract_directions;
use features::spectrum::SpectralTransformer;
use io::anthropometry::AnthropometricTable;
use io::dataset::{LoadedDataset, Subject};
use io::names::FeatureNames;

/// Crosstalk metrics of one subject before the anthropometric join
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectAnalysis {
    /// Subject id
    pub id: u32,
    /// Subject name
    pub name: String,
    /// One metric per direction where a turnover was found
    pub metrics: Vec<CrosstalkMetric>,
    /// Metrics that could not be derived
    pub issues: Vec<MetricIssue>,
}

/// Extract the crosstalk metrics of one subject
///
/// # Errors
///
/// Returns `AnalysisError::DatasetStructure` if the subject's grids do not
/// match the configured geometry. Undefined metrics are not errors; they are
/// listed in [`SubjectAnalysis::issues`].
pub fn analyze_subject(
    subject: &Subject,
    transformer: &SpectralTransformer,
    config: &AnalysisConfig,
) -> Result<SubjectAnalysis, AnalysisError> {
    let pairs = extract_directions(subject, config)?;

    let mut analysis = SubjectAnalysis {
        id: subject.id,
        name: subject.name.clone(),
        metrics: Vec::with_capacity(pairs.len()),
        issues: Vec::new(),
    };

    for pair in pairs {
        let ipsilateral = transformer.transform(&pair.ipsilateral.samples);
        let contralateral = transformer.transform(&pair.contralateral.samples);

        match extract_crosstalk(
            &subject.name,
            &pair.direction,
            &ipsilateral,
            &contralateral,
            config.scan_start_bin,
        ) {
            Ok(metric) => {
                if !metric.has_attenuation_db() {
                    let err = AnalysisError::MetricUndefined {
                        subject: subject.name.clone(),
                        direction: pair.direction.clone(),
                        reason: format!(
                            "linear attenuation {:.6} is not positive, dB undefined",
                            metric.attenuation_linear
                        ),
                    };
                    log::warn!("{}", err);
                    analysis.issues.push(MetricIssue {
                        id: subject.id,
                        name: subject.name.clone(),
                        direction: pair.direction.clone(),
                        metrics: vec![MetricKind::AttenuationDb],
                        detail: err.to_string(),
                    });
                }
                analysis.metrics.push(metric);
            }
            Err(err @ AnalysisError::MetricUndefined { .. }) => {
                log::warn!("{}", err);
                analysis.issues.push(MetricIssue {
                    id: subject.id,
                    name: subject.name.clone(),
                    direction: pair.direction.clone(),
                    metrics: config.metrics.clone(),
                    detail: err.to_string(),
                });
            }
            Err(err) => return Err(err),
        }
    }

    Ok(analysis)
}

/// Run [`analyze_subject`] over every subject, on the rayon pool when enabled
fn analyze_all(
    subjects: &[Subject],
    transformer: &SpectralTransformer,
    config: &AnalysisConfig,
) -> Result<Vec<SubjectAnalysis>, AnalysisError> {
    #[cfg(feature = "parallel")]
    {
        if config.parallel {
            use rayon::prelude::*;
            return subjects
                .par_iter()
                .map(|subject| analyze_subject(subject, transformer, config))
                .collect();
        }
    }

    subjects
        .iter()
        .map(|subject| analyze_subject(subject, transformer, config))
        .collect()
}

/// Main analysis function
///
/// Extracts crosstalk metrics for every subject, joins them with the
/// anthropometric table and correlates every (direction, metric kind,
/// feature) combination.
///
/// # Arguments
///
/// * `subjects` - Measurement records
/// * `table` - Anthropometric table
/// * `names` - Feature names used in the report
/// * `config` - Analysis configuration
///
/// # Returns
///
/// `AnalysisReport` with analyzed and excluded subjects, metric issues,
/// correlation results, skipped pairs and significance reports
///
/// # Errors
///
/// Returns `AnalysisError` if the configuration is invalid or any subject's
/// grids do not match the configured geometry. Join mismatches, undefined
/// metrics and pairs with insufficient data are collected in the report.
pub fn analyze_subjects(
    subjects: &[Subject],
    table: &AnthropometricTable,
    names: &FeatureNames,
    config: &AnalysisConfig,
) -> Result<AnalysisReport, AnalysisError> {
    use std::time::Instant;
    let start_time = Instant::now();

    config.validate()?;

    log::debug!(
        "Starting crosstalk analysis: {} subjects, {} directions, {}-point DFT at {} Hz",
        subjects.len(),
        config.directions.len(),
        config.fft_size,
        config.sample_rate
    );

    let transformer = SpectralTransformer::new(config.fft_size, config.sample_rate)?;
    let analyses = analyze_all(subjects, &transformer, config)?;

    let index = AnthropometricIndex::new(table);
    let mut analyzed = Vec::with_capacity(analyses.len());
    let mut excluded = Vec::new();
    let mut metric_issues = Vec::new();

    for analysis in analyses {
        metric_issues.extend(analysis.issues);
        match index.join(&analysis.name, analysis.id) {
            Ok(features) => analyzed.push(SubjectMetrics {
                id: analysis.id,
                name: analysis.name,
                metrics: analysis.metrics,
                features: features.to_vec(),
            }),
            Err(err) => {
                log::warn!("{}", err);
                excluded.push(SubjectExclusion {
                    id: analysis.id,
                    name: analysis.name,
                    reason: ExclusionReason::JoinMismatch,
                    detail: err.to_string(),
                });
            }
        }
    }

    let directions: Vec<String> = config.directions.iter().map(|d| d.label.clone()).collect();
    let output = correlate_all(
        &analyzed,
        &directions,
        &config.metrics,
        index.feature_count(),
        names,
        &config.significance_thresholds,
    );

    let processing_time_ms = start_time.elapsed().as_secs_f64() * 1000.0;

    log::debug!(
        "Analyzed {} subjects ({} excluded), {} significance reports in {:.1} ms",
        analyzed.len(),
        excluded.len(),
        output.significant.len(),
        processing_time_ms
    );

    Ok(AnalysisReport {
        analyzed,
        excluded,
        metric_issues,
        load_failures: Vec::new(),
        correlations: output.correlations,
        skipped: output.skipped,
        significant: output.significant,
        metadata: AnalysisMetadata {
            algorithm_version: env!("CARGO_PKG_VERSION").to_string(),
            subjects_total: subjects.len(),
            directions,
            thresholds: config.significance_thresholds.clone(),
            processing_time_ms,
        },
    })
}

/// [`analyze_subjects`] over a loaded dataset, carrying its load failures
pub fn analyze_dataset(
    dataset: LoadedDataset,
    table: &AnthropometricTable,
    names: &FeatureNames,
    config: &AnalysisConfig,
) -> Result<AnalysisReport, AnalysisError> {
    let mut report = analyze_subjects(&dataset.subjects, table, names, config)?;
    report.load_failures = dataset.failures;
    Ok(report)
}
