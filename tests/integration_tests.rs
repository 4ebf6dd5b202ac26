//! Integration tests for the crosstalk analysis pipeline

use std::f64::consts::PI;

use xfeed_dsp::analysis::result::ExclusionReason;
use xfeed_dsp::io::anthropometry::AnthropometricTable;
use xfeed_dsp::io::dataset::{load_dataset, HrirGrid, LoadFailure, LoadedDataset, Subject};
use xfeed_dsp::io::names::FeatureNames;
use xfeed_dsp::{
    analyze_dataset, analyze_subjects, AnalysisConfig, AnalysisError, MetricKind, ReportRenderer,
    TextRenderer,
};

const N: usize = 200;
const AZIMUTHS: usize = 25;
const ELEVATIONS: usize = 50;
const SCALE: f64 = 0.01;

/// Sum of cosines at bins 1..=turnover with amplitude growing with the bin
///
/// Its spectrum magnitude is `SCALE * k * N / 2` for `1 <= k <= turnover` and
/// zero above, so the difference curve turns over exactly at `turnover`.
fn rising_response(turnover: usize) -> Vec<f64> {
    (0..N)
        .map(|n| {
            (1..=turnover)
                .map(|k| SCALE * k as f64 * (2.0 * PI * k as f64 * n as f64 / N as f64).cos())
                .sum()
        })
        .collect()
}

/// Grids where the ear on the source side hears `response` and the far ear
/// hears it scaled by `contra_gain`; azimuths 0..=12 are on the left
fn subject_grids(
    response: &[f64],
    contra_gain: f64,
    azimuths: usize,
    elevations: usize,
) -> (HrirGrid, HrirGrid) {
    let mut left = Vec::with_capacity(azimuths * elevations * N);
    let mut right = Vec::with_capacity(azimuths * elevations * N);
    for a in 0..azimuths {
        let (left_gain, right_gain) = if a <= 12 {
            (1.0, contra_gain)
        } else {
            (contra_gain, 1.0)
        };
        for _ in 0..elevations {
            left.extend(response.iter().map(|x| x * left_gain));
            right.extend(response.iter().map(|x| x * right_gain));
        }
    }
    (
        HrirGrid::from_flat(left, azimuths, elevations, N).unwrap(),
        HrirGrid::from_flat(right, azimuths, elevations, N).unwrap(),
    )
}

fn synthetic_subject(id: u32, turnover: usize, contra_gain: f64) -> Subject {
    let (left, right) = subject_grids(&rising_response(turnover), contra_gain, AZIMUTHS, ELEVATIONS);
    Subject::new(&format!("subject_{:03}_hrir", id), left, right).unwrap()
}

/// (id, turnover bin, contralateral gain)
const SUBJECTS: [(u32, usize, f64); 5] = [
    (3, 3, 0.5),
    (8, 5, 0.4),
    (10, 4, 0.6),
    (11, 7, 0.3),
    (12, 6, 0.45),
];

fn population() -> Vec<Subject> {
    SUBJECTS
        .iter()
        .map(|&(id, turnover, gain)| synthetic_subject(id, turnover, gain))
        .collect()
}

fn table() -> AnthropometricTable {
    AnthropometricTable::from_json_str(
        r#"{
            "ids": [3, 8, 10, 11, 12],
            "features": [
                [7.0, null, 55.1],
                [11.0, 1.0, 57.3],
                [9.0, 4.0, 54.0],
                [15.0, 2.0, 58.2],
                [13.0, 8.0, 56.6]
            ]
        }"#,
    )
    .unwrap()
}

fn expected_attenuation(turnover: usize, contra_gain: f64) -> f64 {
    let bin_magnitude = |k: usize| SCALE * k as f64 * N as f64 / 2.0;
    let power: f64 = (1..turnover).map(|k| bin_magnitude(k).powi(2)).sum();
    (1.0 - contra_gain) * (power / turnover as f64).sqrt()
}

#[test]
fn test_end_to_end_synthetic_population() {
    let config = AnalysisConfig::default();
    let report = analyze_subjects(&population(), &table(), &FeatureNames::cipic(), &config)
        .expect("Analysis should succeed");

    assert_eq!(report.analyzed.len(), 5);
    assert!(report.excluded.is_empty());
    assert!(report.metric_issues.is_empty());
    assert!(report.skipped.is_empty(), "no pair should lack data: {:?}", report.skipped);

    for (subject, &(id, turnover, gain)) in report.analyzed.iter().zip(SUBJECTS.iter()) {
        assert_eq!(subject.id, id);
        assert_eq!(subject.metrics.len(), 4);
        for metric in &subject.metrics {
            assert_eq!(metric.crosstalk_bin, turnover, "{} {}", subject.name, metric.direction);
            assert!((metric.frequency_hz - turnover as f64 * 220.5).abs() < 1e-9);

            let expected = expected_attenuation(turnover, gain);
            assert!(
                (metric.attenuation_linear - expected).abs() < 1e-9 * expected.max(1.0),
                "{} {}: expected {} got {}",
                subject.name,
                metric.direction,
                expected,
                metric.attenuation_linear
            );
            assert!((metric.attenuation_db - 20.0 * expected.log10()).abs() < 1e-6);
            assert!(metric.flags.is_empty());
        }
    }

    // 4 directions x 3 metric kinds x 3 features
    assert_eq!(report.correlations.len(), 36);

    // feature 1 is missing for subject 3
    let partial = report
        .correlation("left_60", MetricKind::Frequency, 1)
        .unwrap();
    assert_eq!(partial.samples, 4);
    assert_eq!(partial.feature_name, "head height");

    // feature 0 = 2 * turnover + 1: perfectly monotonic in frequency
    let perfect = report
        .correlation("right_30", MetricKind::Frequency, 0)
        .unwrap();
    assert!((perfect.pearson.coefficient - 1.0).abs() < 1e-12);
    assert!(perfect.pearson.p_value < 0.001);
    assert!((perfect.kendall.p_value - 2.0 / 120.0).abs() < 1e-12);

    for direction in ["left_30", "right_30", "left_60", "right_60"] {
        let thresholds: Vec<f64> = report
            .significant
            .iter()
            .filter(|s| {
                s.direction == direction && s.metric == MetricKind::Frequency && s.feature_index == 0
            })
            .map(|s| s.threshold)
            .collect();
        assert_eq!(thresholds, vec![0.05], "{}", direction);
    }
}

#[test]
fn test_deterministic_across_runs() {
    let subjects = population();
    let table = table();
    let names = FeatureNames::cipic();

    let mut sequential = AnalysisConfig::default();
    sequential.parallel = false;

    let a = analyze_subjects(&subjects, &table, &names, &AnalysisConfig::default()).unwrap();
    let b = analyze_subjects(&subjects, &table, &names, &sequential).unwrap();

    // features hold NaN, so compare the metrics
    let metrics = |r: &xfeed_dsp::AnalysisReport| -> Vec<_> {
        r.analyzed.iter().map(|s| s.metrics.clone()).collect()
    };
    assert_eq!(metrics(&a), metrics(&b));
    assert_eq!(a.correlations, b.correlations);
    assert_eq!(a.significant, b.significant);
}

#[test]
fn test_join_mismatch_excludes_subject_without_aborting() {
    let mut subjects = population();
    subjects.push(synthetic_subject(99, 5, 0.5));

    let report =
        analyze_subjects(&subjects, &table(), &FeatureNames::cipic(), &AnalysisConfig::default())
            .unwrap();

    assert_eq!(report.metadata.subjects_total, 6);
    assert_eq!(report.analyzed.len(), 5);
    assert_eq!(report.excluded.len(), 1);
    assert_eq!(report.excluded[0].id, 99);
    assert_eq!(report.excluded[0].reason, ExclusionReason::JoinMismatch);
    assert!(report.analyzed.iter().all(|s| s.id != 99));
    assert!(report.correlations.iter().all(|c| c.samples <= 5));
}

#[test]
fn test_undefined_metric_excludes_only_that_subject() {
    let mut subjects = population();
    // silent subject: difference curve is flat everywhere
    let (left, right) = subject_grids(&[0.0; N], 1.0, AZIMUTHS, ELEVATIONS);
    subjects.push(Subject::new("subject_020_hrir", left, right).unwrap());

    let table = AnthropometricTable::new(
        vec![3, 8, 10, 11, 12, 20],
        vec![
            vec![7.0, f64::NAN, 55.1],
            vec![11.0, 1.0, 57.3],
            vec![9.0, 4.0, 54.0],
            vec![15.0, 2.0, 58.2],
            vec![13.0, 8.0, 56.6],
            vec![1.0, 1.0, 1.0],
        ],
    )
    .unwrap();

    let report =
        analyze_subjects(&subjects, &table, &FeatureNames::cipic(), &AnalysisConfig::default())
            .unwrap();

    assert_eq!(report.analyzed.len(), 6);
    let issues: Vec<_> = report
        .metric_issues
        .iter()
        .filter(|i| i.id == 20)
        .collect();
    assert_eq!(issues.len(), 4);
    assert!(issues.iter().all(|i| i.metrics.len() == 3));

    let frequency = report
        .correlation("left_60", MetricKind::Frequency, 0)
        .unwrap();
    assert_eq!(frequency.samples, 5);
}

#[test]
fn test_negative_attenuation_drops_db_metric_only() {
    let mut subjects = population();
    // far ear louder than near ear: linear attenuation is negative
    let (left, right) = subject_grids(&rising_response(4), 1.5, AZIMUTHS, ELEVATIONS);
    subjects.push(Subject::new("subject_021_hrir", left, right).unwrap());

    let table = AnthropometricTable::new(
        vec![3, 8, 10, 11, 12, 21],
        vec![
            vec![7.0, f64::NAN, 55.1],
            vec![11.0, 1.0, 57.3],
            vec![9.0, 4.0, 54.0],
            vec![15.0, 2.0, 58.2],
            vec![13.0, 8.0, 56.6],
            vec![10.0, 3.0, 55.0],
        ],
    )
    .unwrap();

    let report =
        analyze_subjects(&subjects, &table, &FeatureNames::cipic(), &AnalysisConfig::default())
            .unwrap();

    let issues: Vec<_> = report.metric_issues.iter().filter(|i| i.id == 21).collect();
    assert_eq!(issues.len(), 4);
    assert!(issues.iter().all(|i| i.metrics == vec![MetricKind::AttenuationDb]));

    let db = report.correlation("left_30", MetricKind::AttenuationDb, 0).unwrap();
    let linear = report
        .correlation("left_30", MetricKind::AttenuationLinear, 0)
        .unwrap();
    assert_eq!(db.samples, 5);
    assert_eq!(linear.samples, 6);
}

#[test]
fn test_wrong_geometry_is_fatal() {
    let mut subjects = population();
    let (left, right) = subject_grids(&rising_response(4), 0.5, 24, ELEVATIONS);
    subjects.push(Subject::new("subject_030_hrir", left, right).unwrap());

    let err = analyze_subjects(&subjects, &table(), &FeatureNames::cipic(), &AnalysisConfig::default())
        .unwrap_err();
    assert!(matches!(err, AnalysisError::DatasetStructure(_)));
}

#[test]
fn test_too_few_subjects_reports_skipped_pairs() {
    let subjects = vec![synthetic_subject(3, 3, 0.5)];
    let report =
        analyze_subjects(&subjects, &table(), &FeatureNames::cipic(), &AnalysisConfig::default())
            .unwrap();

    assert!(report.correlations.is_empty());
    assert_eq!(report.skipped.len(), 36);
    assert!(report.skipped.iter().all(|s| s.samples <= 1));

    let text = TextRenderer::default().render(&report).unwrap();
    assert!(text.contains("0 significant, 0 not significant, 36 skipped"));
}

#[test]
fn test_analyze_dataset_from_files() {
    let dir = tempfile::tempdir().unwrap();

    // reduced geometry keeps the fixture files small
    let elevations = 9;
    let mut config = AnalysisConfig::default();
    config.expected_elevations = None;

    for &(id, turnover, gain) in &SUBJECTS {
        let (left, right) = subject_grids(&rising_response(turnover), gain, AZIMUTHS, elevations);
        let nested = |grid: &HrirGrid| -> Vec<Vec<Vec<f64>>> {
            (0..AZIMUTHS)
                .map(|a| {
                    (0..elevations)
                        .map(|e| grid.slice(a, e).unwrap().to_vec())
                        .collect()
                })
                .collect()
        };
        let group = dir.path().join(format!("subject_{:03}", id));
        std::fs::create_dir(&group).unwrap();
        let body = serde_json::json!({
            "name": format!("subject_{:03}_hrir", id),
            "hrir_l": nested(&left),
            "hrir_r": nested(&right),
        });
        std::fs::write(group.join("hrir_final.json"), body.to_string()).unwrap();
    }
    std::fs::write(dir.path().join("corrupt.json"), "[").unwrap();

    let dataset = load_dataset(dir.path()).unwrap();
    assert_eq!(dataset.subjects.len(), 5);

    let report = analyze_dataset(dataset, &table(), &FeatureNames::cipic(), &config).unwrap();
    assert_eq!(report.analyzed.len(), 5);
    assert_eq!(report.load_failures.len(), 1);
    assert!(report.failed_paths()[0].ends_with("corrupt.json"));
    assert!(report.skipped.is_empty());
}

#[test]
fn test_analyze_dataset_keeps_failures() {
    let dataset = LoadedDataset {
        subjects: population(),
        failures: vec![LoadFailure {
            path: "subject_050/hrir_final.json".into(),
            reason: "Parse error: EOF".to_string(),
        }],
    };
    let report =
        analyze_dataset(dataset, &table(), &FeatureNames::cipic(), &AnalysisConfig::default())
            .unwrap();
    assert_eq!(report.load_failures.len(), 1);

    let text = TextRenderer::default().render(&report).unwrap();
    assert!(text.contains("failed to load subject_050/hrir_final.json"));
    assert!(text.contains("frequency correlates to head width with 0.05 significance"));
}
