//! Report rendering
//!
//! Rendering is kept apart from the structured [`AnalysisReport`]; callers
//! pick a [`ReportRenderer`] (plain text or JSON) or write their own.

use std::fmt::Write as _;

use crate::analysis::result::{AnalysisReport, SignificanceReport};
use crate::error::AnalysisError;

/// Turns an [`AnalysisReport`] into text
pub trait ReportRenderer {
    /// Render the report
    fn render(&self, report: &AnalysisReport) -> Result<String, AnalysisError>;
}

/// Console summary with one line per significant pair and threshold
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer {
    /// Also list every insignificant correlation
    pub verbose: bool,
}

/// Pretty-printed JSON of the whole report
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

/// `"<metric-kind> correlates to <feature-name> with <threshold> significance"`
pub fn significance_line(report: &SignificanceReport) -> String {
    format!(
        "{} {} correlates to {} with {} significance",
        report.direction, report.metric, report.feature_name, report.threshold
    )
}

impl ReportRenderer for TextRenderer {
    fn render(&self, report: &AnalysisReport) -> Result<String, AnalysisError> {
        let mut out = String::new();
        let fmt_err = |e: std::fmt::Error| AnalysisError::InvalidInput(e.to_string());

        writeln!(
            out,
            "Analyzed {} of {} subjects ({} excluded)",
            report.analyzed.len(),
            report.metadata.subjects_total,
            report.excluded.len()
        )
        .map_err(fmt_err)?;

        for failure in &report.load_failures {
            writeln!(out, "  failed to load {}: {}", failure.path.display(), failure.reason)
                .map_err(fmt_err)?;
        }
        for exclusion in &report.excluded {
            writeln!(out, "  excluded {}: {}", exclusion.name, exclusion.detail).map_err(fmt_err)?;
        }
        for issue in &report.metric_issues {
            let kinds: Vec<&str> = issue.metrics.iter().map(|m| m.name()).collect();
            writeln!(
                out,
                "  {} {} without {}: {}",
                issue.name,
                issue.direction,
                kinds.join(", "),
                issue.detail
            )
            .map_err(fmt_err)?;
        }
        for subject in &report.analyzed {
            for (direction, flag) in subject.flags() {
                writeln!(out, "  warning {} {}: {:?}", subject.name, direction, flag)
                    .map_err(fmt_err)?;
            }
        }

        let insignificant = report.insignificant().count();
        writeln!(
            out,
            "Correlated {} pairs: {} significant, {} not significant, {} skipped",
            report.correlations.len(),
            report.correlations.len() - insignificant,
            insignificant,
            report.skipped.len()
        )
        .map_err(fmt_err)?;

        for skipped in &report.skipped {
            writeln!(out, "  skipped: {}", skipped.reason).map_err(fmt_err)?;
        }

        for line in report.significant.iter().map(significance_line) {
            writeln!(out, "{}", line).map_err(fmt_err)?;
        }

        if self.verbose {
            for result in &report.correlations {
                if let Some(threshold) = result.strictest_threshold(&report.metadata.thresholds) {
                    writeln!(
                        out,
                        "  strongest: {} {} vs {} at {} (n={})",
                        result.direction, result.metric, result.feature_name, threshold, result.samples
                    )
                    .map_err(fmt_err)?;
                }
            }
            for result in report.insignificant() {
                writeln!(
                    out,
                    "  {} {} vs {}: n={} pearson r={:.3} p={:.4}, spearman rho={:.3} p={:.4}, kendall tau={:.3} p={:.4}",
                    result.direction,
                    result.metric,
                    result.feature_name,
                    result.samples,
                    result.pearson.coefficient,
                    result.pearson.p_value,
                    result.spearman.coefficient,
                    result.spearman.p_value,
                    result.kendall.coefficient,
                    result.kendall.p_value
                )
                .map_err(fmt_err)?;
            }
        }

        Ok(out)
    }
}

impl ReportRenderer for JsonRenderer {
    fn render(&self, report: &AnalysisReport) -> Result<String, AnalysisError> {
        Ok(serde_json::to_string_pretty(report)?)
    }
}
