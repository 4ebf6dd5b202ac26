//! Crosstalk metric extraction
//!
//! Derives one crosstalk signature per subject and direction from the
//! ipsilateral and contralateral spectra.
//!
//! # Algorithm
//!
//! 1. Difference curve over the non-negative half spectrum:
//!    `diff[k] = |ipsi[k] - contra[k]|`
//! 2. Turnover scan from `scan_start_bin`: the crosstalk bin `i` is the first
//!    index with `diff[i + 1] < diff[i]`, i.e. the end of the low-frequency
//!    region where head shadowing makes the interaural difference grow
//! 3. `frequency = i * sample_rate / N`
//! 4. RMS magnitude of the complex prefixes `ipsi[0..i]` and `contra[0..i]`
//! 5. `attenuation_linear = rms(ipsi) - rms(contra)`
//! 6. `attenuation_db = 20 * log10(attenuation_linear)`, NaN when
//!    `attenuation_linear <= 0`
//!
//! A curve that never turns over inside the half spectrum has no crosstalk
//! bin; the scan stops at the last valid pair and reports the subject.

use rustfft::num_complex::Complex;
use serde::{Deserialize, Serialize};

use crate::analysis::result::MetricKind;
use crate::error::AnalysisError;
use crate::features::spectrum::Spectrum;

/// Data-quality warnings attached to a metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualityFlag {
    /// Turnover resolved to the 0 Hz bin
    ZeroFrequency,
    /// Difference curve decreased at the first scanned bin
    ImmediateTurnover,
}

/// Crosstalk signature of one subject at one direction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrosstalkMetric {
    /// Direction label
    pub direction: String,

    /// Turnover bin index
    pub crosstalk_bin: usize,

    /// Turnover frequency in Hz
    pub frequency_hz: f64,

    /// RMS(ipsilateral prefix) - RMS(contralateral prefix)
    pub attenuation_linear: f64,

    /// `20 log10(attenuation_linear)`, NaN when the linear value is not positive
    pub attenuation_db: f64,

    /// Quality warnings
    pub flags: Vec<QualityFlag>,
}

impl CrosstalkMetric {
    /// Scalar used for correlation
    pub fn value(&self, kind: MetricKind) -> f64 {
        match kind {
            MetricKind::Frequency => self.frequency_hz,
            MetricKind::AttenuationDb => self.attenuation_db,
            MetricKind::AttenuationLinear => self.attenuation_linear,
        }
    }

    /// True when the dB attenuation is defined
    pub fn has_attenuation_db(&self) -> bool {
        self.attenuation_db.is_finite()
    }
}

/// `|ipsi[k] - contra[k]|` over the shorter of the two inputs
pub fn difference_curve(ipsilateral: &[Complex<f64>], contralateral: &[Complex<f64>]) -> Vec<f64> {
    ipsilateral
        .iter()
        .zip(contralateral.iter())
        .map(|(i, c)| (i - c).norm())
        .collect()
}

/// First index `i >= start` with `diff[i + 1] < diff[i]`
///
/// Never reads past the end of `diff`; returns `None` when the curve does not
/// decrease anywhere in range.
///
/// # Example
///
/// ```
/// use xfeed_dsp::features::crosstalk::find_turnover;
///
/// let diff = [0.0, 1.0, 2.0, 3.0, 4.0, 3.0, 2.0];
/// assert_eq!(find_turnover(&diff, 1), Some(4));
/// assert_eq!(find_turnover(&[0.0, 1.0, 2.0], 1), None);
/// ```
pub fn find_turnover(diff: &[f64], start: usize) -> Option<usize> {
    diff.windows(2)
        .enumerate()
        .skip(start)
        .find(|(_, pair)| pair[1] < pair[0])
        .map(|(i, _)| i)
}

/// Root-mean-square magnitude of a complex sequence
///
/// An empty sequence has RMS 0.
pub fn rms(values: &[Complex<f64>]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let power: f64 = values.iter().map(|c| c.norm_sqr()).sum();
    (power / values.len() as f64).sqrt()
}

/// `20 log10(linear)`, or `None` when `linear <= 0`
pub fn attenuation_db(linear: f64) -> Option<f64> {
    if linear > 0.0 {
        Some(20.0 * linear.log10())
    } else {
        None
    }
}

/// Compute the crosstalk metric for one subject and direction
///
/// # Arguments
///
/// * `subject` - Subject name (for error reporting)
/// * `direction` - Direction label
/// * `ipsilateral` - Spectrum at the ear nearer the source
/// * `contralateral` - Spectrum at the ear farther from the source
/// * `scan_start_bin` - First bin examined by the turnover scan
///
/// # Errors
///
/// Returns `AnalysisError::MetricUndefined` if the spectra differ in length or
/// the difference curve never turns over. A non-positive linear attenuation is
/// not an error here; it yields a NaN `attenuation_db`.
pub fn extract_crosstalk(
    subject: &str,
    direction: &str,
    ipsilateral: &Spectrum,
    contralateral: &Spectrum,
    scan_start_bin: usize,
) -> Result<CrosstalkMetric, AnalysisError> {
    let undefined = |reason: String| AnalysisError::MetricUndefined {
        subject: subject.to_string(),
        direction: direction.to_string(),
        reason,
    };

    if ipsilateral.len() != contralateral.len() {
        return Err(undefined(format!(
            "spectrum lengths differ ({} vs {})",
            ipsilateral.len(),
            contralateral.len()
        )));
    }

    let ipsi = ipsilateral.half();
    let contra = contralateral.half();
    let diff = difference_curve(ipsi, contra);

    let bin = find_turnover(&diff, scan_start_bin).ok_or_else(|| {
        undefined(format!(
            "difference curve never decreases in bins {}..{}",
            scan_start_bin,
            diff.len()
        ))
    })?;

    let frequency_hz = ipsilateral.bin_frequency(bin);

    let mut flags = Vec::new();
    if bin == 0 {
        log::warn!("{} {}: crosstalk turnover at the 0 Hz bin", subject, direction);
        flags.push(QualityFlag::ZeroFrequency);
    }
    if bin == scan_start_bin {
        log::warn!(
            "{} {}: difference curve decreases immediately at bin {}",
            subject,
            direction,
            bin
        );
        flags.push(QualityFlag::ImmediateTurnover);
    }

    let attenuation_linear = rms(&ipsi[..bin]) - rms(&contra[..bin]);
    let attenuation_db = attenuation_db(attenuation_linear).unwrap_or(f64::NAN);

    log::debug!(
        "{} {}: turnover bin {} ({:.1} Hz), attenuation {:.4} ({:.2} dB)",
        subject,
        direction,
        bin,
        frequency_hz,
        attenuation_linear,
        attenuation_db
    );

    Ok(CrosstalkMetric {
        direction: direction.to_string(),
        crosstalk_bin: bin,
        frequency_hz,
        attenuation_linear,
        attenuation_db,
        flags,
    })
}
