//! Configuration parameters for crosstalk analysis
//!
//! Every field has a default matching the CIPIC measurement layout
//! (25 azimuths × 50 elevations × 200 samples at 44.1 kHz), so a JSON
//! configuration file only needs to name what differs.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::result::MetricKind;
use crate::error::AnalysisError;

/// Recording ear
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ear {
    /// Left channel (`hrir_l`)
    Left,
    /// Right channel (`hrir_r`)
    Right,
}

impl Ear {
    /// The other ear
    pub fn opposite(self) -> Ear {
        match self {
            Ear::Left => Ear::Right,
            Ear::Right => Ear::Left,
        }
    }
}

/// One canonical source direction
///
/// Slices at every listed azimuth index (at the configured elevation) are
/// averaged sample-wise into a single slice per ear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionConfig {
    /// Label used in reports (e.g. "left_60")
    pub label: String,

    /// Azimuth indices into the measurement grid
    pub azimuth_indices: Vec<usize>,

    /// Ear nearer to the source
    pub ipsilateral: Ear,
}

impl DirectionConfig {
    /// Create a direction
    pub fn new(label: &str, azimuth_indices: &[usize], ipsilateral: Ear) -> Self {
        Self {
            label: label.to_string(),
            azimuth_indices: azimuth_indices.to_vec(),
            ipsilateral,
        }
    }
}

/// Analysis configuration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    // Measurement geometry
    /// Sample rate of the impulse responses in Hz (default: 44100.0)
    pub sample_rate: f64,

    /// Analysis window / DFT length in samples (default: 200)
    pub fft_size: usize,

    /// Elevation index of 0° elevation (default: 8)
    pub elevation_index: usize,

    /// Required azimuth extent of every grid (default: Some(25))
    /// `None` only checks that the configured indices exist
    pub expected_azimuths: Option<usize>,

    /// Required elevation extent of every grid (default: Some(50))
    pub expected_elevations: Option<usize>,

    /// Canonical directions to analyze
    ///
    /// Default: the ±30° columns (indices 6 and 18) and the ±60° pairs
    /// averaged from indices {2, 3} and {23, 24}.
    pub directions: Vec<DirectionConfig>,

    // Crosstalk scan
    /// First bin examined by the turnover scan (default: 1)
    pub scan_start_bin: usize,

    // Correlation
    /// Metric kinds correlated against the anthropometric features
    pub metrics: Vec<MetricKind>,

    /// p-value cutoffs, each reported independently (default: 0.05, 0.01, 0.001)
    pub significance_thresholds: Vec<f64>,

    /// Extract subjects on the rayon pool (requires the `parallel` feature)
    pub parallel: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100.0,
            fft_size: 200,
            elevation_index: 8,
            expected_azimuths: Some(25),
            expected_elevations: Some(50),
            directions: vec![
                DirectionConfig::new("left_30", &[6], Ear::Left),
                DirectionConfig::new("right_30", &[18], Ear::Right),
                DirectionConfig::new("left_60", &[2, 3], Ear::Left),
                DirectionConfig::new("right_60", &[23, 24], Ear::Right),
            ],
            scan_start_bin: 1,
            metrics: vec![
                MetricKind::Frequency,
                MetricKind::AttenuationDb,
                MetricKind::AttenuationLinear,
            ],
            significance_thresholds: vec![0.05, 0.01, 0.001],
            parallel: true,
        }
    }
}

impl AnalysisConfig {
    /// Load a configuration from a JSON file
    ///
    /// Missing fields take their default values. The result is validated.
    pub fn from_json_file(path: &Path) -> Result<Self, AnalysisError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AnalysisError::Io(format!("{}: {}", path.display(), e)))?;
        let config: AnalysisConfig = serde_json::from_str(&text)
            .map_err(|e| AnalysisError::Parse(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Number of bins in the non-negative half of the spectrum
    pub fn half_spectrum_len(&self) -> usize {
        self.fft_size / 2
    }

    /// Check parameter consistency
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !(self.sample_rate > 0.0) || !self.sample_rate.is_finite() {
            return Err(AnalysisError::InvalidInput(format!(
                "Sample rate must be > 0, got {}",
                self.sample_rate
            )));
        }

        if self.fft_size < 4 {
            return Err(AnalysisError::InvalidInput(format!(
                "FFT size must be >= 4, got {}",
                self.fft_size
            )));
        }

        // Turnover needs bins i and i + 1 inside the half spectrum
        if self.scan_start_bin + 1 >= self.half_spectrum_len() {
            return Err(AnalysisError::InvalidInput(format!(
                "Scan start bin {} leaves no room in a {}-bin half spectrum",
                self.scan_start_bin,
                self.half_spectrum_len()
            )));
        }

        if self.directions.is_empty() {
            return Err(AnalysisError::InvalidInput(
                "At least one direction must be configured".to_string(),
            ));
        }

        for (i, direction) in self.directions.iter().enumerate() {
            if direction.azimuth_indices.is_empty() {
                return Err(AnalysisError::InvalidInput(format!(
                    "Direction '{}' has no azimuth indices",
                    direction.label
                )));
            }
            if self.directions[..i]
                .iter()
                .any(|other| other.label == direction.label)
            {
                return Err(AnalysisError::InvalidInput(format!(
                    "Duplicate direction label '{}'",
                    direction.label
                )));
            }
            if let Some(azimuths) = self.expected_azimuths {
                if let Some(&bad) = direction.azimuth_indices.iter().find(|&&a| a >= azimuths) {
                    return Err(AnalysisError::InvalidInput(format!(
                        "Direction '{}' uses azimuth index {} outside the expected {} azimuths",
                        direction.label, bad, azimuths
                    )));
                }
            }
        }

        if let Some(elevations) = self.expected_elevations {
            if self.elevation_index >= elevations {
                return Err(AnalysisError::InvalidInput(format!(
                    "Elevation index {} outside the expected {} elevations",
                    self.elevation_index, elevations
                )));
            }
        }

        if self.metrics.is_empty() {
            return Err(AnalysisError::InvalidInput(
                "At least one metric kind must be correlated".to_string(),
            ));
        }

        if let Some(&bad) = self
            .significance_thresholds
            .iter()
            .find(|&&s| !(s > 0.0 && s < 1.0))
        {
            return Err(AnalysisError::InvalidInput(format!(
                "Significance threshold must be in (0, 1), got {}",
                bad
            )));
        }

        Ok(())
    }
}
