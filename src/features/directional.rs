//! Directional impulse-response extraction
//!
//! Pulls the 0°-elevation impulse responses for each configured direction out
//! of a subject's measurement grids. When a direction lists several azimuth
//! indices (e.g. -65° and -55° for a canonical -60°), the slices are averaged
//! sample-wise.
//!
//! # Example
//!
//! ```no_run
//! use xfeed_dsp::features::directional::extract_directions;
//! use xfeed_dsp::AnalysisConfig;
//! # use xfeed_dsp::io::dataset::Subject;
//! # fn subject() -> Subject { unimplemented!() }
//!
//! let config = AnalysisConfig::default();
//! let pairs = extract_directions(&subject(), &config)?;
//! for pair in &pairs {
//!     println!("{}: {} samples", pair.direction, pair.ipsilateral.samples.len());
//! }
//! # Ok::<(), xfeed_dsp::AnalysisError>(())
//! ```

use serde::Serialize;

use crate::config::{AnalysisConfig, DirectionConfig, Ear};
use crate::error::AnalysisError;
use crate::io::dataset::{HrirGrid, Subject};

/// One ear's time-domain impulse response for one direction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectionalSlice {
    /// Direction label
    pub direction: String,

    /// Recording ear
    pub ear: Ear,

    /// Time samples (analysis window length)
    pub samples: Vec<f64>,
}

/// Ipsilateral and contralateral slices for one direction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectionalPair {
    /// Direction label
    pub direction: String,

    /// Slice at the ear nearer the source
    pub ipsilateral: DirectionalSlice,

    /// Slice at the ear farther from the source
    pub contralateral: DirectionalSlice,
}

/// Check that a subject's grids cover the configured geometry
///
/// # Errors
///
/// Returns `AnalysisError::DatasetStructure` if either grid:
/// - differs from `expected_azimuths` / `expected_elevations` when those are set
/// - lacks a configured azimuth index or the elevation index
/// - holds fewer samples than `fft_size`
pub fn validate_geometry(subject: &Subject, config: &AnalysisConfig) -> Result<(), AnalysisError> {
    for (ear, grid) in [(Ear::Left, &subject.hrir_left), (Ear::Right, &subject.hrir_right)] {
        let (azimuths, elevations, samples) = grid.shape();
        let structure_error = |detail: String| {
            AnalysisError::DatasetStructure(format!(
                "{} ({:?} ear, grid {}x{}x{}): {}",
                subject.name, ear, azimuths, elevations, samples, detail
            ))
        };

        if let Some(expected) = config.expected_azimuths {
            if azimuths != expected {
                return Err(structure_error(format!("expected {} azimuths", expected)));
            }
        }
        if let Some(expected) = config.expected_elevations {
            if elevations != expected {
                return Err(structure_error(format!("expected {} elevations", expected)));
            }
        }
        if config.elevation_index >= elevations {
            return Err(structure_error(format!(
                "elevation index {} out of range",
                config.elevation_index
            )));
        }
        for direction in &config.directions {
            if let Some(&azimuth) = direction.azimuth_indices.iter().find(|&&a| a >= azimuths) {
                return Err(structure_error(format!(
                    "azimuth index {} for '{}' out of range",
                    azimuth, direction.label
                )));
            }
        }
        if samples < config.fft_size {
            return Err(structure_error(format!(
                "{} samples is shorter than the {}-sample analysis window",
                samples, config.fft_size
            )));
        }
    }
    Ok(())
}

/// Average the configured azimuth slices of one grid into the analysis window
fn averaged_slice(
    grid: &HrirGrid,
    azimuth_indices: &[usize],
    elevation_index: usize,
    window: usize,
) -> Result<Vec<f64>, AnalysisError> {
    let mut sum = vec![0.0f64; window];
    for &azimuth in azimuth_indices {
        let slice = grid
            .slice(azimuth, elevation_index)
            .filter(|s| s.len() >= window)
            .ok_or_else(|| {
                AnalysisError::DatasetStructure(format!(
                    "No {}-sample slice at azimuth {} elevation {}",
                    window, azimuth, elevation_index
                ))
            })?;
        for (acc, &x) in sum.iter_mut().zip(slice.iter()) {
            *acc += x;
        }
    }
    let count = azimuth_indices.len() as f64;
    Ok(sum.into_iter().map(|x| x / count).collect())
}

/// Extract the ipsilateral/contralateral pair for one direction
///
/// Uses the first `fft_size` samples of each slice.
pub fn extract_direction(
    subject: &Subject,
    direction: &DirectionConfig,
    config: &AnalysisConfig,
) -> Result<DirectionalPair, AnalysisError> {
    if direction.azimuth_indices.is_empty() {
        return Err(AnalysisError::InvalidInput(format!(
            "Direction '{}' has no azimuth indices",
            direction.label
        )));
    }

    let grid_for = |ear: Ear| match ear {
        Ear::Left => &subject.hrir_left,
        Ear::Right => &subject.hrir_right,
    };

    let make_slice = |ear: Ear| -> Result<DirectionalSlice, AnalysisError> {
        let samples = averaged_slice(
            grid_for(ear),
            &direction.azimuth_indices,
            config.elevation_index,
            config.fft_size,
        )
        .map_err(|e| match e {
            AnalysisError::DatasetStructure(msg) => {
                AnalysisError::DatasetStructure(format!("{}: {}", subject.name, msg))
            }
            other => other,
        })?;
        Ok(DirectionalSlice {
            direction: direction.label.clone(),
            ear,
            samples,
        })
    };

    Ok(DirectionalPair {
        direction: direction.label.clone(),
        ipsilateral: make_slice(direction.ipsilateral)?,
        contralateral: make_slice(direction.ipsilateral.opposite())?,
    })
}

/// Validate geometry and extract every configured direction
pub fn extract_directions(
    subject: &Subject,
    config: &AnalysisConfig,
) -> Result<Vec<DirectionalPair>, AnalysisError> {
    validate_geometry(subject, config)?;

    let (_, _, samples) = subject.hrir_left.shape();
    if samples > config.fft_size {
        log::debug!(
            "{}: using first {} of {} samples",
            subject.name,
            config.fft_size,
            samples
        );
    }

    config
        .directions
        .iter()
        .map(|direction| extract_direction(subject, direction, config))
        .collect()
}
