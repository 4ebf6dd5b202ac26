//! Fixed-length spectral transform
//!
//! Converts directional slices to complex spectra with a DFT of fixed length N
//! (200 by default, the analysis window). Bin `k` maps to `k * sample_rate / N`;
//! only bins `[0, N/2)` are used for magnitude analysis.
//!
//! FFT plans are built once and shared; a [`SpectralTransformer`] is `Send +
//! Sync` and can be used from every worker of a batch run.

use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::error::AnalysisError;

/// Complex spectrum of one directional slice
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    /// DFT bins, length N
    pub bins: Vec<Complex<f64>>,

    /// Sample rate of the source slice in Hz
    pub sample_rate: f64,
}

impl Spectrum {
    /// Transform length N
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    /// True for a zero-length spectrum
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Bins with non-negative frequency, `[0, N/2)`
    pub fn half(&self) -> &[Complex<f64>] {
        &self.bins[..self.bins.len() / 2]
    }

    /// Frequency of bin `k` in Hz
    pub fn bin_frequency(&self, k: usize) -> f64 {
        bin_frequency(k, self.sample_rate, self.bins.len())
    }

    /// Magnitudes of the non-negative half
    pub fn magnitudes(&self) -> Vec<f64> {
        self.half().iter().map(|c| c.norm()).collect()
    }
}

/// Frequency of DFT bin `k` for a length-`n` transform
///
/// # Example
///
/// ```
/// use xfeed_dsp::features::spectrum::bin_frequency;
///
/// assert_eq!(bin_frequency(10, 44100.0, 200), 2205.0);
/// ```
pub fn bin_frequency(k: usize, sample_rate: f64, n: usize) -> f64 {
    k as f64 * sample_rate / n as f64
}

/// Planned forward and inverse DFT of one fixed length
pub struct SpectralTransformer {
    size: usize,
    sample_rate: f64,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
}

impl std::fmt::Debug for SpectralTransformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectralTransformer")
            .field("size", &self.size)
            .field("sample_rate", &self.sample_rate)
            .finish()
    }
}

impl SpectralTransformer {
    /// Plan transforms of length `size`
    pub fn new(size: usize, sample_rate: f64) -> Result<Self, AnalysisError> {
        if size == 0 {
            return Err(AnalysisError::InvalidInput(
                "FFT size must be > 0".to_string(),
            ));
        }
        if !(sample_rate > 0.0) {
            return Err(AnalysisError::InvalidInput(format!(
                "Sample rate must be > 0, got {}",
                sample_rate
            )));
        }

        let mut planner = FftPlanner::new();
        Ok(Self {
            size,
            sample_rate,
            forward: planner.plan_fft_forward(size),
            inverse: planner.plan_fft_inverse(size),
        })
    }

    /// Transform length N
    pub fn size(&self) -> usize {
        self.size
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Forward DFT of the first N samples (zero-padded when shorter)
    pub fn transform(&self, samples: &[f64]) -> Spectrum {
        let mut buffer: Vec<Complex<f64>> = samples
            .iter()
            .take(self.size)
            .map(|&x| Complex::new(x, 0.0))
            .collect();
        buffer.resize(self.size, Complex::new(0.0, 0.0));

        self.forward.process(&mut buffer);

        Spectrum {
            bins: buffer,
            sample_rate: self.sample_rate,
        }
    }

    /// Inverse DFT, normalized by 1/N, returning the real part
    pub fn inverse(&self, spectrum: &Spectrum) -> Vec<f64> {
        let mut buffer = spectrum.bins.clone();
        buffer.resize(self.size, Complex::new(0.0, 0.0));

        self.inverse.process(&mut buffer);

        let scale = 1.0 / self.size as f64;
        buffer.iter().map(|c| c.re * scale).collect()
    }
}
