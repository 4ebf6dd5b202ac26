//! Feature extraction modules
//!
//! This module contains the per-subject signal processing stages:
//! - Directional slice extraction from the measurement grid
//! - Fixed-length spectral transform
//! - Crosstalk metric extraction

pub mod crosstalk;
pub mod directional;
pub mod spectrum;
