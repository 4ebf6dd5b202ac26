//! Population-level analysis
//!
//! Joins per-subject crosstalk metrics with anthropometry and correlates them:
//! - Anthropometric join
//! - Correlation statistics
//! - Correlator and significance reporting
//! - Result types and rendering

pub mod correlation;
pub mod join;
pub mod report;
pub mod result;
pub mod statistics;
