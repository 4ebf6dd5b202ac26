//! Anthropometric measurement table
//!
//! JSON layout: `{"ids": [3, 8, ...], "features": [[17.2, null, ...], ...]}`.
//! `null` entries are missing measurements and are stored as NaN.

use std::path::Path;

use serde::Deserialize;

use crate::error::AnalysisError;

/// Subject ids with their parallel feature rows
#[derive(Debug, Clone, PartialEq)]
pub struct AnthropometricTable {
    ids: Vec<u32>,
    features: Vec<Vec<f64>>,
}

#[derive(Deserialize)]
struct TableFile {
    ids: Vec<u32>,
    features: Vec<Vec<Option<f64>>>,
}

impl AnthropometricTable {
    /// Build a table; `ids` and `features` must be parallel and rows equal length
    pub fn new(ids: Vec<u32>, features: Vec<Vec<f64>>) -> Result<Self, AnalysisError> {
        if ids.len() != features.len() {
            return Err(AnalysisError::InvalidInput(format!(
                "Anthropometric table has {} ids but {} feature rows",
                ids.len(),
                features.len()
            )));
        }

        let width = features.first().map(|row| row.len()).unwrap_or(0);
        if let Some((row, bad)) = features
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != width)
        {
            return Err(AnalysisError::InvalidInput(format!(
                "Anthropometric row {} (id {}) has {} features, expected {}",
                row,
                ids[row],
                bad.len(),
                width
            )));
        }

        Ok(Self { ids, features })
    }

    /// Load a table from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self, AnalysisError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AnalysisError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&text).map_err(|e| match e {
            AnalysisError::Parse(msg) => AnalysisError::Parse(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// Parse a table from JSON text
    pub fn from_json_str(text: &str) -> Result<Self, AnalysisError> {
        let file: TableFile = serde_json::from_str(text)?;
        let features = file
            .features
            .into_iter()
            .map(|row| row.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
            .collect();
        Self::new(file.ids, features)
    }

    /// Subject ids in row order
    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    /// Feature row at `row`
    pub fn row(&self, row: usize) -> Option<&[f64]> {
        self.features.get(row).map(|r| r.as_slice())
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True when the table has no rows
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of features per row
    pub fn feature_count(&self) -> usize {
        self.features.first().map(|row| row.len()).unwrap_or(0)
    }
}
