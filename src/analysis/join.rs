//! Anthropometric join
//!
//! Matches subjects to anthropometric rows by exact id through an
//! id → row index map built once per table.

use std::collections::HashMap;

use crate::error::AnalysisError;
use crate::io::anthropometry::AnthropometricTable;

/// id → row index lookup over an [`AnthropometricTable`]
#[derive(Debug)]
pub struct AnthropometricIndex<'a> {
    table: &'a AnthropometricTable,
    rows: HashMap<u32, usize>,
}

impl<'a> AnthropometricIndex<'a> {
    /// Index a table; on duplicate ids the first row wins
    pub fn new(table: &'a AnthropometricTable) -> Self {
        let mut rows = HashMap::with_capacity(table.len());
        for (row, &id) in table.ids().iter().enumerate() {
            if rows.contains_key(&id) {
                log::warn!(
                    "Duplicate anthropometric id {} at row {}; keeping row {}",
                    id,
                    row,
                    rows[&id]
                );
                continue;
            }
            rows.insert(id, row);
        }
        Self { table, rows }
    }

    /// Feature row for `id`
    pub fn features(&self, id: u32) -> Option<&'a [f64]> {
        let table = self.table;
        self.rows.get(&id).and_then(|&row| table.row(row))
    }

    /// Feature row for a subject, or `JoinMismatch`
    pub fn join(&self, subject: &str, id: u32) -> Result<&'a [f64], AnalysisError> {
        self.features(id).ok_or_else(|| AnalysisError::JoinMismatch {
            subject: subject.to_string(),
            id,
        })
    }

    /// Number of features per row
    pub fn feature_count(&self) -> usize {
        self.table.feature_count()
    }
}
