//! The editable question table.
//!
//! Rows are fixed at creation; only the interviewer columns (`response_notes`
//! and `rating`) can change afterwards.

use serde::{Deserialize, Serialize};

use crate::error::{EsprobeError, Result};
use crate::record::{Record, COLUMN_LABELS};

/// An edit to one interviewer-owned cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellEdit {
    ResponseNotes(String),
    Rating(String),
}

/// Ordered question records in generation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionTable {
    records: Vec<Record>,
}

impl QuestionTable {
    pub fn from_records(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn headers(&self) -> [&'static str; 6] {
        COLUMN_LABELS
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn get(&self, row: usize) -> Option<&Record> {
        self.records.get(row)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Replace one editable cell. Nothing else in the table changes.
    pub fn apply_edit(&mut self, row: usize, edit: CellEdit) -> Result<&Record> {
        let len = self.records.len();
        let record = self
            .records
            .get_mut(row)
            .ok_or(EsprobeError::RowOutOfRange { row, len })?;

        match edit {
            CellEdit::ResponseNotes(notes) => record.response_notes = notes,
            CellEdit::Rating(raw) => record.rating = normalize_rating(&raw)?,
        }
        Ok(record)
    }
}

/// Accepts an empty value (clears the cell) or a whole number from 1 to 5.
pub fn normalize_rating(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    match trimmed.parse::<u8>() {
        Ok(n @ 1..=5) => Ok(n.to_string()),
        _ => Err(EsprobeError::InvalidEdit(format!(
            "rating must be empty or a number from 1 to 5, got {trimmed:?}"
        ))),
    }
}
