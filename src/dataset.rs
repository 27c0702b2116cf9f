//! # Tabular Dataset
//!
//! The dataset is an ordered sequence of rows aligned to a fixed header row,
//! imported from a spreadsheet file. Elements bind to columns *by name*, so
//! lookups go through [`Dataset::column_index`] (first exact match — header
//! names are not guaranteed unique by the source format).
//!
//! Rows may be shorter than the header row; missing trailing cells read as
//! empty. Completely empty rows are dropped at import time.

use std::fmt;
use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use serde::{Deserialize, Serialize};

use crate::error::SelloError;

/// A single spreadsheet cell value.
///
/// Numbers keep their numeric form so display formatting matches spreadsheet
/// semantics (`3.0` displays as `3`, not `3.0`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Empty,
}

impl CellValue {
    /// True for cells with no content.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Text(s) => s.is_empty(),
            CellValue::Number(_) => false,
            CellValue::Empty => true,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Empty => Ok(()),
        }
    }
}

/// An imported dataset: one header row plus data rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Dataset {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self { headers, rows }
    }

    /// Number of data rows (excludes the header row).
    pub fn total_rows(&self) -> usize {
        self.rows.len()
    }

    /// Index of the first header exactly matching `name` (case-sensitive).
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Display value of `column` in row `row_index`.
    ///
    /// Returns `None` when the column is not present in the headers. When the
    /// column exists but the row is short (or out of range), returns an empty
    /// string — a missing cell is data, a missing column is a binding gap.
    pub fn value(&self, row_index: usize, column: &str) -> Option<String> {
        let col = self.column_index(column)?;
        let cell = self.rows.get(row_index).and_then(|row| row.get(col));
        Some(cell.map(|c| c.to_string()).unwrap_or_default())
    }
}

/// Import a spreadsheet from raw file bytes.
///
/// The first worksheet is used: its first row becomes the headers, the
/// remaining rows become data. Trailing empty cells are trimmed per row and
/// rows left with zero cells are dropped.
///
/// `filename` is only used to reject unsupported file types up front.
pub fn import_bytes(bytes: &[u8], filename: &str) -> Result<Dataset, SelloError> {
    let lower = filename.to_lowercase();
    if !lower.ends_with(".xlsx") && !lower.ends_with(".xls") {
        return Err(SelloError::Import(format!(
            "unsupported file type: {} (expected .xlsx or .xls)",
            filename
        )));
    }

    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook = open_workbook_auto_from_rs(cursor)
        .map_err(|e| SelloError::Import(format!("failed to open workbook: {}", e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SelloError::Import("workbook has no sheets".to_string()))?
        .map_err(|e| SelloError::Import(format!("failed to read sheet: {}", e)))?;

    let mut row_iter = range.rows();

    let mut headers: Vec<String> = row_iter
        .next()
        .map(|row| row.iter().map(header_cell).collect())
        .unwrap_or_default();
    while headers.last().is_some_and(|h| h.is_empty()) {
        headers.pop();
    }

    let rows: Vec<Vec<CellValue>> = row_iter
        .map(|row| {
            let mut cells: Vec<CellValue> = row.iter().map(data_cell).collect();
            while cells.last().is_some_and(|c| matches!(c, CellValue::Empty)) {
                cells.pop();
            }
            cells
        })
        .filter(|cells| !cells.is_empty())
        .collect();

    Ok(Dataset::new(headers, rows))
}

/// Import a spreadsheet from a file path.
pub fn import_path(path: impl AsRef<Path>) -> Result<Dataset, SelloError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    import_bytes(&bytes, &filename)
}

fn header_cell(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn data_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        other => CellValue::Text(other.to_string()),
    }
}
