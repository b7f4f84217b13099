//! Tabular sources.
//!
//! A [`TableSource`] yields the rows of the first sheet of a table, header
//! row included. Spreadsheets (`.xlsx`, `.xlsm`, `.xls`, `.ods`) are read
//! with calamine, `.csv` files with the `csv` crate.

use std::path::{Path, PathBuf};

use calamine::{Data, Reader, open_workbook_auto};
use rechovot_core::{Error, Result};
use rechovot_fts::CellValue;

/// One table row, cells in column order.
pub type Row = Vec<CellValue>;

/// Extensions handled by [`SpreadsheetSource`].
const SPREADSHEET_EXTENSIONS: [&str; 4] = ["xlsx", "xlsm", "xls", "ods"];

/// Something that can be read as a table of rows.
pub trait TableSource: Send + Sync {
    /// Read every row of the first sheet, the header row included.
    fn read_rows(&self) -> Result<Vec<Row>>;

    /// Human-readable description for logs.
    fn describe(&self) -> String;
}

/// Open a source file, choosing the reader by extension.
///
/// # Errors
///
/// Returns a source error when the file does not exist or its extension is
/// not supported.
pub fn open_source(path: &Path) -> Result<Box<dyn TableSource>> {
    if !path.is_file() {
        return Err(Error::source_error(format!(
            "Source file not found: {}",
            path.display()
        )));
    }

    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => Ok(Box::new(CsvSource::new(path))),
        ext if SPREADSHEET_EXTENSIONS.contains(&ext) => Ok(Box::new(SpreadsheetSource::new(path))),
        _ => Err(Error::source_error(format!(
            "Unsupported source format: {}",
            path.display()
        ))),
    }
}

// ============================================================================
// Spreadsheets
// ============================================================================

/// First worksheet of a workbook.
#[derive(Debug, Clone)]
pub struct SpreadsheetSource {
    path: PathBuf,
}

impl SpreadsheetSource {
    /// Create a source for the workbook at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TableSource for SpreadsheetSource {
    fn read_rows(&self) -> Result<Vec<Row>> {
        let path = self.path.display();
        let mut workbook = open_workbook_auto(&self.path)
            .map_err(|e| Error::source_error(format!("Cannot read workbook {path}: {e}")))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| Error::source_error(format!("Workbook has no sheets: {path}")))?
            .map_err(|e| Error::source_error(format!("Cannot read first sheet of {path}: {e}")))?;

        // The range starts at the first used cell; pad so that column
        // positions still count from column A.
        let leading = range.start().map_or(0, |(_, col)| col as usize);

        Ok(range
            .rows()
            .map(|cells| {
                std::iter::repeat_n(CellValue::Empty, leading)
                    .chain(cells.iter().map(cell_value))
                    .collect()
            })
            .collect())
    }

    fn describe(&self) -> String {
        format!("spreadsheet {}", self.path.display())
    }
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Int(n) => CellValue::Int(*n),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::Float(dt.as_f64()),
    }
}

// ============================================================================
// CSV
// ============================================================================

/// A CSV file. Every cell is read as text; empty cells are absent.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    /// Create a source for the CSV file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TableSource for CsvSource {
    fn read_rows(&self) -> Result<Vec<Row>> {
        let path = self.path.display();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.path)
            .map_err(|e| Error::source_error(format!("Cannot open {path}: {e}")))?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record =
                record.map_err(|e| Error::source_error(format!("Cannot read {path}: {e}")))?;
            rows.push(
                record
                    .iter()
                    .map(|field| {
                        if field.is_empty() {
                            CellValue::Empty
                        } else {
                            CellValue::Text(field.to_string())
                        }
                    })
                    .collect(),
            );
        }
        Ok(rows)
    }

    fn describe(&self) -> String {
        format!("csv {}", self.path.display())
    }
}

// ============================================================================
// Tests
// ============================================================================
