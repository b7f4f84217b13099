//! # rechovot-loader
//!
//! Offline bulk loader for Rechovot.
//!
//! Reads the first sheet of a spreadsheet (or a CSV file), maps each data row
//! positionally onto the fields of the mapping document, and writes the
//! resulting street documents into a search index in batches.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod loader;
pub mod source;

pub use loader::{BulkLoader, DEFAULT_BATCH_SIZE, LoadConfig, LoadReport};
pub use source::{CsvSource, Row, SpreadsheetSource, TableSource, open_source};
