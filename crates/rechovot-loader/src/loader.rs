//! Batch loading orchestration.
//!
//! [`BulkLoader`] reads a whole table, maps every data row to a street
//! document, and writes the documents in batches:
//!
//! 1. Validate the configuration
//! 2. Read the first sheet (header row + at least one data row)
//! 3. Ensure the target index exists
//! 4. Map rows, flushing a bulk create every `batch_size` documents
//! 5. Flush the remainder and refresh once
//!
//! Source problems abort before anything is written. A failed flush aborts
//! the run; batches flushed earlier stay indexed.

use std::path::PathBuf;
use std::sync::Arc;

use rechovot_core::{Error, Result};
use rechovot_fts::{FieldSchema, MappingDocument, SearchBackend, StreetDocument, ensure_index};
use serde::Serialize;
use serde_json::json;

use crate::source::TableSource;

/// Default number of documents per bulk write.
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Loader configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadConfig {
    /// Source table path.
    pub source: PathBuf,
    /// Target index name.
    pub index: String,
    /// Documents per bulk write.
    pub batch_size: usize,
}

impl LoadConfig {
    /// Create a configuration with the default batch size.
    pub fn new(source: impl Into<PathBuf>, index: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            index: index.into(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Set the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Check the configuration before any work is done.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::config("Batch size must be at least 1"));
        }
        if self.index.trim().is_empty() {
            return Err(Error::config("Index name must not be empty"));
        }
        Ok(())
    }
}

/// Statistics about a load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    /// Documents written to the index.
    pub indexed: usize,
    /// Target index.
    pub index_name: String,
    /// Data rows read (header excluded).
    pub rows_read: usize,
    /// Data rows that produced no document.
    pub skipped: usize,
    /// Bulk writes issued.
    pub batches: usize,
    /// Whether the index was created by this load.
    pub created_index: bool,
}

impl LoadReport {
    /// The summary printed by the command line tool.
    pub fn summary(&self) -> serde_json::Value {
        json!({ "indexed": self.indexed, "indexName": self.index_name })
    }
}

/// Bulk loader.
pub struct BulkLoader {
    backend: Arc<dyn SearchBackend>,
    mapping: MappingDocument,
    schema: FieldSchema,
    config: LoadConfig,
}

impl BulkLoader {
    /// Create a loader writing through `backend`.
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        mapping: MappingDocument,
        schema: FieldSchema,
        config: LoadConfig,
    ) -> Self {
        Self {
            backend,
            mapping,
            schema,
            config,
        }
    }

    /// Load every data row of `source` into the index.
    ///
    /// # Errors
    ///
    /// - `Config` for an invalid configuration
    /// - `Source` when the table cannot be read or has no data rows
    /// - the backend error of the first failed flush
    pub async fn run(&self, source: &dyn TableSource) -> Result<LoadReport> {
        self.config.validate()?;

        log::info!("Reading {}", source.describe());
        let rows = source.read_rows()?;
        if rows.len() < 2 {
            return Err(Error::source_error(format!(
                "No data rows in {}",
                source.describe()
            )));
        }

        let index = self.config.index.as_str();
        let mut report = LoadReport {
            index_name: index.to_string(),
            created_index: ensure_index(self.backend.as_ref(), &self.mapping, index).await?,
            ..Default::default()
        };

        let mut batch: Vec<StreetDocument> = Vec::with_capacity(self.config.batch_size);

        // Row 1 is the header
        for (line, row) in rows.iter().enumerate().skip(1) {
            report.rows_read += 1;

            let Some(doc) = StreetDocument::from_row(row, &self.schema) else {
                log::debug!("Skipped row {} (no populated fields)", line + 1);
                report.skipped += 1;
                continue;
            };
            batch.push(doc);

            if batch.len() >= self.config.batch_size {
                self.flush(&mut batch, &mut report).await?;
            }
        }

        if !batch.is_empty() {
            self.flush(&mut batch, &mut report).await?;
        }

        if report.indexed > 0 {
            self.backend.refresh(index).await?;
        }

        log::info!(
            "Indexed {} documents into {} ({} rows, {} skipped, {} batches)",
            report.indexed,
            index,
            report.rows_read,
            report.skipped,
            report.batches
        );

        Ok(report)
    }

    async fn flush(&self, batch: &mut Vec<StreetDocument>, report: &mut LoadReport) -> Result<()> {
        let created = self
            .backend
            .bulk_create(&self.config.index, batch)
            .await?;
        report.indexed += created;
        report.batches += 1;
        log::debug!("Flushed batch {} ({created} documents)", report.batches);
        batch.clear();
        Ok(())
    }
}

impl std::fmt::Debug for BulkLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulkLoader")
            .field("backend", &self.backend.name())
            .field("fields", &self.schema.len())
            .field("config", &self.config)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = LoadConfig::new("data/streets.xlsx", "streets");
        assert_eq!(config.batch_size, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let config = LoadConfig::new("data/streets.xlsx", "streets").with_batch_size(0);
        assert!(matches!(config.validate(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_blank_index_rejected() {
        let config = LoadConfig::new("data/streets.xlsx", " ");
        assert!(matches!(config.validate(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_report_summary() {
        let report = LoadReport {
            indexed: 3,
            index_name: "streets".to_string(),
            rows_read: 4,
            skipped: 1,
            batches: 1,
            created_index: true,
        };
        assert_eq!(
            report.summary(),
            json!({ "indexed": 3, "indexName": "streets" })
        );

        let full = serde_json::to_value(&report).unwrap();
        assert_eq!(full["rowsRead"], 4);
        assert_eq!(full["createdIndex"], true);
    }
}
