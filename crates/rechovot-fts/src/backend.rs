//! Search backend trait and factory.
//!
//! This module defines the `SearchBackend` trait that all search
//! implementations must satisfy: the handful of index operations the loader
//! and the HTTP service need, modelled on a document store such as
//! Elasticsearch.
//!
//! # Backends
//!
//! - `TantivyBackend`: embedded Tantivy indexes, on disk or in memory
//!   (requires `fts-tantivy` feature)
//!
//! # Example
//!
//! ```rust,ignore
//! use rechovot_fts::{create_search_backend, BackendConfig, QueryBuilder, SearchMode};
//!
//! let backend = create_search_backend(&BackendConfig::tantivy("data/index"))?;
//! let query = QueryBuilder::default().build(SearchMode::Any, "הרצל");
//! let hits = backend.search("streets", &query).await?;
//! println!("Found {} hits", hits.len());
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use rechovot_core::{Error, Result};
use serde::Serialize;

use crate::document::StreetDocument;
use crate::query::StructuredQuery;
use crate::types::{BackendConfig, DELETED_FIELD, FieldValue};

/// A single search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hit {
    /// Backend-assigned document identifier.
    pub id: String,

    /// Relevance score (higher is better).
    pub score: f32,

    /// Projected stored fields. Fields absent on the document are omitted.
    pub source: BTreeMap<String, FieldValue>,
}

/// Fields to overwrite on an existing document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentPatch {
    #[serde(flatten)]
    fields: BTreeMap<String, FieldValue>,
}

impl DocumentPatch {
    /// Create an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Patch that flags a document as logically deleted.
    pub fn mark_deleted() -> Self {
        Self::new().set(DELETED_FIELD, FieldValue::Boolean(true))
    }

    /// Add a field to the patch.
    pub fn set(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Iterate the patched fields.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns `true` if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Abstract search backend trait.
///
/// Implementations must be safe to share across concurrent requests; the
/// HTTP service holds one instance behind an `Arc` for its whole lifetime.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Check whether an index exists.
    async fn index_exists(&self, index: &str) -> Result<bool>;

    /// Create an index from a mapping document (without `defaults`).
    ///
    /// Fails if the index already exists.
    async fn create_index(&self, index: &str, mapping: &serde_json::Value) -> Result<()>;

    /// Create every document as a new entry in one call, without refreshing.
    ///
    /// Returns the number of documents created.
    async fn bulk_create(&self, index: &str, docs: &[StreetDocument]) -> Result<usize>;

    /// Execute a structured query.
    ///
    /// Returns hits ordered by relevance (highest first).
    async fn search(&self, index: &str, query: &StructuredQuery) -> Result<Vec<Hit>>;

    /// Apply a partial update to one document.
    ///
    /// The change is visible to every search issued after the call returns.
    /// Returns a not-found error if no document has this id.
    async fn update(&self, index: &str, id: &str, patch: &DocumentPatch) -> Result<()>;

    /// Make every acknowledged write visible to searches.
    async fn refresh(&self, index: &str) -> Result<()>;

    /// Get the backend name for diagnostics.
    fn name(&self) -> &str;
}

/// Create a search backend based on configuration.
///
/// Selection logic:
/// 1. `"tantivy"` with an `index_root` → on-disk `TantivyBackend`
/// 2. `"memory"` → in-memory `TantivyBackend`
///
/// # Errors
///
/// Returns a configuration error for an unknown backend, a missing
/// `index_root`, or when the `fts-tantivy` feature is disabled.
pub fn create_search_backend(config: &BackendConfig) -> Result<Arc<dyn SearchBackend>> {
    match config.backend.as_str() {
        #[cfg(feature = "fts-tantivy")]
        "tantivy" => {
            let root = config
                .index_root
                .as_ref()
                .ok_or_else(|| Error::config("The tantivy backend requires an index root"))?;
            let backend = crate::tantivy_search::TantivyBackend::open(root)?;
            Ok(Arc::new(backend))
        }
        #[cfg(feature = "fts-tantivy")]
        "memory" => Ok(Arc::new(crate::tantivy_search::TantivyBackend::in_memory())),
        other => Err(Error::config(format!("Unknown search backend: {other}"))),
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
    fn test_mark_deleted_patch() {
        let patch = DocumentPatch::mark_deleted();
        let fields: Vec<_> = patch.fields().collect();
        assert_eq!(fields, vec![("isDeleted", &FieldValue::Boolean(true))]);
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_patch_serialization() {
        let patch = DocumentPatch::mark_deleted();
        let json = serde_json::to_string(&patch).unwrap();
        assert_eq!(json, r#"{"isDeleted":true}"#);
    }

    #[test]
    fn test_create_unknown_backend() {
        let config = BackendConfig {
            backend: "elastic".to_string(),
            index_root: None,
        };
        let err = create_search_backend(&config).err().unwrap();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[cfg(feature = "fts-tantivy")]
    #[test]
    fn test_create_tantivy_requires_root() {
        let config = BackendConfig::default();
        assert!(create_search_backend(&config).is_err());
    }

    #[cfg(feature = "fts-tantivy")]
    #[test]
    fn test_create_memory_backend() {
        let backend = create_search_backend(&BackendConfig::memory()).unwrap();
        assert_eq!(backend.name(), "tantivy");
    }

    #[cfg(feature = "fts-tantivy")]
    #[test]
    fn test_create_disk_backend() {
        let dir = tempfile::tempdir().unwrap();
        let backend = create_search_backend(&BackendConfig::tantivy(dir.path())).unwrap();
        assert_eq!(backend.name(), "tantivy");
    }
}
