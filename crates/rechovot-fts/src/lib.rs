//! Street search infrastructure for Rechovot.
//!
//! This crate provides the street document model, mapping-driven schemas,
//! value coercion, query building and search execution, with a Tantivy
//! backend (feature-gated).
//!
//! # Features
//!
//! - `fts-tantivy`: Enable the embedded Tantivy backend (default)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      rechovot-fts                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  SearchBackend trait                                        │
//! │  └── TantivyBackend (on disk or in memory)                  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  MappingDocument / FieldSchema (mapping-driven fields)      │
//! │  StreetDocument (row → typed document)                      │
//! │  QueryBuilder (free / any / phrase modes)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ensure_index (provisioning)                                │
//! │  soft_delete (isDeleted flag + refresh)                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  IndexLayout (Tantivy schema)                               │
//! │  Indexer (Tantivy index writer)                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Reserved Fields
//!
//! | Field | Purpose |
//! |-------|---------|
//! | `_id` | Backend-assigned document id |
//! | `isDeleted` | Soft-delete flag, always present, filtered on every search |
//! | `allText` | Composite of every text field, target of `any` and `phrase` |
//! | `namePrimary` | Target of `free` searches |
//! | `_dynamic` | Stored fields outside the mapping (e.g. extra defaults) |
//!
//! # Example
//!
//! ```rust,ignore
//! use rechovot_fts::{
//!     create_search_backend, ensure_index, BackendConfig, MappingDocument, QueryBuilder,
//!     SearchMode,
//! };
//!
//! let backend = create_search_backend(&BackendConfig::tantivy("data/index"))?;
//! let mapping = MappingDocument::load("config/streets-mapping.json".as_ref())?;
//! ensure_index(backend.as_ref(), &mapping, "streets").await?;
//!
//! let query = QueryBuilder::new().build(SearchMode::Phrase, "דרך העצמאות");
//! for hit in backend.search("streets", &query).await? {
//!     println!("{}: {:?}", hit.id, hit.source.get("namePrimary"));
//! }
//! ```

// Core modules (always available)
pub mod backend;
pub mod coerce;
pub mod delete;
pub mod document;
pub mod mapping;
pub mod provision;
pub mod query;
pub mod types;

// Feature-gated Tantivy modules
#[cfg(feature = "fts-tantivy")]
pub mod schema;

#[cfg(feature = "fts-tantivy")]
pub mod indexer;

#[cfg(feature = "fts-tantivy")]
pub mod tantivy_search;

// Re-exports
pub use backend::{DocumentPatch, Hit, SearchBackend, create_search_backend};
pub use coerce::{coerce, coerce_json};
pub use delete::soft_delete;
pub use document::StreetDocument;
pub use mapping::{FieldSchema, FieldSpec, MappingDocument};
pub use provision::ensure_index;
pub use query::{
    Clause, HIT_FIELDS, MAX_RESULTS, Operator, QueryBuilder, SearchMode, StructuredQuery,
    TermFilter,
};
pub use types::{
    BackendConfig, COMPOSITE_FIELD, CellValue, DELETED_FIELD, DYNAMIC_FIELD, FieldType,
    FieldValue, ID_FIELD, PRIMARY_NAME_FIELD, is_reserved_field,
};

#[cfg(feature = "fts-tantivy")]
pub use schema::IndexLayout;

#[cfg(feature = "fts-tantivy")]
pub use indexer::Indexer;

#[cfg(feature = "fts-tantivy")]
pub use tantivy_search::TantivyBackend;
