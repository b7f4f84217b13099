//! Street document representation.
//!
//! [`StreetDocument`] is the indexed unit: a sparse map of field name to typed
//! value plus the soft-delete flag. Documents are built from source rows with
//! [`StreetDocument::from_row`]; a row that yields no populated field produces
//! no document.
//!
//! ```rust
//! use rechovot_fts::{CellValue, FieldSchema, MappingDocument, StreetDocument};
//!
//! let mapping = MappingDocument::from_json_str(
//!     r#"{"properties": {"namePrimary": {"type": "text"}, "streetCode": {"type": "long"}}}"#,
//! ).unwrap();
//! let schema = FieldSchema::from_mapping(&mapping).unwrap();
//!
//! let row = vec![CellValue::from("הרצל"), CellValue::from("12")];
//! let doc = StreetDocument::from_row(&row, &schema).unwrap();
//! assert_eq!(doc.len(), 2);
//!
//! assert!(StreetDocument::from_row(&[CellValue::Empty], &schema).is_none());
//! ```

use std::collections::BTreeMap;

use serde::Serialize;

use crate::coerce::coerce;
use crate::mapping::FieldSchema;
use crate::types::{CellValue, FieldValue};

/// A document to be indexed and searched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StreetDocument {
    /// Populated fields. Never contains the soft-delete flag.
    #[serde(flatten)]
    fields: BTreeMap<String, FieldValue>,

    /// Logical deletion flag.
    #[serde(rename = "isDeleted")]
    is_deleted: bool,
}

impl StreetDocument {
    /// Create an empty, not-deleted document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from one source row.
    ///
    /// Cell *i* is coerced with the type of schema field *i* (columns beyond
    /// the row's length count as absent). Defaults then fill every field still
    /// missing. Returns `None` when nothing was populated.
    pub fn from_row(row: &[CellValue], schema: &FieldSchema) -> Option<Self> {
        let mut doc = Self::new();

        for (i, spec) in schema.fields().iter().enumerate() {
            let raw = row.get(i).unwrap_or(&CellValue::Empty);
            if let Some(value) = coerce(raw, spec.field_type) {
                doc.fields.insert(spec.name.clone(), value);
            }
        }

        for (name, value) in schema.defaults() {
            doc.fields
                .entry(name.clone())
                .or_insert_with(|| value.clone());
        }

        if doc.is_empty() { None } else { Some(doc) }
    }

    /// Set a field value (builder style).
    pub fn with(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.set(name, value);
        self
    }

    /// Set a field value.
    pub fn set(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }

    /// Get a field value.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Iterate populated fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate the text values, the input of the composite field.
    pub fn text_values(&self) -> impl Iterator<Item = &str> {
        self.fields.values().filter_map(FieldValue::as_text)
    }

    /// Number of populated fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` when no field is populated.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether the document has been logically deleted.
    pub fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    /// Set the deletion flag. Used when reading stored documents back.
    pub fn set_deleted(&mut self, deleted: bool) {
        self.is_deleted = deleted;
    }
}

// ============================================================================
// Tests
// ============================================================================
