//! Tantivy index writer wrapper.
//!
//! This module provides `Indexer`, a wrapper around Tantivy's `IndexWriter`
//! that converts [`StreetDocument`]s into Tantivy documents, plus the reverse
//! conversion used when stored documents are read back.
//!
//! # Usage
//!
//! ```rust,ignore
//! let layout = IndexLayout::build(&field_schema);
//! let index = Index::create_in_ram(layout.schema().clone());
//! IndexLayout::register_tokenizers(&index);
//!
//! let mut indexer = Indexer::new(&index, &layout)?;
//! let id = indexer.add_document(&doc)?;
//! indexer.commit()?;
//! ```

use std::collections::BTreeMap;

use rechovot_core::{Error, Result};
use tantivy::schema::{Field, OwnedValue, Value};
use tantivy::{Index, IndexWriter, TantivyDocument, Term};
use uuid::Uuid;

use crate::document::StreetDocument;
use crate::schema::IndexLayout;
use crate::types::{FieldType, FieldValue, is_reserved_field};

/// Index writer buffer size (50MB).
const WRITER_BUFFER_SIZE: usize = 50_000_000;

/// Tantivy index writer wrapper.
///
/// Staged documents become searchable after `commit()` and a reader reload.
/// Dropping an `Indexer` without committing discards everything staged.
pub struct Indexer<'a> {
    writer: IndexWriter,
    layout: &'a IndexLayout,
}

impl<'a> Indexer<'a> {
    /// Open a writer on `index`.
    pub fn new(index: &Index, layout: &'a IndexLayout) -> Result<Self> {
        let writer: IndexWriter = index
            .writer_with_num_threads(1, WRITER_BUFFER_SIZE)
            .map_err(|e| Error::backend(format!("Failed to create index writer: {e}")))?;

        Ok(Self { writer, layout })
    }

    /// Stage a new document under a freshly generated id.
    ///
    /// Returns the id.
    pub fn add_document(&mut self, doc: &StreetDocument) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        self.writer
            .add_document(to_tantivy(self.layout, &id, doc)?)
            .map_err(|e| Error::backend(format!("Failed to add document: {e}")))?;
        Ok(id)
    }

    /// Stage a replacement of the document stored under `id`.
    pub fn replace_document(&mut self, id: &str, doc: &StreetDocument) -> Result<()> {
        let replacement = to_tantivy(self.layout, id, doc)?;
        self.writer.delete_term(Term::from_field_text(self.layout.id, id));
        self.writer
            .add_document(replacement)
            .map_err(|e| Error::backend(format!("Failed to replace document {id}: {e}")))?;
        Ok(())
    }

    /// Commit staged changes.
    pub fn commit(&mut self) -> Result<()> {
        self.writer
            .commit()
            .map_err(|e| Error::backend(format!("Failed to commit index: {e}")))?;
        Ok(())
    }
}

impl std::fmt::Debug for Indexer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Indexer")
            .field("layout", self.layout)
            .finish()
    }
}

/// Convert a street document to a Tantivy document.
///
/// Declared fields go to their own Tantivy field; fields the layout does not
/// declare go to the stored dynamic object. Every text value is also copied
/// into the composite field. A value whose type disagrees with the index
/// schema is skipped.
///
/// # Errors
///
/// Returns a configuration error when no field of the document could be
/// stored, which happens when loading into an index built from another
/// mapping.
pub(crate) fn to_tantivy(
    layout: &IndexLayout,
    id: &str,
    doc: &StreetDocument,
) -> Result<TantivyDocument> {
    let mut tantivy_doc = TantivyDocument::new();
    tantivy_doc.add_text(layout.id, id);

    let mut dynamic = BTreeMap::new();
    let mut stored = 0;
    for (name, value) in doc.fields() {
        if is_reserved_field(name) {
            log::warn!("Skipping reserved field `{name}` on document {id}");
            continue;
        }
        let Some((field, field_type)) = layout.resolve(name) else {
            dynamic.insert(name.to_string(), owned_value(value));
            stored += 1;
            continue;
        };
        match (field_type, value) {
            (FieldType::Text, FieldValue::Text(text)) => tantivy_doc.add_text(field, text),
            (FieldType::Integer, FieldValue::Integer(n)) => tantivy_doc.add_i64(field, *n),
            (FieldType::Boolean, FieldValue::Boolean(b)) => tantivy_doc.add_bool(field, *b),
            (expected, value) => {
                log::warn!(
                    "Skipping field `{name}` on document {id}: index expects {}, got {}",
                    expected.as_str(),
                    value.field_type().as_str()
                );
                continue;
            }
        }
        stored += 1;
    }

    if stored == 0 {
        return Err(Error::config(format!(
            "No field of document {id} fits the index schema ({} fields given)",
            doc.len()
        )));
    }

    if !dynamic.is_empty() {
        tantivy_doc.add_object(layout.dynamic, dynamic);
    }
    for text in doc.text_values() {
        tantivy_doc.add_text(layout.composite, text);
    }
    tantivy_doc.add_bool(layout.is_deleted, doc.is_deleted());
    Ok(tantivy_doc)
}

fn owned_value(value: &FieldValue) -> OwnedValue {
    match value {
        FieldValue::Text(s) => OwnedValue::Str(s.clone()),
        FieldValue::Integer(n) => OwnedValue::I64(*n),
        FieldValue::Boolean(b) => OwnedValue::Bool(*b),
    }
}

/// Convert a stored Tantivy document back to its id and street document.
pub(crate) fn from_tantivy(
    layout: &IndexLayout,
    stored: &TantivyDocument,
) -> Result<(String, StreetDocument)> {
    let id = stored
        .get_first(layout.id)
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::backend("Stored document has no id"))?
        .to_string();

    let mut doc = StreetDocument::new();
    for (name, value) in dynamic_fields(layout, stored) {
        doc.set(name, value);
    }
    for (name, field, field_type) in layout.fields() {
        if let Some(value) = stored_value(stored, field, field_type) {
            doc.set(name, value);
        }
    }

    let deleted = stored
        .get_first(layout.is_deleted)
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    doc.set_deleted(deleted);

    Ok((id, doc))
}

/// Read the stored dynamic object back as typed values.
pub(crate) fn dynamic_fields(
    layout: &IndexLayout,
    stored: &TantivyDocument,
) -> BTreeMap<String, FieldValue> {
    let Some(object) = stored.get_first(layout.dynamic).and_then(|v| v.as_object()) else {
        return BTreeMap::new();
    };

    object
        .filter_map(|(name, value)| {
            let value = if let Some(s) = value.as_str() {
                FieldValue::Text(s.to_string())
            } else if let Some(b) = value.as_bool() {
                FieldValue::Boolean(b)
            } else if let Some(n) = value.as_i64() {
                FieldValue::Integer(n)
            } else {
                FieldValue::Integer(i64::try_from(value.as_u64()?).ok()?)
            };
            Some((name.to_string(), value))
        })
        .collect()
}

/// Read one stored field as a typed value.
pub(crate) fn stored_value(
    stored: &TantivyDocument,
    field: Field,
    field_type: FieldType,
) -> Option<FieldValue> {
    let value = stored.get_first(field)?;
    match field_type {
        FieldType::Text => value.as_str().map(|s| FieldValue::Text(s.to_string())),
        FieldType::Integer => value.as_i64().map(FieldValue::Integer),
        FieldType::Boolean => value.as_bool().map(FieldValue::Boolean),
    }
}

// ============================================================================
// Tests
// ============================================================================
