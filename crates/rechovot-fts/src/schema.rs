//! Tantivy schema layout for street indexes.
//!
//! [`IndexLayout`] turns a [`FieldSchema`] into a Tantivy schema and keeps
//! typed handles to every field, avoiding string lookups while indexing and
//! querying. The layout can also be recovered from the schema of an index
//! that already exists on disk.
//!
//! # Schema Fields
//!
//! - `_id`: document identifier (STRING | STORED)
//! - one field per schema field:
//!   - text → TEXT with positions (for phrase queries) | STORED
//!   - integer → i64 INDEXED | STORED
//!   - boolean → bool INDEXED | STORED
//! - `allText`: composite of every text value (TEXT, not stored)
//! - `isDeleted`: soft-delete flag (bool INDEXED | STORED | FAST)
//! - `_dynamic`: JSON object of undeclared fields (STORED only)
//!
//! # Tokenizer
//!
//! Text fields use the `street` tokenizer:
//! SimpleTokenizer → RemoveLongFilter → LowerCaser.
//! No stemming is applied; Hebrew words are matched as written.

use rechovot_core::{Error, Result};
use tantivy::Index;
use tantivy::schema::{
    FAST, Field, FieldType as TantivyFieldType, INDEXED, IndexRecordOption, JsonObjectOptions,
    STORED, STRING, Schema, SchemaBuilder, TextFieldIndexing, TextOptions,
};
use tantivy::tokenizer::{LowerCaser, RemoveLongFilter, SimpleTokenizer, TextAnalyzer};

use crate::mapping::FieldSchema;
use crate::types::{
    COMPOSITE_FIELD, DELETED_FIELD, DYNAMIC_FIELD, FieldType, ID_FIELD, is_reserved_field,
};

/// Name of the tokenizer registered for text fields.
pub const STREET_TOKENIZER: &str = "street";

/// Tokens longer than this many bytes are dropped.
const MAX_TOKEN_LEN: usize = 80;

/// Typed handles for one street index.
#[derive(Clone)]
pub struct IndexLayout {
    schema: Schema,

    /// Document identifier.
    pub id: Field,
    /// Soft-delete flag.
    pub is_deleted: Field,
    /// Composite text field.
    pub composite: Field,
    /// Stored object of fields outside the schema.
    pub dynamic: Field,

    fields: Vec<(String, Field, FieldType)>,
}

impl IndexLayout {
    /// Build the Tantivy schema for a field schema.
    pub fn build(field_schema: &FieldSchema) -> Self {
        let mut builder = SchemaBuilder::new();

        let id = builder.add_text_field(ID_FIELD, STRING | STORED);

        let mut fields = Vec::with_capacity(field_schema.len());
        for spec in field_schema.fields() {
            let field = match spec.field_type {
                FieldType::Text => {
                    builder.add_text_field(&spec.name, text_options().set_stored())
                }
                FieldType::Integer => builder.add_i64_field(&spec.name, INDEXED | STORED),
                FieldType::Boolean => builder.add_bool_field(&spec.name, INDEXED | STORED),
            };
            fields.push((spec.name.clone(), field, spec.field_type));
        }

        let composite = builder.add_text_field(COMPOSITE_FIELD, text_options());
        let is_deleted = builder.add_bool_field(DELETED_FIELD, INDEXED | STORED | FAST);
        let dynamic =
            builder.add_json_field(DYNAMIC_FIELD, JsonObjectOptions::default().set_stored());

        Self {
            schema: builder.build(),
            id,
            is_deleted,
            composite,
            dynamic,
            fields,
        }
    }

    /// Recover the layout from the schema of an existing index.
    pub fn from_schema(schema: Schema) -> Result<Self> {
        let lookup = |name: &str| {
            schema
                .get_field(name)
                .map_err(|_| Error::backend(format!("Index schema has no `{name}` field")))
        };
        let id = lookup(ID_FIELD)?;
        let is_deleted = lookup(DELETED_FIELD)?;
        let composite = lookup(COMPOSITE_FIELD)?;
        let dynamic = lookup(DYNAMIC_FIELD)?;

        let mut fields = Vec::new();
        for (field, entry) in schema.fields() {
            let name = entry.name();
            if is_reserved_field(name) {
                continue;
            }
            let field_type = match entry.field_type() {
                TantivyFieldType::Str(_) => FieldType::Text,
                TantivyFieldType::I64(_) => FieldType::Integer,
                TantivyFieldType::Bool(_) => FieldType::Boolean,
                other => {
                    return Err(Error::backend(format!(
                        "Unsupported field type for `{name}`: {:?}",
                        other.value_type()
                    )));
                }
            };
            fields.push((name.to_string(), field, field_type));
        }

        Ok(Self {
            schema,
            id,
            is_deleted,
            composite,
            dynamic,
            fields,
        })
    }

    /// Get the underlying Tantivy schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Register the street tokenizer with a Tantivy index.
    ///
    /// Must be called after creating/opening an index.
    pub fn register_tokenizers(index: &Index) {
        let street = TextAnalyzer::builder(SimpleTokenizer::default())
            .filter(RemoveLongFilter::limit(MAX_TOKEN_LEN))
            .filter(LowerCaser)
            .build();

        index.tokenizers().register(STREET_TOKENIZER, street);
    }

    /// Declared fields (excluding the reserved ones) with their types.
    pub fn fields(&self) -> impl Iterator<Item = (&str, Field, FieldType)> {
        self.fields.iter().map(|(n, f, t)| (n.as_str(), *f, *t))
    }

    /// Resolve a field name, including the composite field and the flag.
    pub fn resolve(&self, name: &str) -> Option<(Field, FieldType)> {
        match name {
            COMPOSITE_FIELD => Some((self.composite, FieldType::Text)),
            DELETED_FIELD => Some((self.is_deleted, FieldType::Boolean)),
            ID_FIELD => Some((self.id, FieldType::Text)),
            _ => self
                .fields
                .iter()
                .find(|(n, _, _)| n == name)
                .map(|(_, f, t)| (*f, *t)),
        }
    }
}

impl std::fmt::Debug for IndexLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexLayout")
            .field("field_count", &self.fields.len())
            .finish()
    }
}

/// Text options with positions, for phrase queries.
fn text_options() -> TextOptions {
    TextOptions::default().set_indexing_options(
        TextFieldIndexing::default()
            .set_tokenizer(STREET_TOKENIZER)
            .set_index_option(IndexRecordOption::WithFreqsAndPositions),
    )
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mapping::MappingDocument;
    use serde_json::json;

    fn field_schema() -> FieldSchema {
        let mapping = MappingDocument::from_value(json!({
            "properties": {
                "namePrimary": { "type": "text" },
                "streetCode": { "type": "long" },
                "isOfficial": { "type": "boolean" },
                "allText": { "type": "text" }
            }
        }))
        .unwrap();
        FieldSchema::from_mapping(&mapping).unwrap()
    }

    #[test]
    fn test_layout_build() {
        let layout = IndexLayout::build(&field_schema());
        let schema = layout.schema();

        assert!(schema.get_field("_id").is_ok());
        assert!(schema.get_field("namePrimary").is_ok());
        assert!(schema.get_field("streetCode").is_ok());
        assert!(schema.get_field("isOfficial").is_ok());
        assert!(schema.get_field("allText").is_ok());
        assert!(schema.get_field("isDeleted").is_ok());
        assert!(schema.get_field("_dynamic").is_ok());
        assert_eq!(layout.fields().count(), 3);
    }

    #[test]
    fn test_field_types() {
        let layout = IndexLayout::build(&field_schema());
        let schema = layout.schema();

        let id_entry = schema.get_field_entry(layout.id);
        assert!(id_entry.is_indexed());
        assert!(id_entry.is_stored());

        // Composite is searchable but never stored
        let composite_entry = schema.get_field_entry(layout.composite);
        assert!(composite_entry.is_indexed());
        assert!(!composite_entry.is_stored());

        let deleted_entry = schema.get_field_entry(layout.is_deleted);
        assert!(deleted_entry.is_fast());

        // Dynamic fields are kept for read-back only
        let dynamic_entry = schema.get_field_entry(layout.dynamic);
        assert!(dynamic_entry.is_stored());
        assert!(!dynamic_entry.is_indexed());
    }

    #[test]
    fn test_layout_roundtrip_through_schema() {
        let built = IndexLayout::build(&field_schema());
        let recovered = IndexLayout::from_schema(built.schema().clone()).unwrap();

        let names: Vec<(&str, FieldType)> = recovered.fields().map(|(n, _, t)| (n, t)).collect();
        assert_eq!(
            names,
            vec![
                ("namePrimary", FieldType::Text),
                ("streetCode", FieldType::Integer),
                ("isOfficial", FieldType::Boolean),
            ]
        );
        assert_eq!(recovered.id, built.id);
        assert_eq!(recovered.dynamic, built.dynamic);
    }

    #[test]
    fn test_resolve() {
        let layout = IndexLayout::build(&field_schema());
        assert_eq!(
            layout.resolve("allText"),
            Some((layout.composite, FieldType::Text))
        );
        assert_eq!(
            layout.resolve("isDeleted"),
            Some((layout.is_deleted, FieldType::Boolean))
        );
        assert!(layout.resolve("streetCode").is_some());
        assert!(layout.resolve("missing").is_none());
    }

    #[test]
    fn test_tokenizer_registration() {
        let layout = IndexLayout::build(&field_schema());
        let index = Index::create_in_ram(layout.schema().clone());

        IndexLayout::register_tokenizers(&index);

        assert!(index.tokenizers().get(STREET_TOKENIZER).is_some());
    }

    #[test]
    fn test_tokenizer_splits_hebrew_words() {
        let layout = IndexLayout::build(&field_schema());
        let index = Index::create_in_ram(layout.schema().clone());
        IndexLayout::register_tokenizers(&index);

        let mut analyzer = index.tokenizers().get(STREET_TOKENIZER).unwrap();
        let mut stream = analyzer.token_stream("דרך העצמאות, Herzl");
        let mut tokens = Vec::new();
        while let Some(token) = tantivy::tokenizer::TokenStream::next(&mut stream) {
            tokens.push(token.text.clone());
        }
        assert_eq!(tokens, vec!["דרך", "העצמאות", "herzl"]);
    }
}
