//! Mapping document and field schema.
//!
//! The mapping document is an external JSON file in the shape of an
//! Elasticsearch index definition: per-field types under
//! `mappings.properties` (or a top-level `properties`), plus an optional
//! loader-only `defaults` object. [`FieldSchema`] is the validated view the
//! loader works with; it is built once at startup and never mutated.
//!
//! # Positional alignment
//!
//! Source rows carry no field names. Column *i* is mapped to field *i* of
//! [`FieldSchema::fields`], so the order of `properties` in the mapping file
//! must mirror the column order of the source table. This is not checked at
//! runtime.

use std::collections::BTreeMap;
use std::path::Path;

use rechovot_core::{Error, Result};
use serde_json::{Map, Value};

use crate::coerce::coerce_json;
use crate::types::{FieldType, FieldValue, is_reserved_field};

/// Key of the loader-only defaults object.
const DEFAULTS_KEY: &str = "defaults";

/// A raw mapping document as read from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingDocument {
    raw: Map<String, Value>,
}

impl MappingDocument {
    /// Wrap a parsed JSON value. The value must be an object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(raw) => Ok(Self { raw }),
            other => Err(Error::config(format!(
                "Mapping document must be a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Parse a mapping document from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| Error::config(format!("Malformed mapping document: {e}")))?;
        Self::from_value(value)
    }

    /// Load a mapping document from a file.
    ///
    /// A missing or malformed file is a configuration error naming the path.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::config(format!(
                "Schema file not found: {}",
                path.display()
            )));
        }
        let text = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
        Self::from_json_str(&text).map_err(|e| match e {
            Error::Config { message } => {
                Error::config(format!("{} ({})", message, path.display()))
            }
            other => other,
        })
    }

    /// The `properties` object, from `mappings.properties` or the top level.
    pub fn properties(&self) -> Option<&Map<String, Value>> {
        self.raw
            .get("mappings")
            .and_then(|m| m.get("properties"))
            .or_else(|| self.raw.get("properties"))
            .and_then(Value::as_object)
    }

    /// The raw `defaults` entry, if any.
    pub fn defaults(&self) -> Option<&Value> {
        self.raw.get(DEFAULTS_KEY)
    }

    /// The document with `defaults` removed.
    ///
    /// This is what gets sent to the backend when an index is created:
    /// defaults are a loader concept, not index configuration.
    pub fn without_defaults(&self) -> Value {
        let mut raw = self.raw.clone();
        raw.remove(DEFAULTS_KEY);
        Value::Object(raw)
    }

    /// The full document as JSON.
    pub fn as_value(&self) -> Value {
        Value::Object(self.raw.clone())
    }
}

/// One positional field of the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name, unique within the schema.
    pub name: String,
    /// Declared type.
    pub field_type: FieldType,
}

/// Validated, immutable field schema derived from a mapping document.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    fields: Vec<FieldSpec>,
    defaults: BTreeMap<String, FieldValue>,
}

impl FieldSchema {
    /// Derive the schema from a mapping document.
    ///
    /// Fields come out in document order of `properties`, without the
    /// reserved fields. Every key of `defaults` is kept: a default for a
    /// declared field is coerced to that field's type, any other default is
    /// typed after its JSON value. A non-object `defaults` entry is treated as
    /// absent.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no indexable field remains, or when
    /// a default names a reserved field or has no usable value.
    pub fn from_mapping(mapping: &MappingDocument) -> Result<Self> {
        let fields: Vec<FieldSpec> = mapping
            .properties()
            .map(|props| {
                props
                    .iter()
                    .filter(|(name, _)| !is_reserved_field(name))
                    .map(|(name, spec)| FieldSpec {
                        name: name.clone(),
                        field_type: FieldType::from_declared(
                            spec.get("type").and_then(Value::as_str),
                        ),
                    })
                    .collect()
            })
            .unwrap_or_default();

        if fields.is_empty() {
            return Err(Error::config(
                "Mapping document declares no indexable fields under `properties`",
            ));
        }

        let defaults = collect_defaults(mapping.defaults(), &fields)?;

        log::debug!(
            "Field schema: {} fields, {} defaults",
            fields.len(),
            defaults.len()
        );

        Ok(Self { fields, defaults })
    }

    /// Load a mapping file and derive its schema in one step.
    pub fn load(path: &Path) -> Result<(MappingDocument, Self)> {
        let mapping = MappingDocument::load(path)?;
        let schema = Self::from_mapping(&mapping)?;
        Ok((mapping, schema))
    }

    /// Positional fields in column order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Field names in column order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Declared type of a field, if the schema has it.
    pub fn field_type(&self, name: &str) -> Option<FieldType> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.field_type)
    }

    /// Typed default values keyed by field name.
    pub fn defaults(&self) -> &BTreeMap<String, FieldValue> {
        &self.defaults
    }

    /// Number of positional fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Always `false` for a validated schema.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn collect_defaults(
    raw: Option<&Value>,
    fields: &[FieldSpec],
) -> Result<BTreeMap<String, FieldValue>> {
    let Some(raw) = raw else {
        return Ok(BTreeMap::new());
    };
    let Some(entries) = raw.as_object() else {
        log::warn!("Ignoring malformed `defaults` (expected an object)");
        return Ok(BTreeMap::new());
    };

    let mut defaults = BTreeMap::new();
    for (name, value) in entries {
        if is_reserved_field(name) {
            return Err(Error::config(format!(
                "Default given for reserved field '{name}'"
            )));
        }

        let field_type = match fields.iter().find(|f| &f.name == name) {
            Some(spec) => spec.field_type,
            None => {
                log::debug!("Default for '{name}' has no declared field; stored as dynamic");
                inferred_type(value)
            }
        };

        let typed = coerce_json(value, field_type).ok_or_else(|| {
            Error::config(format!(
                "Default for '{name}' is not a valid {}: {value}",
                field_type.as_str()
            ))
        })?;
        defaults.insert(name.clone(), typed);
    }
    Ok(defaults)
}

/// Type of an undeclared default, after its JSON value.
fn inferred_type(value: &Value) -> FieldType {
    match value {
        Value::Bool(_) => FieldType::Boolean,
        Value::Number(n) if n.is_i64() => FieldType::Integer,
        _ => FieldType::Text,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ============================================================================
// Tests
// ============================================================================
