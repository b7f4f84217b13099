//! Common types for the FTS module.
//!
//! These types are used across all search backends and are always available
//! regardless of feature flags.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Stored identifier of every indexed document.
pub const ID_FIELD: &str = "_id";

/// Soft-delete flag. Reserved: never part of the positional field list.
pub const DELETED_FIELD: &str = "isDeleted";

/// Composite field aggregating every text field at write time.
pub const COMPOSITE_FIELD: &str = "allText";

/// Field searched by the `free` mode.
pub const PRIMARY_NAME_FIELD: &str = "namePrimary";

/// Stored object holding document fields the index schema does not declare,
/// such as defaults for fields missing from `properties`.
pub const DYNAMIC_FIELD: &str = "_dynamic";

/// Names the system manages itself. Mappings and defaults cannot claim them.
pub fn is_reserved_field(name: &str) -> bool {
    matches!(name, ID_FIELD | DELETED_FIELD | COMPOSITE_FIELD | DYNAMIC_FIELD)
}

/// Declared type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Free text, tokenized and searchable.
    #[default]
    Text,
    /// Whole number (`integer` or `long` in the mapping document).
    Integer,
    /// Boolean flag.
    Boolean,
}

impl FieldType {
    /// Resolve a declared type string from a mapping document.
    ///
    /// Unspecified and unrecognised types resolve to [`FieldType::Text`].
    pub fn from_declared(declared: Option<&str>) -> Self {
        match declared.map(str::to_ascii_lowercase).as_deref() {
            Some("integer") | Some("long") => FieldType::Integer,
            Some("boolean") => FieldType::Boolean,
            _ => FieldType::Text,
        }
    }

    /// Canonical type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Integer => "long",
            FieldType::Boolean => "boolean",
        }
    }
}

/// A typed, normalized field value stored on a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Boolean value.
    Boolean(bool),
    /// Whole number.
    Integer(i64),
    /// Trimmed, non-empty text.
    Text(String),
}

impl FieldValue {
    /// The declared type this value satisfies.
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::Boolean(_) => FieldType::Boolean,
            FieldValue::Integer(_) => FieldType::Integer,
            FieldValue::Text(_) => FieldType::Text,
        }
    }

    /// Borrow the text, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Boolean(b) => write!(f, "{b}"),
            FieldValue::Integer(i) => write!(f, "{i}"),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

/// A raw cell read from a source table, before coercion.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Absent or blank cell.
    #[default]
    Empty,
    /// String cell.
    Text(String),
    /// Integer cell.
    Int(i64),
    /// Floating point cell (also used for spreadsheet dates).
    Float(f64),
    /// Boolean cell.
    Bool(bool),
}

impl CellValue {
    /// Returns `true` for an absent cell.
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

/// Backend selection.
///
/// Both the loader and the HTTP service build their backend from this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Backend type: "tantivy" (on disk) or "memory".
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Directory holding one sub-directory per index.
    pub index_root: Option<PathBuf>,
}

fn default_backend() -> String {
    "tantivy".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            index_root: None,
        }
    }
}

impl BackendConfig {
    /// On-disk Tantivy backend rooted at `index_root`.
    pub fn tantivy(index_root: impl Into<PathBuf>) -> Self {
        Self {
            backend: default_backend(),
            index_root: Some(index_root.into()),
        }
    }

    /// In-memory backend (nothing survives the process).
    pub fn memory() -> Self {
        Self {
            backend: "memory".to_string(),
            index_root: None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
