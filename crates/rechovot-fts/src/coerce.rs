//! Cell value coercion.
//!
//! [`coerce`] turns one raw cell into a typed [`FieldValue`] according to the
//! field's declared type. It is pure and total: any value that cannot be
//! represented degrades to `None` instead of failing the row or the load.

use crate::types::{CellValue, FieldType, FieldValue};

/// Strings accepted as `true` for boolean fields (compared lowercased).
const TRUTHY: [&str; 3] = ["true", "1", "yes"];

/// Coerce a raw cell to the declared field type.
///
/// - empty → `None`
/// - integer fields: numeric conversion, `None` unless the result is a whole
///   number that fits in an `i64`
/// - boolean fields: booleans pass through, anything else is `true` only when
///   its string form is `true`, `1` or `yes` (any case)
/// - text fields: string form, trimmed, `None` when empty
pub fn coerce(raw: &CellValue, field_type: FieldType) -> Option<FieldValue> {
    if raw.is_empty() {
        return None;
    }

    match field_type {
        FieldType::Integer => to_integer(raw).map(FieldValue::Integer),
        FieldType::Boolean => Some(FieldValue::Boolean(to_boolean(raw))),
        FieldType::Text => to_text(raw).map(FieldValue::Text),
    }
}

/// Coerce a JSON value (used for schema defaults) to the declared type.
pub fn coerce_json(raw: &serde_json::Value, field_type: FieldType) -> Option<FieldValue> {
    let cell = match raw {
        serde_json::Value::Null => CellValue::Empty,
        serde_json::Value::Bool(b) => CellValue::Bool(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => CellValue::Int(i),
            None => CellValue::Float(n.as_f64()?),
        },
        serde_json::Value::String(s) => CellValue::Text(s.clone()),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => return None,
    };
    coerce(&cell, field_type)
}

fn to_integer(raw: &CellValue) -> Option<i64> {
    let number = match raw {
        CellValue::Int(i) => return Some(*i),
        CellValue::Bool(b) => return Some(i64::from(*b)),
        CellValue::Float(f) => *f,
        CellValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            if let Ok(i) = trimmed.parse::<i64>() {
                return Some(i);
            }
            trimmed.parse::<f64>().ok()?
        }
        CellValue::Empty => return None,
    };
    whole_number(number)
}

fn whole_number(n: f64) -> Option<i64> {
    if !n.is_finite() || n.fract() != 0.0 {
        return None;
    }
    // i64::MAX as f64 rounds up to 2^63, which is already out of range.
    if n < i64::MIN as f64 || n >= i64::MAX as f64 {
        return None;
    }
    Some(n as i64)
}

fn to_boolean(raw: &CellValue) -> bool {
    match raw {
        CellValue::Bool(b) => *b,
        other => {
            let lowered = display(other).to_lowercase();
            TRUTHY.contains(&lowered.as_str())
        }
    }
}

fn to_text(raw: &CellValue) -> Option<String> {
    let text = display(raw);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// String form of a cell. Whole floats print without a fractional part.
fn display(raw: &CellValue) -> String {
    match raw {
        CellValue::Empty => String::new(),
        CellValue::Text(s) => s.clone(),
        CellValue::Int(i) => i.to_string(),
        CellValue::Float(f) => f.to_string(),
        CellValue::Bool(b) => b.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
