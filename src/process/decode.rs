// src/process/decode.rs

use indexmap::IndexMap;
use serde_json::value::RawValue;

use super::value::{Fields, Value};
use crate::error::DecodeError;

/// A decoded row: table name → that table's fields, in wire order.
pub type ResponseRow = IndexMap<String, Fields>;

/// Decode one wire row into a [`ResponseRow`].
///
/// Every top-level entry must itself be an object; a row that is not an object,
/// or that carries a scalar at the top level, is rejected as a whole.
pub fn decode_row(raw: &RawValue) -> Result<ResponseRow, DecodeError> {
    let text = raw.get();
    let parsed: serde_json::Value =
        serde_json::from_str(text).map_err(|source| DecodeError::Malformed {
            raw: text.to_string(),
            source,
        })?;

    let serde_json::Value::Object(entries) = parsed else {
        return Err(DecodeError::NotAnObject {
            raw: text.to_string(),
        });
    };

    let mut row = ResponseRow::with_capacity(entries.len());
    for (table, value) in entries {
        match Value::from(value) {
            Value::Map(fields) => {
                row.insert(table, fields);
            }
            _ => {
                return Err(DecodeError::NotATable {
                    table,
                    raw: text.to_string(),
                })
            }
        }
    }
    Ok(row)
}
