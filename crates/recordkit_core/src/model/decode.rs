//! Raw field-map decoding onto records.
//!
//! Raw maps are JSON objects as received from callers; decoders map them
//! onto record fields.

use super::record::Record;
use super::value::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One raw field-map as received from a caller.
pub type RawFields = serde_json::Map<String, serde_json::Value>;

/// Failure while mapping a raw field-map onto a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The identifying key is absent from the raw map.
    MissingKey(String),
    /// The field holds a value with no scalar `Value` counterpart.
    UnsupportedValue { field: String },
    /// Entity-specific rejection.
    Invalid(String),
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingKey(key) => write!(f, "raw record is missing key `{key}`"),
            Self::UnsupportedValue { field } => {
                write!(f, "field `{field}` holds a nested value that cannot be stored")
            }
            Self::Invalid(message) => write!(f, "invalid raw record: {message}"),
        }
    }
}

impl Error for DecodeError {}

/// Reads `key` from `raw` as a scalar value.
pub fn key_value(raw: &RawFields, key: &str) -> Result<Value, DecodeError> {
    let value = raw
        .get(key)
        .ok_or_else(|| DecodeError::MissingKey(key.to_string()))?;
    match Value::from_json(value) {
        Some(Value::Null) => Err(DecodeError::MissingKey(key.to_string())),
        Some(value) => Ok(value),
        None => Err(DecodeError::UnsupportedValue {
            field: key.to_string(),
        }),
    }
}

/// Copies every scalar field of `raw` onto `record`.
///
/// Nested arrays and objects are rejected; the record is left unchanged
/// when any field fails.
pub fn copy_fields(raw: &RawFields, record: &mut Record) -> Result<(), DecodeError> {
    let mut decoded = Vec::with_capacity(raw.len());
    for (field, value) in raw {
        let value = Value::from_json(value).ok_or_else(|| DecodeError::UnsupportedValue {
            field: field.clone(),
        })?;
        decoded.push((field.clone(), value));
    }
    for (field, value) in decoded {
        record.set(field, value);
    }
    Ok(())
}
