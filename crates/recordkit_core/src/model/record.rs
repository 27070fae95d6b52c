//! Record snapshots.
//!
//! # Invariants
//! - `id` is assigned once at creation and never reused.
//! - `ordinal` is store-assigned at creation and defines default result order.
//! - `kind` is fixed for the lifetime of the record.

use super::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Store identity of a record.
pub type RecordId = Uuid;

/// Field map of a record, ordered by field name.
pub type Fields = BTreeMap<String, Value>;

/// Owned snapshot of a record as seen by one context.
///
/// Changes made through [`Record::set`] stay local until the snapshot is
/// handed back with `Context::update`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    id: RecordId,
    kind: String,
    ordinal: i64,
    fields: Fields,
}

impl Record {
    pub(crate) fn new(kind: impl Into<String>, ordinal: i64) -> Self {
        Self::from_parts(Uuid::new_v4(), kind.into(), ordinal, Fields::new())
    }

    pub(crate) fn from_parts(id: RecordId, kind: String, ordinal: i64, fields: Fields) -> Self {
        Self {
            id,
            kind,
            ordinal,
            fields,
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Entity kind name this record belongs to.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub(crate) fn ordinal(&self) -> i64 {
        self.ordinal
    }

    /// Returns the field value, or `None` when the field was never set.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Field value with unset fields read as `Value::Null`.
    pub fn value(&self, field: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.fields.get(field).unwrap_or(&NULL)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }
}
