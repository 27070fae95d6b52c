//! Find-or-create by attribute, plus direct creation.
//!
//! # Invariants
//! - Lookup runs against the target context, so pending creates made by an
//!   earlier call in the same context are found instead of duplicated.
//! - Created records carry `attribute = value` before they are staged.
//! - A null lookup value is rejected; it would match every record that
//!   lacks `attribute`.
//! - No cross-context locking: concurrent writers in other contexts may
//!   still create duplicates.

use super::{Entity, Repository};
use crate::exec;
use crate::model::record::Record;
use crate::model::value::Value;
use crate::query::builder;
use crate::store::{Context, StoreError, StoreResult};

impl<E: Entity> Repository<E> {
    /// Returns the record whose `attribute` equals `value`, creating it in
    /// `context` when no such record is visible.
    pub fn get_or_create(
        &self,
        context: &Context,
        attribute: &str,
        value: impl Into<Value>,
    ) -> StoreResult<Record> {
        let value = value.into();
        if value.is_null() {
            return Err(StoreError::InvalidPredicate(format!(
                "lookup value for `{attribute}` cannot be null"
            )));
        }
        let lookup = builder::first_by_attribute(E::KIND, attribute, value.clone());
        if let Some(existing) = exec::fetch_first(&lookup, context)? {
            return Ok(existing);
        }

        let mut record = context.create(E::KIND)?;
        record.set(attribute, value);
        context.update(&record)?;
        Ok(record)
    }

    /// Creates an empty record, saving `context` when `should_save`.
    pub fn create(&self, context: &Context, should_save: bool) -> StoreResult<Record> {
        let record = context.create(E::KIND)?;
        if should_save {
            context.save()?;
        }
        Ok(record)
    }

    /// Writes `record` back into `context` without saving.
    pub fn update(&self, context: &Context, record: &Record) -> StoreResult<()> {
        context.update(record)
    }

    /// Commits `context` one level up (to disk for a root context).
    pub fn save(&self, context: &Context) -> StoreResult<()> {
        context.save()
    }
}
