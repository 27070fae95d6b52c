//! Delete paths: one record, all records, all records except a retain-set.
//!
//! # Invariants
//! - Each operation saves its context exactly once, after every mark.
//! - Exclusion is by record identity, never by field values.

use super::{Entity, Repository};
use crate::exec::request;
use crate::exec::{self, Request};
use crate::model::record::{Record, RecordId};
use crate::query::{builder, Filter};
use crate::store::{Context, StoreError, StoreResult};
use log::info;
use std::collections::HashSet;

/// Identities preserved by [`Repository::delete_all_except`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetainSet {
    ids: HashSet<RecordId>,
}

impl RetainSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: &Record) -> bool {
        self.ids.insert(record.id())
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<RecordId> for RetainSet {
    fn from_iter<I: IntoIterator<Item = RecordId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

impl<'a> FromIterator<&'a Record> for RetainSet {
    fn from_iter<I: IntoIterator<Item = &'a Record>>(iter: I) -> Self {
        iter.into_iter().map(Record::id).collect()
    }
}

impl From<&[Record]> for RetainSet {
    fn from(records: &[Record]) -> Self {
        records.iter().collect()
    }
}

impl<E: Entity> Repository<E> {
    /// Marks `record` for deletion, then saves `context`.
    ///
    /// `record` must be of this kind or one of its sub-entities. A record
    /// that was never persisted is dropped without touching disk.
    pub fn delete_one(&self, context: &Context, record: &Record) -> StoreResult<()> {
        let kinds = context
            .store()
            .model()
            .resolve_kinds(E::KIND, true)
            .ok_or_else(|| StoreError::UnknownEntity(E::KIND.to_string()))?;
        if !kinds.iter().any(|kind| kind == record.kind()) {
            return Err(StoreError::KindMismatch {
                expected: E::KIND.to_string(),
                found: record.kind().to_string(),
            });
        }

        context.delete(record)?;
        context.save()?;
        info!(
            "event=delete module=repo status=ok entity={} mode=one",
            E::KIND
        );
        Ok(())
    }

    /// Deletes every record matching `filter` (all when `None`) with a
    /// single save. Returns the number of records marked.
    pub fn delete_all(&self, context: &Context, filter: Option<Filter>) -> StoreResult<usize> {
        let records = exec::fetch(&builder::all_matching(E::KIND, filter, Vec::new()), context)?;
        mark_and_save::<E>(context, &records, "all")
    }

    /// Runs [`Repository::delete_all`] on the blocking pool; the save has
    /// completed when the request resolves.
    pub fn delete_all_async(&self, context: &Context, filter: Option<Filter>) -> Request<usize> {
        let repository = *self;
        request::submit("delete_all", context, move |context| {
            repository.delete_all(&context, filter).map_err(Into::into)
        })
    }

    /// Deletes every record of the kind whose identity is not in `retain`,
    /// with a single save. Returns the number of records marked.
    pub fn delete_all_except(&self, context: &Context, retain: &RetainSet) -> StoreResult<usize> {
        let records = exec::fetch(&builder::all_matching(E::KIND, None, Vec::new()), context)?;
        let doomed: Vec<Record> = records
            .into_iter()
            .filter(|record| !retain.contains(record.id()))
            .collect();
        mark_and_save::<E>(context, &doomed, "except")
    }
}

fn mark_and_save<E: Entity>(context: &Context, records: &[Record], mode: &str) -> StoreResult<usize> {
    for record in records {
        context.delete(record)?;
    }
    context.save()?;
    info!(
        "event=delete module=repo status=ok entity={} mode={} deleted={}",
        E::KIND,
        mode,
        records.len()
    );
    Ok(records.len())
}
