//! Bulk import of raw field-maps keyed by an identifying attribute.
//!
//! # Invariants
//! - One upsert per raw map, in input order; maps sharing an id resolve to
//!   the same record, and every returned entry for that id is its final
//!   state.
//! - The first failure stops processing; earlier records stay pending in
//!   the context and are not rolled back.
//! - Reconciling records absent from the input is left to the caller
//!   (compose with `delete_all_except`).

use super::{Entity, Repository};
use crate::exec::request;
use crate::exec::{AccessError, AccessResult, Request};
use crate::model::decode::{key_value, DecodeError, RawFields};
use crate::model::record::{Record, RecordId};
use crate::store::Context;
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;

/// Import behavior switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// Save the context once after every map was processed.
    pub should_save: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self { should_save: true }
    }
}

impl<E: Entity> Repository<E> {
    /// Upserts one record per raw map and returns them in input order.
    pub fn import_list<I>(
        &self,
        context: &Context,
        raw_list: I,
        id_key: &str,
        options: ImportOptions,
    ) -> AccessResult<Vec<Record>>
    where
        I: IntoIterator<Item = RawFields>,
    {
        let started_at = Instant::now();
        let mut records = Vec::new();

        for (index, raw) in raw_list.into_iter().enumerate() {
            match self.import_one(context, &raw, id_key) {
                Ok(record) => records.push(record),
                Err(err) => {
                    error!(
                        "event=import module=repo status=error entity={} index={} imported={} duration_ms={} error={}",
                        E::KIND,
                        index,
                        records.len(),
                        started_at.elapsed().as_millis(),
                        err
                    );
                    return Err(err);
                }
            }
        }

        refresh_repeated(&mut records);

        if options.should_save {
            context.save()?;
        }

        info!(
            "event=import module=repo status=ok entity={} imported={} saved={} duration_ms={}",
            E::KIND,
            records.len(),
            options.should_save,
            started_at.elapsed().as_millis()
        );
        Ok(records)
    }

    /// Imports a JSON array of objects.
    pub fn import_json(
        &self,
        context: &Context,
        raw: &serde_json::Value,
        id_key: &str,
        options: ImportOptions,
    ) -> AccessResult<Vec<Record>> {
        self.import_list(context, raw_list_from_json(raw)?, id_key, options)
    }

    /// Runs [`Repository::import_list`] on the blocking pool.
    pub fn import_list_async(
        &self,
        context: &Context,
        raw_list: Vec<RawFields>,
        id_key: impl Into<String>,
        options: ImportOptions,
    ) -> Request<Vec<Record>> {
        let repository = *self;
        let id_key = id_key.into();
        request::submit("import", context, move |context| {
            repository.import_list(&context, raw_list, &id_key, options)
        })
    }

    fn import_one(&self, context: &Context, raw: &RawFields, id_key: &str) -> AccessResult<Record> {
        let id = key_value(raw, id_key)?;
        let mut record = self.get_or_create(context, id_key, id)?;
        E::decode(raw, &mut record)?;
        context.update(&record)?;
        Ok(record)
    }
}

/// Replaces earlier snapshots of a repeated record with its last one.
fn refresh_repeated(records: &mut [Record]) {
    let mut last_index: HashMap<RecordId, usize> = HashMap::new();
    for (index, record) in records.iter().enumerate() {
        last_index.insert(record.id(), index);
    }
    for index in 0..records.len() {
        match last_index.get(&records[index].id()) {
            Some(&last) if last != index => records[index] = records[last].clone(),
            _ => {}
        }
    }
}

fn raw_list_from_json(raw: &serde_json::Value) -> Result<Vec<RawFields>, AccessError> {
    let items = raw
        .as_array()
        .ok_or_else(|| DecodeError::Invalid("expected a JSON array of objects".to_string()))?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            item.as_object().cloned().ok_or_else(|| {
                AccessError::Decode(DecodeError::Invalid(format!(
                    "element {index} is not a JSON object"
                )))
            })
        })
        .collect()
}
