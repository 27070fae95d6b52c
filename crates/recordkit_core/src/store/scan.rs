//! Query execution over staged changes merged with durable rows.
//!
//! Staged records and durable pages are merged in ordinal order and
//! filtered lazily, so an unsorted limited query stops reading durable
//! pages as soon as the limit is reached.
//!
//! A descriptor's batch size counts results, not scanned rows: it sizes
//! durable pages only for unfiltered reads, where every row is a result.

use super::context::{Change, Context};
use super::durable;
use super::{StoreError, StoreResult, StoreShared};
use crate::config::StoreConfig;
use crate::model::record::{Record, RecordId};
use crate::query::{QueryDescriptor, SortDirection, SortKey};
use log::{debug, error};
use std::cmp::Ordering;
use std::collections::{HashSet, VecDeque};
use std::iter::Peekable;
use std::time::Instant;

pub(super) fn fetch(context: &Context, descriptor: &QueryDescriptor) -> StoreResult<Vec<Record>> {
    let started_at = Instant::now();
    let result = run_fetch(context, descriptor);
    log_outcome("fetch", context, descriptor, started_at, result.as_ref().map(Vec::len));
    result
}

pub(super) fn count(context: &Context, descriptor: &QueryDescriptor) -> StoreResult<usize> {
    let started_at = Instant::now();
    let result = run_count(context, descriptor);
    log_outcome("count", context, descriptor, started_at, result.as_ref().copied());
    result
}

fn run_fetch(context: &Context, descriptor: &QueryDescriptor) -> StoreResult<Vec<Record>> {
    let rows = matching_rows(context, descriptor)?;

    if descriptor.sort.is_empty() {
        return match descriptor.limit {
            Some(limit) => rows.take(limit).collect(),
            None => rows.collect(),
        };
    }

    let mut records = rows.collect::<StoreResult<Vec<_>>>()?;
    sort_records(&mut records, &descriptor.sort);
    if let Some(limit) = descriptor.limit {
        records.truncate(limit);
    }
    Ok(records)
}

fn run_count(context: &Context, descriptor: &QueryDescriptor) -> StoreResult<usize> {
    matching_rows(context, descriptor)?.try_fold(0, |total, row| row.map(|_| total + 1))
}

fn matching_rows<'a>(
    context: &'a Context,
    descriptor: &'a QueryDescriptor,
) -> StoreResult<impl Iterator<Item = StoreResult<Record>> + 'a> {
    descriptor.validate().map_err(StoreError::InvalidPredicate)?;

    let store = context.store();
    let kinds = store
        .model()
        .resolve_kinds(&descriptor.entity, descriptor.include_subentities)
        .ok_or_else(|| StoreError::UnknownEntity(descriptor.entity.clone()))?;

    let overlay = context.overlay();
    let shadowed: HashSet<RecordId> = overlay.keys().copied().collect();
    let mut staged: Vec<Record> = overlay
        .into_values()
        .filter_map(|change| match change {
            Change::Upsert(record) if kinds.iter().any(|kind| kind == record.kind()) => {
                Some(record)
            }
            _ => None,
        })
        .collect();
    staged.sort_by_key(Record::ordinal);

    let durable = DurableCursor {
        shared: store.shared(),
        kinds,
        shadowed,
        after_ordinal: 0,
        page_size: durable_page_size(store.config(), descriptor),
        buffer: VecDeque::new(),
        exhausted: false,
    };

    let merged = MergedRows {
        staged: staged.into_iter().peekable(),
        durable: durable.peekable(),
    };

    Ok(merged.filter(move |row| match (row, &descriptor.filter) {
        (Ok(record), Some(filter)) => filter.matches(record),
        _ => true,
    }))
}

fn durable_page_size(config: &StoreConfig, descriptor: &QueryDescriptor) -> usize {
    match descriptor.filter {
        Some(_) => config.effective_page_size(None),
        None => config.effective_page_size(descriptor.batch_size),
    }
}

/// Stable sort by keys in order; ties keep creation order.
fn sort_records(records: &mut [Record], keys: &[SortKey]) {
    records.sort_by(|left, right| {
        keys.iter()
            .map(|key| {
                let ordering = left.value(&key.field).sort_cmp(right.value(&key.field));
                match key.direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            })
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
}

/// Pages durable rows of the requested kinds in ordinal order.
struct DurableCursor<'a> {
    shared: &'a StoreShared,
    kinds: Vec<String>,
    shadowed: HashSet<RecordId>,
    after_ordinal: i64,
    page_size: usize,
    buffer: VecDeque<Record>,
    exhausted: bool,
}

impl DurableCursor<'_> {
    fn load_next_page(&mut self) -> StoreResult<()> {
        #[cfg(test)]
        tests::PAGES_LOADED.with(|pages| pages.set(pages.get() + 1));
        let page = {
            let conn = self.shared.conn.lock();
            durable::load_page(&conn, &self.kinds, self.after_ordinal, self.page_size)?
        };
        if page.len() < self.page_size {
            self.exhausted = true;
        }
        if let Some(last) = page.last() {
            self.after_ordinal = last.ordinal();
        }
        let shadowed = &self.shadowed;
        self.buffer
            .extend(page.into_iter().filter(|record| !shadowed.contains(&record.id())));
        Ok(())
    }
}

impl Iterator for DurableCursor<'_> {
    type Item = StoreResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.buffer.is_empty() && !self.exhausted {
            if let Err(err) = self.load_next_page() {
                self.exhausted = true;
                return Some(Err(err));
            }
        }
        self.buffer.pop_front().map(Ok)
    }
}

struct MergedRows<'a> {
    staged: Peekable<std::vec::IntoIter<Record>>,
    durable: Peekable<DurableCursor<'a>>,
}

impl Iterator for MergedRows<'_> {
    type Item = StoreResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let take_staged = match (self.staged.peek(), self.durable.peek()) {
            (None, None) => return None,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (Some(staged), Some(Ok(durable))) => staged.ordinal() < durable.ordinal(),
            (Some(_), Some(Err(_))) => false,
        };

        if take_staged {
            self.staged.next().map(Ok)
        } else {
            self.durable.next()
        }
    }
}

fn log_outcome(
    event: &str,
    context: &Context,
    descriptor: &QueryDescriptor,
    started_at: Instant,
    outcome: Result<usize, &StoreError>,
) {
    match outcome {
        Ok(rows) => debug!(
            "event={event} module=store status=ok context={} entity={} rows={} limit={} duration_ms={}",
            context.log_id(),
            descriptor.entity,
            rows,
            descriptor.limit.map_or_else(|| "none".to_string(), |limit| limit.to_string()),
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event={event} module=store status=error context={} entity={} duration_ms={} error_code={} error={}",
            context.log_id(),
            descriptor.entity,
            started_at.elapsed().as_millis(),
            err.code(),
            err
        ),
    }
}
