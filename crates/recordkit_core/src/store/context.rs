//! Unit-of-work contexts.
//!
//! # Responsibility
//! - Stage creates, updates and deletes per context.
//! - Propagate staged changes one level up on save.
//!
//! # Invariants
//! - Reads see own changes first, then each ancestor's, then durable rows.
//! - Saving moves exactly this context's staged changes; nothing else is
//!   re-read or revalidated.
//! - A child lock may be held while taking its parent's lock, never the
//!   reverse.
//! - Confinement to `Domain` is recorded, not enforced.

use super::durable::{self, WriteSummary};
use super::{scan, Store, StoreError, StoreResult};
use crate::model::record::{Record, RecordId};
use crate::query::QueryDescriptor;
use log::{debug, error, info};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Execution domain a context is confined to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    Main,
    Background,
}

impl Display for Domain {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Main => write!(f, "main"),
            Self::Background => write!(f, "background"),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Change {
    Upsert(Record),
    Delete,
}

/// Staged changes of one context keyed by record identity.
#[derive(Debug, Clone, Default)]
pub(crate) struct ChangeSet {
    changes: HashMap<RecordId, Change>,
}

impl ChangeSet {
    pub(crate) fn stage_upsert(&mut self, record: Record) {
        self.changes.insert(record.id(), Change::Upsert(record));
    }

    pub(crate) fn stage_delete(&mut self, id: RecordId) {
        self.changes.insert(id, Change::Delete);
    }

    /// Applies `newer` on top of this change-set; `newer` wins per id.
    pub(crate) fn absorb(&mut self, newer: ChangeSet) {
        self.changes.extend(newer.changes);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&RecordId, &Change)> {
        self.changes.iter()
    }

    fn summary(&self) -> WriteSummary {
        self.changes
            .values()
            .fold(WriteSummary::default(), |mut summary, change| {
                match change {
                    Change::Upsert(_) => summary.upserted += 1,
                    Change::Delete => summary.deleted += 1,
                }
                summary
            })
    }
}

/// Handle to a unit-of-work scope. Clones share the same context.
#[derive(Clone)]
pub struct Context {
    node: Arc<ContextNode>,
}

struct ContextNode {
    id: u64,
    store: Store,
    parent: Option<Context>,
    domain: Domain,
    pending: Mutex<ChangeSet>,
    discarded: AtomicBool,
}

impl Context {
    pub(crate) fn root(store: Store, domain: Domain) -> Self {
        Self::with_parent(store, None, domain)
    }

    fn with_parent(store: Store, parent: Option<Context>, domain: Domain) -> Self {
        Self {
            node: Arc::new(ContextNode {
                id: NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed),
                store,
                parent,
                domain,
                pending: Mutex::new(ChangeSet::default()),
                discarded: AtomicBool::new(false),
            }),
        }
    }

    /// Opens a child context that reads through this one.
    pub fn begin_child(&self, domain: Domain) -> StoreResult<Context> {
        self.ensure_live()?;
        Ok(Self::with_parent(
            self.node.store.clone(),
            Some(self.clone()),
            domain,
        ))
    }

    pub fn domain(&self) -> Domain {
        self.node.domain
    }

    pub fn parent(&self) -> Option<&Context> {
        self.node.parent.as_ref()
    }

    pub fn store(&self) -> &Store {
        &self.node.store
    }

    /// Whether this context or any ancestor was discarded.
    pub fn is_discarded(&self) -> bool {
        self.ensure_live().is_err()
    }

    /// Whether this context holds unsaved changes.
    pub fn has_changes(&self) -> bool {
        !self.node.pending.lock().is_empty()
    }

    /// Stages a new, field-less record of `kind` in this context.
    pub fn create(&self, kind: &str) -> StoreResult<Record> {
        self.ensure_live()?;
        self.ensure_known(kind)?;
        let record = Record::new(kind, self.node.store.next_ordinal());
        self.node.pending.lock().stage_upsert(record.clone());
        Ok(record)
    }

    /// Stages the fields of `record` in this context.
    ///
    /// A record fetched from another context is faulted into this one.
    pub fn update(&self, record: &Record) -> StoreResult<()> {
        self.ensure_live()?;
        self.ensure_known(record.kind())?;
        self.node.pending.lock().stage_upsert(record.clone());
        Ok(())
    }

    /// Marks `record` for deletion in this context.
    pub fn delete(&self, record: &Record) -> StoreResult<()> {
        self.ensure_live()?;
        self.node.pending.lock().stage_delete(record.id());
        Ok(())
    }

    /// Re-fetches a record by identity as seen from this context.
    pub fn get(&self, id: RecordId) -> StoreResult<Option<Record>> {
        self.ensure_live()?;
        match self.overlay().remove(&id) {
            Some(Change::Upsert(record)) => Ok(Some(record)),
            Some(Change::Delete) => Ok(None),
            None => {
                let conn = self.node.store.shared().conn.lock();
                durable::load_by_id(&conn, id)
            }
        }
    }

    /// Executes `descriptor` and returns matching records in result order.
    pub fn fetch(&self, descriptor: &QueryDescriptor) -> StoreResult<Vec<Record>> {
        self.ensure_live()?;
        scan::fetch(self, descriptor)
    }

    /// Counts records matching `descriptor`; limit and sort are ignored.
    pub fn count(&self, descriptor: &QueryDescriptor) -> StoreResult<usize> {
        self.ensure_live()?;
        scan::count(self, descriptor)
    }

    /// Commits staged changes to the parent, or to disk for a root context.
    ///
    /// On failure the staged changes stay in this context.
    pub fn save(&self) -> StoreResult<()> {
        self.ensure_live()?;
        let started_at = Instant::now();
        let mut pending = self.node.pending.lock();
        if pending.is_empty() {
            return Ok(());
        }

        let summary = match &self.node.parent {
            Some(parent) => {
                let summary = pending.summary();
                let changes = std::mem::take(&mut *pending);
                parent.node.pending.lock().absorb(changes);
                summary
            }
            None => {
                let mut conn = self.node.store.shared().conn.lock();
                match durable::write_changes(&mut conn, &pending) {
                    Ok(summary) => {
                        *pending = ChangeSet::default();
                        summary
                    }
                    Err(err) => {
                        self.log_save_error(&err, started_at);
                        return Err(err);
                    }
                }
            }
        };

        info!(
            "event=context_save module=store status=ok context={} domain={} target={} upserted={} deleted={} duration_ms={}",
            self.node.id,
            self.node.domain,
            self.save_target(),
            summary.upserted,
            summary.deleted,
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    /// Drops staged changes; every later use of this context fails.
    pub fn discard(&self) {
        let mut pending = self.node.pending.lock();
        let dropped = pending.summary();
        *pending = ChangeSet::default();
        self.node.discarded.store(true, Ordering::Release);
        debug!(
            "event=context_discard module=store status=ok context={} domain={} dropped_upserts={} dropped_deletes={}",
            self.node.id, self.node.domain, dropped.upserted, dropped.deleted
        );
    }

    pub(crate) fn ensure_live(&self) -> StoreResult<()> {
        let mut cursor = Some(self);
        while let Some(context) = cursor {
            if context.node.discarded.load(Ordering::Acquire) {
                return Err(StoreError::ContextDiscarded);
            }
            cursor = context.parent();
        }
        Ok(())
    }

    /// Merged staged changes visible from this context, nearest first.
    pub(crate) fn overlay(&self) -> HashMap<RecordId, Change> {
        let mut merged = HashMap::new();
        let mut cursor = Some(self);
        while let Some(context) = cursor {
            let pending = context.node.pending.lock();
            for (id, change) in pending.iter() {
                merged.entry(*id).or_insert_with(|| change.clone());
            }
            drop(pending);
            cursor = context.parent();
        }
        merged
    }

    pub(crate) fn log_id(&self) -> u64 {
        self.node.id
    }

    fn ensure_known(&self, kind: &str) -> StoreResult<()> {
        if self.node.store.model().contains(kind) {
            Ok(())
        } else {
            Err(StoreError::UnknownEntity(kind.to_string()))
        }
    }

    fn save_target(&self) -> &'static str {
        if self.node.parent.is_some() {
            "parent"
        } else {
            "disk"
        }
    }

    fn log_save_error(&self, err: &StoreError, started_at: Instant) {
        error!(
            "event=context_save module=store status=error context={} domain={} target={} duration_ms={} error_code={} error={}",
            self.node.id,
            self.node.domain,
            self.save_target(),
            started_at.elapsed().as_millis(),
            err.code(),
            err
        );
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.node.id)
            .field("domain", &self.node.domain)
            .field("has_parent", &self.node.parent.is_some())
            .finish()
    }
}
