//! Record store: durable SQLite rows plus a tree of unit-of-work contexts.
//!
//! # Responsibility
//! - Own the single SQLite connection and the schema model.
//! - Hand out root contexts; contexts stage changes until saved.
//!
//! # Invariants
//! - Record ordinals are unique and increase with creation order.
//! - Only a root context save writes to SQLite, inside one transaction.
//! - A context never sees pending changes of its children or siblings.

use crate::config::StoreConfig;
use crate::db::{self, DbError};
use crate::model::schema::Model;
use parking_lot::Mutex;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

mod context;
mod durable;
mod scan;

pub use context::{Context, Domain};

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure reported by the record store.
#[derive(Debug)]
pub enum StoreError {
    /// SQLite or migration failure.
    Db(DbError),
    /// Entity kind not registered in the store model.
    UnknownEntity(String),
    /// Filter or sort key rejected at execution time.
    InvalidPredicate(String),
    /// Context (or one of its ancestors) was discarded.
    ContextDiscarded,
    /// Persisted row cannot be converted into a record.
    InvalidData(String),
    /// Record kind outside the entity subtree an operation targets.
    KindMismatch { expected: String, found: String },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UnknownEntity(kind) => write!(f, "unknown entity kind: {kind}"),
            Self::InvalidPredicate(message) => write!(f, "invalid predicate: {message}"),
            Self::ContextDiscarded => write!(f, "context has been discarded"),
            Self::InvalidData(message) => write!(f, "invalid persisted record data: {message}"),
            Self::KindMismatch { expected, found } => {
                write!(f, "record of kind `{found}` is not a `{expected}`")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::UnknownEntity(_) => None,
            Self::InvalidPredicate(_) => None,
            Self::ContextDiscarded => None,
            Self::InvalidData(_) => None,
            Self::KindMismatch { .. } => None,
        }
    }
}

impl StoreError {
    /// Stable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Db(_) => "db_error",
            Self::UnknownEntity(_) => "unknown_entity",
            Self::InvalidPredicate(_) => "invalid_predicate",
            Self::ContextDiscarded => "context_discarded",
            Self::InvalidData(_) => "invalid_data",
            Self::KindMismatch { .. } => "kind_mismatch",
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Handle to an open record store. Cloning shares the same store.
#[derive(Clone)]
pub struct Store {
    shared: Arc<StoreShared>,
}

pub(crate) struct StoreShared {
    conn: Mutex<Connection>,
    model: Model,
    config: StoreConfig,
    next_ordinal: AtomicI64,
}

impl Store {
    /// Opens the store described by `config` with the given schema model.
    pub fn open(config: StoreConfig, model: Model) -> StoreResult<Self> {
        let conn = db::open_with_config(&config)?;
        let max_ordinal = durable::max_ordinal(&conn)?;
        Ok(Self {
            shared: Arc::new(StoreShared {
                conn: Mutex::new(conn),
                model,
                config,
                next_ordinal: AtomicI64::new(max_ordinal + 1),
            }),
        })
    }

    /// Opens a private in-memory store.
    pub fn open_in_memory(model: Model) -> StoreResult<Self> {
        Self::open(StoreConfig::in_memory(), model)
    }

    pub fn model(&self) -> &Model {
        &self.shared.model
    }

    pub fn config(&self) -> &StoreConfig {
        &self.shared.config
    }

    /// Creates a new root context confined to `domain`.
    ///
    /// Root contexts over the same store are siblings: each sees durable
    /// rows plus its own pending changes.
    pub fn new_context(&self, domain: Domain) -> Context {
        Context::root(self.clone(), domain)
    }

    pub(crate) fn shared(&self) -> &StoreShared {
        &self.shared
    }

    pub(crate) fn next_ordinal(&self) -> i64 {
        self.shared.next_ordinal.fetch_add(1, Ordering::Relaxed)
    }
}
