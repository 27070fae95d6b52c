//! Generic data-access layer over a context-based record store.
//! Query construction, upsert/import and subset deletion live here; the
//! store underneath stages changes per context and persists to SQLite.

pub mod config;
pub mod db;
pub mod exec;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod store;

pub use config::{LogConfig, StoreConfig, StoreLocation};
pub use exec::{AccessError, AccessResult, Envelope, Request, SubmissionError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::decode::{DecodeError, RawFields};
pub use model::record::{Record, RecordId};
pub use model::schema::Model;
pub use model::value::Value;
pub use query::{CompareOp, Filter, QueryDescriptor, SortDirection, SortKey};
pub use repo::{Entity, ImportOptions, Repository, RetainSet};
pub use store::{Context, Domain, Store, StoreError, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
