//! Explicit configuration values for the store and logging.
//!
//! # Responsibility
//! - Carry every tunable through named values with documented defaults.
//! - Keep defaults local to the caller; nothing here reads globals.
//!
//! # Invariants
//! - `Default` impls are the documented defaults; serde falls back to them
//!   for missing keys.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Busy timeout applied to every connection when not configured.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Durable rows read per page when a query sets no batch size.
pub const DEFAULT_SCAN_PAGE_SIZE: usize = 256;

/// Where the durable store keeps its rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreLocation {
    /// Private in-memory SQLite database, dropped with the store.
    #[default]
    InMemory,
    /// SQLite database file, created on first open.
    File(PathBuf),
}

/// Store open options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub location: StoreLocation,
    pub busy_timeout_ms: u64,
    /// Page size for durable scans; a descriptor's batch size overrides it.
    pub scan_page_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            location: StoreLocation::InMemory,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            scan_page_size: DEFAULT_SCAN_PAGE_SIZE,
        }
    }
}

impl StoreConfig {
    /// Config for a file-backed store with default tuning.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            location: StoreLocation::File(path.into()),
            ..Self::default()
        }
    }

    /// Config for an in-memory store with default tuning.
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub(crate) fn effective_page_size(&self, batch_size: Option<usize>) -> usize {
        batch_size
            .filter(|size| *size > 0)
            .unwrap_or(self.scan_page_size)
            .max(1)
    }
}

/// Logging options consumed by [`crate::logging::init_logging`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// One of `trace|debug|info|warn|error`.
    pub level: String,
    /// Absolute directory for rotating log files; `None` logs to stderr.
    pub directory: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: crate::logging::default_log_level().to_string(),
            directory: None,
        }
    }
}
