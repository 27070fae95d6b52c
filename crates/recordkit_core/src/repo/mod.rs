//! Type-generic data access per entity kind.
//!
//! # Responsibility
//! - Expose read, upsert, import and delete use-cases for one entity kind.
//! - Turn each use-case into an ordered sequence of store operations.
//!
//! # Invariants
//! - Every operation takes its context explicitly; there is no default.
//! - Absence of a match is `Ok(None)` or an empty `Vec`, never an error.
//! - Deleting operations save their context exactly once before returning.

pub mod delete;
pub mod import;
pub mod read;
pub mod upsert;

pub use delete::RetainSet;
pub use import::ImportOptions;

use crate::model::decode::{copy_fields, DecodeError, RawFields};
use crate::model::record::Record;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;

/// An entity kind registered in the store model.
pub trait Entity: 'static {
    /// Kind name as registered in the store `Model`.
    const KIND: &'static str;

    /// Maps a raw field-map onto `record` during import.
    ///
    /// The default copies every scalar field verbatim.
    fn decode(raw: &RawFields, record: &mut Record) -> Result<(), DecodeError> {
        copy_fields(raw, record)
    }
}

/// Data-access entry points for records of kind `E`.
pub struct Repository<E: Entity> {
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Repository<E> {
    pub fn new() -> Self {
        Self {
            _entity: PhantomData,
        }
    }

    /// Entity kind name this repository reads and writes.
    pub fn kind(&self) -> &'static str {
        E::KIND
    }
}

impl<E: Entity> Default for Repository<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> Clone for Repository<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E: Entity> Copy for Repository<E> {}

impl<E: Entity> Debug for Repository<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository").field("kind", &E::KIND).finish()
    }
}
