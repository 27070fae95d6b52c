//! Record model shared by the store and the data-access layer.
//!
//! # Responsibility
//! - Define the record snapshot handed to callers and its typed field values.
//! - Describe the entity kinds a store accepts, and their sub-entity links.
//!
//! # Invariants
//! - Every record is identified by a stable `RecordId`, never by its values.
//! - Field values compare by type; there is no textual coercion.

pub mod decode;
pub mod record;
pub mod schema;
pub mod value;
