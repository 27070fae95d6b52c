//! Query construction.
//!
//! # Responsibility
//! - Describe filters as structured, typed expressions.
//! - Build immutable query descriptors for each read shape.
//!
//! # Invariants
//! - Building never fails; invalid field names surface when a query runs.
//! - Filters carry values as typed `Value`s and are never rendered to text.

pub mod builder;
pub mod descriptor;
pub mod filter;

pub use descriptor::{QueryDescriptor, SortDirection, SortKey};
pub use filter::{CompareOp, Filter};
