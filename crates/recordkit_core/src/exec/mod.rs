//! Query execution in blocking and non-blocking shapes.
//!
//! # Responsibility
//! - Run descriptors directly against a context (blocking, fail fast).
//! - Submit descriptors as requests resolving to an `Envelope`.
//!
//! # Invariants
//! - No retry and no ordering across independently submitted requests.
//! - Callers needing order chain requests by awaiting each one.

pub mod envelope;
pub mod request;

pub use envelope::{AccessError, AccessResult, Envelope, SubmissionError};
pub use request::Request;

use crate::model::record::Record;
use crate::query::QueryDescriptor;
use crate::store::{Context, StoreResult};

/// Blocking fetch of every record matching `descriptor`.
pub fn fetch(descriptor: &QueryDescriptor, context: &Context) -> StoreResult<Vec<Record>> {
    context.fetch(descriptor)
}

/// Blocking fetch of the first match, if any.
pub fn fetch_first(descriptor: &QueryDescriptor, context: &Context) -> StoreResult<Option<Record>> {
    Ok(context.fetch(descriptor)?.into_iter().next())
}

/// Non-blocking fetch resolving to the same records as [`fetch`].
pub fn fetch_async(descriptor: QueryDescriptor, context: &Context) -> Request<Vec<Record>> {
    request::submit("fetch", context, move |context| {
        context.fetch(&descriptor).map_err(Into::into)
    })
}

/// Blocking count of records matching `descriptor`.
pub fn count(descriptor: &QueryDescriptor, context: &Context) -> StoreResult<usize> {
    context.count(descriptor)
}

/// Non-blocking count.
pub fn count_async(descriptor: QueryDescriptor, context: &Context) -> Request<usize> {
    request::submit("count", context, move |context| {
        context.count(&descriptor).map_err(Into::into)
    })
}
