//! Descriptor builders for the read shapes of the data-access layer.
//!
//! Pure functions: no validation and no store access happens here.

use super::descriptor::{QueryDescriptor, SortKey};
use super::filter::Filter;
use crate::model::value::Value;

/// First record matching `filter`, or the first record of the kind.
///
/// Always `limit = 1`, `batch_size = 1`, fully materialized.
pub fn first_match(entity: &str, filter: Option<Filter>) -> QueryDescriptor {
    QueryDescriptor::new(entity)
        .with_filter(filter)
        .with_limit(Some(1))
        .with_batch_size(Some(1))
        .with_materialize(true)
}

/// First record whose `attribute` equals `value`.
pub fn first_by_attribute(
    entity: &str,
    attribute: &str,
    value: impl Into<Value>,
) -> QueryDescriptor {
    first_match(entity, Some(Filter::eq(attribute, value)))
}

/// Every record matching `filter`, ordered by `sort` then creation order.
pub fn all_matching(entity: &str, filter: Option<Filter>, sort: Vec<SortKey>) -> QueryDescriptor {
    QueryDescriptor::new(entity)
        .with_filter(filter)
        .with_sort(sort)
}

/// Every record whose text `attribute` contains `needle`.
pub fn attribute_contains(
    entity: &str,
    attribute: &str,
    needle: &str,
    sort: Vec<SortKey>,
) -> QueryDescriptor {
    all_matching(entity, Some(Filter::contains(attribute, needle)), sort)
}

/// Count of records of exactly `entity`, excluding sub-entities.
pub fn count(entity: &str, filter: Option<Filter>) -> QueryDescriptor {
    QueryDescriptor::new(entity)
        .with_filter(filter)
        .including_subentities(false)
}
