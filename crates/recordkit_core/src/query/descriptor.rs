//! Immutable query descriptors.

use super::filter::{validate_field_name, Filter};

/// Sort direction of one [`SortKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// One sort key; keys apply in sequence order, earlier keys first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }
}

/// Read request for one entity kind.
///
/// Built by `query::builder`; the `with_*` methods return a new descriptor
/// rather than mutating in place.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDescriptor {
    pub(crate) entity: String,
    pub(crate) filter: Option<Filter>,
    pub(crate) sort: Vec<SortKey>,
    pub(crate) limit: Option<usize>,
    pub(crate) batch_size: Option<usize>,
    pub(crate) materialize: bool,
    pub(crate) include_subentities: bool,
}

impl QueryDescriptor {
    /// Unfiltered, unsorted, unlimited read of `entity` and its sub-entities.
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            filter: None,
            sort: Vec::new(),
            limit: None,
            batch_size: None,
            materialize: false,
            include_subentities: true,
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    pub fn sort(&self) -> &[SortKey] {
        &self.sort
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn batch_size(&self) -> Option<usize> {
        self.batch_size
    }

    /// Whether results must be fully materialized rather than faulted lazily.
    pub fn materialize(&self) -> bool {
        self.materialize
    }

    pub fn include_subentities(&self) -> bool {
        self.include_subentities
    }

    pub fn with_filter(mut self, filter: Option<Filter>) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_sort(mut self, sort: Vec<SortKey>) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_batch_size(mut self, batch_size: Option<usize>) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_materialize(mut self, materialize: bool) -> Self {
        self.materialize = materialize;
        self
    }

    pub fn including_subentities(mut self, include: bool) -> Self {
        self.include_subentities = include;
        self
    }

    /// Checks filter and sort field names; called by the store before a scan.
    pub(crate) fn validate(&self) -> Result<(), String> {
        if let Some(filter) = &self.filter {
            filter.validate()?;
        }
        self.sort
            .iter()
            .try_for_each(|key| validate_field_name(&key.field))
    }
}
