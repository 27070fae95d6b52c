//! Read paths: first match, all matching, containment, count.

use super::{Entity, Repository};
use crate::exec::{self, Request};
use crate::model::record::Record;
use crate::model::value::Value;
use crate::query::{builder, Filter, SortKey};
use crate::store::{Context, StoreResult};

impl<E: Entity> Repository<E> {
    /// First record matching `filter`, or the first record when `None`.
    pub fn read_first(&self, context: &Context, filter: Option<Filter>) -> StoreResult<Option<Record>> {
        exec::fetch_first(&builder::first_match(E::KIND, filter), context)
    }

    /// First record whose `attribute` equals `value`.
    pub fn read_first_by(
        &self,
        context: &Context,
        attribute: &str,
        value: impl Into<Value>,
    ) -> StoreResult<Option<Record>> {
        exec::fetch_first(
            &builder::first_by_attribute(E::KIND, attribute, value),
            context,
        )
    }

    pub fn read_all(
        &self,
        context: &Context,
        filter: Option<Filter>,
        sort: Vec<SortKey>,
    ) -> StoreResult<Vec<Record>> {
        exec::fetch(&builder::all_matching(E::KIND, filter, sort), context)
    }

    pub fn read_all_async(
        &self,
        context: &Context,
        filter: Option<Filter>,
        sort: Vec<SortKey>,
    ) -> Request<Vec<Record>> {
        exec::fetch_async(builder::all_matching(E::KIND, filter, sort), context)
    }

    /// Records whose text `attribute` contains `needle`, ignoring case and
    /// diacritics.
    pub fn read_all_by_attribute_contains(
        &self,
        context: &Context,
        attribute: &str,
        needle: &str,
        sort: Vec<SortKey>,
    ) -> StoreResult<Vec<Record>> {
        exec::fetch(
            &builder::attribute_contains(E::KIND, attribute, needle, sort),
            context,
        )
    }

    pub fn read_all_by_attribute_contains_async(
        &self,
        context: &Context,
        attribute: &str,
        needle: &str,
        sort: Vec<SortKey>,
    ) -> Request<Vec<Record>> {
        exec::fetch_async(
            builder::attribute_contains(E::KIND, attribute, needle, sort),
            context,
        )
    }

    /// Counts records of exactly this kind; sub-entities are not counted.
    pub fn count(&self, context: &Context, filter: Option<Filter>) -> StoreResult<usize> {
        exec::count(&builder::count(E::KIND, filter), context)
    }

    pub fn count_async(&self, context: &Context, filter: Option<Filter>) -> Request<usize> {
        exec::count_async(builder::count(E::KIND, filter), context)
    }
}
