mod support;

use recordkit_core::{
    Filter, ImportOptions, QueryDescriptor, Repository, SortKey, StoreError, Value,
};
use support::{article_list, main_context, Article, Feature, Tag};

#[test]
fn count_after_import_equals_number_of_distinct_ids() {
    let (_store, context) = main_context();
    let articles = Repository::<Article>::new();

    assert_eq!(articles.count(&context, None).unwrap(), 0);
    articles
        .import_list(&context, article_list(), "id", ImportOptions::default())
        .unwrap();
    assert_eq!(articles.count(&context, None).unwrap(), 6);
}

#[test]
fn read_first_by_id_returns_matching_record() {
    let (_store, context) = main_context();
    let articles = Repository::<Article>::new();
    articles
        .import_list(&context, article_list(), "id", ImportOptions::default())
        .unwrap();

    for id in 1..=6 {
        let article = articles.read_first_by(&context, "id", id).unwrap().unwrap();
        assert_eq!(article.get("id"), Some(&Value::Integer(id)));
    }
    assert!(articles.read_first_by(&context, "id", 7).unwrap().is_none());
}

#[test]
fn read_first_with_filter_and_without() {
    let (_store, context) = main_context();
    let articles = Repository::<Article>::new();
    articles
        .import_list(&context, article_list(), "id", ImportOptions::default())
        .unwrap();

    let first = articles.read_first(&context, None).unwrap().unwrap();
    assert_eq!(first.get("id"), Some(&Value::Integer(1)));

    let by_author = articles
        .read_first(&context, Some(Filter::eq("author", "Ben")))
        .unwrap()
        .unwrap();
    assert_eq!(by_author.get("title"), Some(&Value::from("Sailing basics")));
}

#[test]
fn typed_lookup_does_not_match_textual_form() {
    let (_store, context) = main_context();
    let articles = Repository::<Article>::new();
    articles
        .import_list(&context, article_list(), "id", ImportOptions::default())
        .unwrap();

    assert!(articles.read_first_by(&context, "id", "3").unwrap().is_none());
    assert!(articles.read_first_by(&context, "id", 3).unwrap().is_some());
}

#[test]
fn attribute_contains_matches_case_insensitively() {
    let (_store, context) = main_context();
    let articles = Repository::<Article>::new();
    articles
        .import_list(&context, article_list(), "id", ImportOptions::default())
        .unwrap();

    let matches = articles
        .read_all_by_attribute_contains(&context, "title", "Art", Vec::new())
        .unwrap();
    let ids: Vec<&Value> = matches.iter().map(|record| record.value("id")).collect();
    assert_eq!(ids, vec![&Value::Integer(1), &Value::Integer(3)]);
}

#[test]
fn read_all_defaults_to_creation_order_and_honors_sort_keys() {
    let (_store, context) = main_context();
    let articles = Repository::<Article>::new();
    articles
        .import_list(&context, article_list(), "id", ImportOptions::default())
        .unwrap();

    let unsorted = articles.read_all(&context, None, Vec::new()).unwrap();
    let ids: Vec<i64> = unsorted
        .iter()
        .map(|record| record.value("id").as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);

    let sorted = articles
        .read_all(
            &context,
            None,
            vec![SortKey::ascending("author"), SortKey::descending("id")],
        )
        .unwrap();
    let ids: Vec<i64> = sorted
        .iter()
        .map(|record| record.value("id").as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![3, 1, 6, 2, 4, 5]);
}

#[test]
fn read_all_with_range_filter() {
    let (_store, context) = main_context();
    let articles = Repository::<Article>::new();
    articles
        .import_list(&context, article_list(), "id", ImportOptions::default())
        .unwrap();

    let early = articles
        .read_all(&context, Some(Filter::lt("id", 3)), Vec::new())
        .unwrap();
    assert_eq!(early.len(), 2);
}

#[test]
fn limit_one_with_sort_returns_best_match() {
    let (_store, context) = main_context();
    let articles = Repository::<Article>::new();
    articles
        .import_list(&context, article_list(), "id", ImportOptions::default())
        .unwrap();

    let descriptor = recordkit_core::query::builder::first_match("Article", None)
        .with_sort(vec![SortKey::descending("id")]);
    let newest = context.fetch(&descriptor).unwrap();
    assert_eq!(newest.len(), 1);
    assert_eq!(newest[0].get("id"), Some(&Value::Integer(6)));
}

#[test]
fn invalid_field_name_surfaces_at_execution() {
    let (_store, context) = main_context();
    let articles = Repository::<Article>::new();

    let err = articles
        .read_first_by(&context, "id == 1 OR TRUEPREDICATE", 1)
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidPredicate(_)));

    let err = articles.read_first_by(&context, "", 1).unwrap_err();
    assert!(matches!(err, StoreError::InvalidPredicate(_)));
}

#[test]
fn unknown_entity_is_a_store_error() {
    let (_store, context) = main_context();
    let err = context.fetch(&QueryDescriptor::new("Comment")).unwrap_err();
    assert!(matches!(err, StoreError::UnknownEntity(kind) if kind == "Comment"));
}

#[test]
fn count_excludes_subentities_while_fetch_includes_them() {
    let (_store, context) = main_context();
    let articles = Repository::<Article>::new();
    let features = Repository::<Feature>::new();

    articles.get_or_create(&context, "id", 1).unwrap();
    features.get_or_create(&context, "id", 2).unwrap();
    context.save().unwrap();

    assert_eq!(articles.count(&context, None).unwrap(), 1);
    assert_eq!(features.count(&context, None).unwrap(), 1);
    assert_eq!(articles.read_all(&context, None, Vec::new()).unwrap().len(), 2);
    assert_eq!(
        context
            .count(&recordkit_core::query::builder::count("Article", None).including_subentities(true))
            .unwrap(),
        2
    );
}

#[test]
fn kinds_are_isolated_from_each_other() {
    let (_store, context) = main_context();
    Repository::<Article>::new()
        .import_list(&context, article_list(), "id", ImportOptions::default())
        .unwrap();
    assert_eq!(Repository::<Tag>::new().count(&context, None).unwrap(), 0);
}

#[test]
fn small_batch_size_pages_through_durable_rows() {
    let (_store, context) = main_context();
    Repository::<Article>::new()
        .import_list(&context, article_list(), "id", ImportOptions::default())
        .unwrap();

    let descriptor = QueryDescriptor::new("Article")
        .with_batch_size(Some(2))
        .with_filter(Some(Filter::ge("id", 4)));
    let records = context.fetch(&descriptor).unwrap();
    assert_eq!(records.len(), 3);
}
