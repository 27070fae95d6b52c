mod support;

use recordkit_core::{Domain, Filter, ImportOptions, Repository, RetainSet, StoreError, Value};
use support::{article_list, main_context, Article, Feature, Tag};

fn seeded() -> (recordkit_core::Store, recordkit_core::Context) {
    let (store, context) = main_context();
    Repository::<Article>::new()
        .import_list(&context, article_list(), "id", ImportOptions::default())
        .unwrap();
    (store, context)
}

#[test]
fn delete_one_removes_only_that_record() {
    let (store, context) = seeded();
    let articles = Repository::<Article>::new();
    let before = articles.read_all(&context, None, Vec::new()).unwrap();
    let victim = before[2].clone();

    articles.delete_one(&context, &victim).unwrap();

    let after = articles.read_all(&context, None, Vec::new()).unwrap();
    assert_eq!(after.len(), before.len() - 1);
    let expected: Vec<_> = before
        .iter()
        .filter(|record| record.id() != victim.id())
        .map(|record| record.id())
        .collect();
    let remaining: Vec<_> = after.iter().map(|record| record.id()).collect();
    assert_eq!(remaining, expected);

    let sibling = store.new_context(Domain::Main);
    assert!(sibling.get(victim.id()).unwrap().is_none());
    assert!(!context.has_changes());
}

#[test]
fn delete_all_empties_the_kind_with_one_save() {
    let (store, context) = seeded();
    let articles = Repository::<Article>::new();
    let tags = Repository::<Tag>::new();
    tags.get_or_create(&context, "name", "keep").unwrap();
    context.save().unwrap();

    let deleted = articles.delete_all(&context, None).unwrap();

    assert_eq!(deleted, 6);
    assert_eq!(articles.count(&context, None).unwrap(), 0);
    assert_eq!(tags.count(&context, None).unwrap(), 1);
    let sibling = store.new_context(Domain::Main);
    assert_eq!(articles.count(&sibling, None).unwrap(), 0);
}

#[test]
fn delete_all_with_filter_keeps_non_matching_records() {
    let (_store, context) = seeded();
    let articles = Repository::<Article>::new();

    let deleted = articles
        .delete_all(&context, Some(Filter::eq("author", "Ben")))
        .unwrap();

    assert_eq!(deleted, 2);
    assert_eq!(articles.count(&context, None).unwrap(), 4);
    assert!(articles
        .read_first(&context, Some(Filter::eq("author", "Ben")))
        .unwrap()
        .is_none());
}

#[test]
fn delete_all_on_empty_kind_is_a_noop() {
    let (_store, context) = main_context();
    assert_eq!(Repository::<Tag>::new().delete_all(&context, None).unwrap(), 0);
    assert!(!context.has_changes());
}

#[test]
fn delete_all_includes_subentities() {
    let (_store, context) = seeded();
    let features = Repository::<Feature>::new();
    features.get_or_create(&context, "id", 100).unwrap();
    context.save().unwrap();

    let deleted = Repository::<Article>::new().delete_all(&context, None).unwrap();

    assert_eq!(deleted, 7);
    assert_eq!(features.count(&context, None).unwrap(), 0);
}

#[test]
fn delete_all_except_retains_by_identity_not_by_value() {
    let (_store, context) = main_context();
    let articles = Repository::<Article>::new();
    let mut twins = Vec::new();
    for _ in 0..3 {
        let mut record = articles.create(&context, false).unwrap();
        record.set("title", "duplicate");
        context.update(&record).unwrap();
        twins.push(record);
    }
    context.save().unwrap();

    let retain: RetainSet = twins[..2].iter().collect();
    let deleted = articles.delete_all_except(&context, &retain).unwrap();

    assert_eq!(deleted, 1);
    let remaining: Vec<_> = articles
        .read_all(&context, None, Vec::new())
        .unwrap()
        .iter()
        .map(|record| record.id())
        .collect();
    assert_eq!(remaining, vec![twins[0].id(), twins[1].id()]);
}

#[test]
fn delete_all_except_with_empty_retain_set_deletes_everything() {
    let (_store, context) = seeded();
    let articles = Repository::<Article>::new();

    let deleted = articles
        .delete_all_except(&context, &RetainSet::new())
        .unwrap();

    assert_eq!(deleted, 6);
    assert_eq!(articles.count(&context, None).unwrap(), 0);
}

#[test]
fn import_then_delete_all_except_reconciles_to_input() {
    let (_store, context) = seeded();
    let articles = Repository::<Article>::new();

    let subset: Vec<_> = article_list()
        .into_iter()
        .filter(|raw| raw["author"] == "Ana")
        .collect();
    let kept = articles
        .import_list(&context, subset, "id", ImportOptions::default())
        .unwrap();
    let retain = RetainSet::from(kept.as_slice());
    let deleted = articles.delete_all_except(&context, &retain).unwrap();

    assert_eq!(deleted, 4);
    let ids: Vec<Value> = articles
        .read_all(&context, None, Vec::new())
        .unwrap()
        .iter()
        .map(|record| record.value("id").clone())
        .collect();
    assert_eq!(ids, vec![Value::Integer(1), Value::Integer(3)]);
}

#[test]
fn deleting_a_record_twice_is_harmless() {
    let (_store, context) = seeded();
    let articles = Repository::<Article>::new();
    let record = articles.read_first_by(&context, "id", 4).unwrap().unwrap();

    articles.delete_one(&context, &record).unwrap();
    articles.delete_one(&context, &record).unwrap();

    assert_eq!(articles.count(&context, None).unwrap(), 5);
}

#[test]
fn delete_one_of_never_saved_record_leaves_durable_rows_alone() {
    let (store, context) = seeded();
    let articles = Repository::<Article>::new();
    let draft = store.new_context(Domain::Main);
    let orphan = articles.create(&draft, false).unwrap();
    draft.discard();

    articles.delete_one(&context, &orphan).unwrap();

    assert_eq!(articles.count(&context, None).unwrap(), 6);
    assert!(!context.has_changes());
}

#[test]
fn delete_one_accepts_subentities_but_rejects_other_kinds() {
    let (_store, context) = seeded();
    let articles = Repository::<Article>::new();
    let feature = Repository::<Feature>::new()
        .get_or_create(&context, "id", 100)
        .unwrap();
    let tag = Repository::<Tag>::new()
        .get_or_create(&context, "name", "keep")
        .unwrap();
    context.save().unwrap();

    articles.delete_one(&context, &feature).unwrap();
    assert!(context.get(feature.id()).unwrap().is_none());

    let err = articles.delete_one(&context, &tag).unwrap_err();
    assert!(matches!(
        err,
        StoreError::KindMismatch { expected, found } if expected == "Article" && found == "Tag"
    ));
    assert!(context.get(tag.id()).unwrap().is_some());

    let err = Repository::<Feature>::new()
        .delete_one(&context, &articles.read_first(&context, None).unwrap().unwrap())
        .unwrap_err();
    assert!(matches!(err, StoreError::KindMismatch { .. }));
}
