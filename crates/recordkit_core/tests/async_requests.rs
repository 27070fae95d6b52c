mod support;

use recordkit_core::exec;
use recordkit_core::{
    AccessError, Domain, Envelope, Filter, ImportOptions, QueryDescriptor, Repository, SortKey,
    StoreError, SubmissionError,
};
use std::sync::mpsc;
use std::time::Duration;
use support::{article_list, main_context, Article};

#[tokio::test]
async fn read_all_async_matches_blocking_read() {
    let (_store, context) = main_context();
    let articles = Repository::<Article>::new();
    articles
        .import_list(&context, article_list(), "id", ImportOptions::default())
        .unwrap();
    let sort = vec![SortKey::descending("id")];

    let blocking = articles.read_all(&context, None, sort.clone()).unwrap();
    let envelope = articles.read_all_async(&context, None, sort).await;

    assert!(envelope.is_success());
    let asynchronous = envelope.success().unwrap();
    let blocking_ids: Vec<_> = blocking.iter().map(|record| record.id()).collect();
    let async_ids: Vec<_> = asynchronous.iter().map(|record| record.id()).collect();
    assert_eq!(async_ids, blocking_ids);
}

#[tokio::test]
async fn import_async_then_count_async() {
    let (_store, context) = main_context();
    let articles = Repository::<Article>::new();

    let imported = articles
        .import_list_async(&context, article_list(), "id", ImportOptions::default())
        .await
        .into_result()
        .unwrap();
    assert_eq!(imported.len(), 6);

    let count = articles.count_async(&context, None).await.into_result().unwrap();
    assert_eq!(count, 6);
}

#[tokio::test]
async fn contains_async_returns_matching_records() {
    let (_store, context) = main_context();
    let articles = Repository::<Article>::new();
    articles
        .import_list(&context, article_list(), "id", ImportOptions::default())
        .unwrap();

    let found = articles
        .read_all_by_attribute_contains_async(&context, "title", "ART", Vec::new())
        .await
        .into_result()
        .unwrap();
    assert_eq!(found.len(), 2);
}

#[tokio::test]
async fn delete_all_async_has_saved_when_resolved() {
    let (store, context) = main_context();
    let articles = Repository::<Article>::new();
    articles
        .import_list(&context, article_list(), "id", ImportOptions::default())
        .unwrap();

    let deleted = articles
        .delete_all_async(&context, Some(Filter::ge("id", 5)))
        .await
        .into_result()
        .unwrap();

    assert_eq!(deleted, 2);
    let sibling = store.new_context(Domain::Main);
    assert_eq!(articles.count(&sibling, None).unwrap(), 4);
}

#[tokio::test]
async fn execution_failure_arrives_as_failure_envelope() {
    let (_store, context) = main_context();
    let descriptor = QueryDescriptor::new("Comment");

    let envelope = exec::fetch_async(descriptor, &context).await;

    assert!(!envelope.is_success());
    assert!(matches!(
        envelope.failure(),
        Some(AccessError::Store(StoreError::UnknownEntity(_)))
    ));
}

#[tokio::test]
async fn failing_import_resolves_once_with_decode_error() {
    let (_store, context) = main_context();
    let mut raw = article_list();
    raw[3].remove("id");

    let envelope = Repository::<Article>::new()
        .import_list_async(&context, raw, "id", ImportOptions::default())
        .await;

    assert!(matches!(envelope, Envelope::Failure(AccessError::Decode(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn on_complete_delivers_exactly_one_envelope() {
    let (_store, context) = main_context();
    let articles = Repository::<Article>::new();
    articles
        .import_list(&context, article_list(), "id", ImportOptions::default())
        .unwrap();

    let (sender, receiver) = tokio::sync::oneshot::channel();
    articles.count_async(&context, None).on_complete(move |envelope| {
        let _ = sender.send(envelope);
    });

    let envelope = receiver.await.expect("completion should run");
    assert_eq!(envelope.into_result().unwrap(), 6);
}

#[tokio::test]
async fn independent_requests_all_resolve() {
    let (_store, context) = main_context();
    let articles = Repository::<Article>::new();
    articles
        .import_list(&context, article_list(), "id", ImportOptions::default())
        .unwrap();

    let first = articles.count_async(&context, Some(Filter::eq("author", "Ana")));
    let second = articles.count_async(&context, Some(Filter::eq("author", "Ben")));
    let third = articles.count_async(&context, Some(Filter::eq("author", "Zed")));

    let (first, second, third) = tokio::join!(first, second, third);
    assert_eq!(first.into_result().unwrap(), 2);
    assert_eq!(second.into_result().unwrap(), 2);
    assert_eq!(third.into_result().unwrap(), 0);
}

#[tokio::test]
async fn discarded_context_fails_at_submission() {
    let (_store, context) = main_context();
    context.discard();

    let envelope = Repository::<Article>::new()
        .read_all_async(&context, None, Vec::new())
        .await;

    assert!(matches!(
        envelope.failure(),
        Some(AccessError::Submission(SubmissionError::ContextDiscarded))
    ));
}

#[test]
fn submission_without_runtime_fails_immediately() {
    let (_store, context) = main_context();
    let (sender, receiver) = mpsc::channel();

    Repository::<Article>::new()
        .count_async(&context, None)
        .on_complete(move |envelope| {
            let _ = sender.send(envelope);
        });

    let envelope = receiver.try_recv().expect("completion should run inline");
    assert!(matches!(
        envelope,
        Envelope::Failure(AccessError::Submission(SubmissionError::NoRuntime))
    ));
}

#[test]
fn completion_reports_abandoned_when_runtime_shuts_down_first() {
    let (_store, context) = main_context();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime should build");
    let (sender, receiver) = mpsc::channel();

    {
        let _entered = runtime.enter();
        Repository::<Article>::new()
            .count_async(&context, None)
            .on_complete(move |envelope| {
                let _ = sender.send(envelope);
            });
    }
    drop(runtime);

    let envelope = receiver
        .recv_timeout(Duration::from_secs(5))
        .expect("completion should run exactly once");
    assert!(matches!(
        envelope,
        Envelope::Failure(AccessError::Submission(SubmissionError::Abandoned))
    ));
    assert!(receiver.try_recv().is_err());
}
