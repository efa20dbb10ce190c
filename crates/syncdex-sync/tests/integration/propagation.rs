//! Integration tests for single-record propagation and mutation hooks.

use syncdex_client::{CallKind, DeleteOutcome};
use syncdex_core::{Error, ModelOptions};
use syncdex_sync::{HookOutcome, LifecycleHooks, MutationHooks};

use crate::common::{Article, TestHarness};

#[tokio::test]
async fn test_unindexable_record_never_reaches_engine() {
    let mut harness = TestHarness::new();
    let (engine, _) = harness.article_engine(ModelOptions::default(), Vec::new());

    let draft = Article::new(1, "Draft").unpublished();
    assert!(engine.index_one(&draft).await.unwrap().is_none());
    assert!(engine.bulk_index(&[draft]).await.unwrap().is_none());
    assert!(harness.client.calls().is_empty());
}

#[tokio::test]
async fn test_index_one_sends_public_fields() {
    let mut harness = TestHarness::new();
    let (engine, _) = harness.article_engine(ModelOptions::default(), Vec::new());

    engine
        .index_one(&Article::new(7, "Hello world"))
        .await
        .unwrap()
        .unwrap();

    let stored = harness.client.document("articles", "article", "7").unwrap();
    assert_eq!(stored["name"], "Hello world");
    assert!(!stored.contains_key("_id"));
    assert!(!stored.contains_key("created_at"));
    assert!(!stored.contains_key("updated_at"));
}

#[tokio::test]
async fn test_remove_missing_document_succeeds() {
    let mut harness = TestHarness::new();
    let (engine, _) = harness.article_engine(ModelOptions::default(), Vec::new());

    let outcome = engine.remove_one(&Article::new(5, "Never indexed")).await.unwrap();
    assert_eq!(outcome, DeleteOutcome::NotFound);
}

#[tokio::test]
async fn test_remove_propagates_other_failures() {
    let mut harness = TestHarness::new();
    harness.client.fail_nth(CallKind::DeleteDocument, 1, 503);
    let (engine, _) = harness.article_engine(ModelOptions::default(), Vec::new());

    let err = engine.remove_one(&Article::new(5, "x")).await.unwrap_err();
    assert!(matches!(err, Error::Engine { status: 503, .. }));
}

#[tokio::test]
async fn test_hooks_follow_record_lifecycle() {
    let mut harness = TestHarness::new();
    let (engine, store) = harness.article_engine(ModelOptions::default(), Vec::new());
    let hooks = MutationHooks::new(engine);
    assert!(hooks.is_enabled());

    let mut article = Article::new(1, "First draft");
    store.insert(article.clone());
    assert_eq!(hooks.after_save(&article).await.unwrap(), HookOutcome::Indexed);

    article.name = "Second draft".into();
    store.insert(article.clone());
    hooks.after_save(&article).await.unwrap();
    assert_eq!(harness.client.document_count("articles"), 1);
    assert_eq!(
        harness.client.document("articles", "article", "1").unwrap()["name"],
        "Second draft"
    );

    // Unpublishing removes the document but keeps the record.
    let hidden = article.clone().unpublished();
    store.insert(hidden.clone());
    assert_eq!(
        hooks.after_save(&hidden).await.unwrap(),
        HookOutcome::Removed(DeleteOutcome::Deleted)
    );
    assert_eq!(harness.client.document_count("articles"), 0);

    // Destroying twice is harmless.
    let gone = store.remove("1").unwrap().destroyed();
    assert_eq!(
        hooks.after_destroy(&gone).await.unwrap(),
        HookOutcome::Removed(DeleteOutcome::NotFound)
    );
    assert_eq!(
        hooks.after_destroy(&gone).await.unwrap(),
        HookOutcome::Removed(DeleteOutcome::NotFound)
    );
}

#[tokio::test]
async fn test_tombstoned_save_removes() {
    let mut harness = TestHarness::new();
    let (engine, _) = harness.article_engine(ModelOptions::default(), Vec::new());
    let hooks = MutationHooks::new(engine.clone());

    engine.index_one(&Article::new(3, "Soon gone")).await.unwrap();
    let outcome = hooks
        .after_save(&Article::new(3, "Soon gone").destroyed())
        .await
        .unwrap();
    assert_eq!(outcome, HookOutcome::Removed(DeleteOutcome::Deleted));
}

#[tokio::test]
async fn test_hooks_disabled_by_registration() {
    let mut harness = TestHarness::new();
    let options = ModelOptions {
        callbacks: false,
        ..Default::default()
    };
    let (engine, _) = harness.article_engine(options, Vec::new());
    let hooks = MutationHooks::new(engine);

    assert!(!hooks.is_enabled());
    assert_eq!(
        hooks.after_save(&Article::new(1, "x")).await.unwrap(),
        HookOutcome::Disabled
    );
    assert!(harness.client.calls().is_empty());
}
