//! Integration tests for full reindexing.

use syncdex_client::CallKind;
use syncdex_core::{Error, Indexable, ModelOptions};
use syncdex_sync::ReindexStats;

use crate::common::{Article, TestHarness, articles};

#[tokio::test]
async fn test_exact_multiple_ends_with_empty_batch() {
    let mut harness = TestHarness::new();
    let (engine, store) = harness.article_engine(ModelOptions::default(), articles(4));

    let mut seen = Vec::new();
    let stats = engine
        .reindex_all_with(2, |total, step, batch| {
            seen.push((total, step, batch.iter().map(|a| a.id()).collect::<Vec<_>>()))
        })
        .await
        .unwrap();

    assert_eq!(
        seen,
        vec![
            (3, 0, vec!["1".to_string(), "2".to_string()]),
            (3, 1, vec!["3".to_string(), "4".to_string()]),
            (3, 2, vec![]),
        ]
    );
    assert_eq!(
        stats,
        ReindexStats {
            batches: 3,
            records: 4,
            failed_items: 0
        }
    );
    // The empty batch makes no bulk call.
    assert_eq!(harness.client.count(CallKind::Bulk), 2);
    // An empty page keeps the previous cursor.
    assert_eq!(
        store.cursors(),
        vec![None, Some("2".to_string()), Some("4".to_string())]
    );
}

#[tokio::test]
async fn test_empty_store_runs_one_batch() {
    let mut harness = TestHarness::new();
    let (engine, _) = harness.article_engine(ModelOptions::default(), Vec::new());

    let mut calls = 0;
    let stats = engine
        .reindex_all_with(100, |total, step, batch| {
            assert_eq!((total, step, batch.len()), (1, 0, 0));
            calls += 1;
        })
        .await
        .unwrap();

    assert_eq!(calls, 1);
    assert_eq!(stats.batches, 1);
    assert!(harness.client.has_index("articles"));
    assert_eq!(harness.client.count(CallKind::Bulk), 0);
}

#[tokio::test]
async fn test_cursor_strictly_increases() {
    let mut harness = TestHarness::new();
    let (engine, store) = harness.article_engine(ModelOptions::default(), articles(12));

    engine.reindex_all(5).await.unwrap();

    let cursors: Vec<u64> = store
        .cursors()
        .into_iter()
        .flatten()
        .map(|c| c.parse().unwrap())
        .collect();
    // Numeric ids order numerically, so "10" follows "5".
    assert_eq!(cursors, vec![5, 10]);
    assert!(cursors.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(harness.client.document_count("articles"), 12);
}

#[tokio::test]
async fn test_reset_drops_stale_documents() {
    let mut harness = TestHarness::new();
    let (engine, _) = harness.article_engine(ModelOptions::default(), articles(3));

    // Indexed earlier, since removed from the primary store.
    engine.index_one(&Article::new(99, "Gone")).await.unwrap();
    assert_eq!(harness.client.document_count("articles"), 1);

    engine.reindex_all(10).await.unwrap();
    assert_eq!(harness.client.document_ids("articles"), vec!["1", "2", "3"]);
}

#[tokio::test]
async fn test_unindexable_records_are_skipped() {
    let mut harness = TestHarness::new();
    let mut records = articles(4);
    records[1] = records[1].clone().unpublished();
    records[3] = records[3].clone().unpublished();
    let (engine, _) = harness.article_engine(ModelOptions::default(), records);

    let stats = engine.reindex_all(10).await.unwrap();
    assert_eq!(stats.records, 4);
    assert_eq!(harness.client.document_ids("articles"), vec!["1", "3"]);
}

#[tokio::test]
async fn test_rejected_items_are_counted() {
    let mut harness = TestHarness::new();
    harness.client.reject_document("2");
    let (engine, _) = harness.article_engine(ModelOptions::default(), articles(3));

    let stats = engine.reindex_all(10).await.unwrap();
    assert_eq!(stats.failed_items, 1);
    assert_eq!(harness.client.document_ids("articles"), vec!["1", "3"]);
}

#[tokio::test]
async fn test_failed_batch_stops_the_loop() {
    let mut harness = TestHarness::new();
    harness.client.fail_nth(CallKind::Bulk, 2, 500);
    let (engine, _) = harness.article_engine(ModelOptions::default(), articles(6));

    let mut batches = 0;
    let err = engine
        .reindex_all_with(2, |_, _, _| batches += 1)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Engine { status: 500, .. }));
    assert_eq!(batches, 1);
    assert_eq!(harness.client.count(CallKind::Bulk), 2);
    assert_eq!(harness.client.document_count("articles"), 2);
}
