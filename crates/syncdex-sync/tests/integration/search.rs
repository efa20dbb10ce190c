//! Integration tests for per-model and cross-model search.

use serde_json::json;
use syncdex_core::{Document, ModelOptions, SearchOptions, WrapperKind};
use syncdex_sync::WrappedHit;

use crate::common::{Article, TestHarness, articles};

fn ids(records: &[Article]) -> Vec<&str> {
    records.iter().map(|a| a.id.as_str()).collect()
}

#[tokio::test]
async fn test_pagination_translates_to_window() {
    let mut harness = TestHarness::new();
    let (engine, _) = harness.article_engine(ModelOptions::default(), Vec::new());

    let first = engine
        .search("x", &SearchOptions::new().page(1).per_page(10))
        .unwrap();
    assert_eq!((first.request().size, first.request().from), (Some(10), Some(0)));

    let third = engine
        .search("x", &SearchOptions::new().page(3).per_page(10))
        .unwrap();
    assert_eq!((third.request().size, third.request().from), (Some(10), Some(20)));

    let unpaged = engine.search("x", &SearchOptions::new()).unwrap();
    assert_eq!((unpaged.request().size, unpaged.request().from), (None, None));

    let aliased = SearchOptions {
        page: Some(2),
        per: Some(5),
        ..Default::default()
    };
    let aliased = engine.search("x", &aliased).unwrap();
    assert_eq!((aliased.request().size, aliased.request().from), (Some(5), Some(5)));
}

#[tokio::test]
async fn test_model_and_global_search_normalize_alike() {
    let mut harness = TestHarness::new();
    let (engine, _) = harness.article_engine(ModelOptions::default(), Vec::new());

    let per_model = engine.search("hello, world!", &SearchOptions::new()).unwrap();
    let global = harness
        .context
        .search::<Article>("hello, world!", &SearchOptions::new())
        .unwrap();

    assert_eq!(per_model.request().q.as_deref(), Some("hello world"));
    assert_eq!(per_model.request().q, global.request().q);
}

#[tokio::test]
async fn test_search_returns_typed_records() {
    let mut harness = TestHarness::new();
    let records = vec![
        Article::new(1, "Hello world"),
        Article::new(2, "Goodbye world"),
        Article::new(3, "Hello there"),
    ];
    let (engine, _) = harness.article_engine(ModelOptions::default(), records);
    engine.reindex_all(10).await.unwrap();

    let response = engine.search("hello", &SearchOptions::new()).unwrap();
    assert!(!response.is_fetched());
    assert_eq!(response.total().await.unwrap(), 2);
    assert!(response.is_fetched());

    let found = response.records().await.unwrap();
    assert_eq!(ids(&found), vec!["1", "3"]);
    assert_eq!(found[0].name, "Hello world");

    let hits = response.hits().await.unwrap();
    let WrappedHit::Typed(hit) = &hits[1] else {
        unreachable!("Expected a typed hit");
    };
    assert_eq!(hit.id, "3");
    assert_eq!(hit.doc_type, "article");
    assert!(hit.persisted);
}

#[tokio::test]
async fn test_page_accessors() {
    let mut harness = TestHarness::new();
    let (engine, _) = harness.article_engine(ModelOptions::default(), articles(25));
    engine.reindex_all(10).await.unwrap();

    let response = engine
        .search("article", &SearchOptions::new().page(3).per_page(10))
        .unwrap();
    assert_eq!(response.total().await.unwrap(), 25);
    assert_eq!(response.records().await.unwrap().len(), 5);
    assert_eq!(response.total_pages().await.unwrap(), 3);
    assert_eq!(response.offset(), 20);
    assert!(!response.is_first_page());
    assert!(response.is_last_page().await.unwrap());
    assert_eq!(response.next_page().await.unwrap(), None);
    assert_eq!(response.prev_page(), Some(2));

    let first = engine
        .search("article", &SearchOptions::new().page(1).per_page(10))
        .unwrap();
    assert_eq!(first.next_page().await.unwrap(), Some(2));
    assert_eq!(first.prev_page(), None);
}

#[tokio::test]
async fn test_reload_keeps_ranking() {
    let mut harness = TestHarness::new();
    let options = ModelOptions {
        wrapper: WrapperKind::Reload,
        ..Default::default()
    };
    let (engine, store) = harness.article_engine(options, articles(3));
    harness.client.push_search_response(json!({
        "took": 2,
        "hits": {
            "total": 3,
            "max_score": 3.0,
            "hits": [
                {"_id": "3", "_type": "article", "_score": 3.0, "_source": {}},
                {"_id": "1", "_type": "article", "_score": 2.0, "_source": {}},
                {"_id": "2", "_type": "article", "_score": 1.0, "_source": {}}
            ]
        }
    }));

    let response = engine.search("anything", &SearchOptions::new()).unwrap();
    let found = response.records().await.unwrap();
    assert_eq!(ids(&found), vec!["3", "1", "2"]);
    assert_eq!(found[0].name, "Article 3");
    assert_eq!(store.lookups(), vec![vec!["3", "1", "2"]]);
    assert_eq!(response.max_score().await.unwrap(), Some(3.0));
    assert_eq!(response.took().await.unwrap(), Some(2));
}

#[tokio::test]
async fn test_map_wrapper_exposes_fields() {
    let mut harness = TestHarness::new();
    let mut tagged = Article::new(1, "Tagged");
    tagged.tags = vec!["rust".into(), "search".into()];
    let (engine, _) = harness.article_engine(ModelOptions::default(), vec![tagged]);
    engine.reindex_all(10).await.unwrap();

    let response = engine
        .search("tagged", &SearchOptions::new().wrapper(WrapperKind::Map))
        .unwrap();
    let hits = response.hits().await.unwrap();
    let WrappedHit::Map(hit) = &hits[0] else {
        unreachable!("Expected a map hit");
    };
    assert_eq!(hit["name"], "Tagged");
    assert_eq!(hit["tags"], json!(["rust", "search"]));
    assert_eq!(hit["id"], "1");
    assert!(hit["missing"].is_null());
}

#[tokio::test]
async fn test_global_search_spans_registered_indexes() {
    let mut harness = TestHarness::new();
    let (engine, _) = harness.article_engine(ModelOptions::default(), Vec::new());
    // Registered but never created: the search must tolerate it.
    harness
        .context
        .register_model("Comment", ModelOptions::default())
        .unwrap();
    engine
        .index_one(&Article::new(1, "Shared words"))
        .await
        .unwrap();

    let response = harness
        .context
        .search::<Document>(
            "shared",
            &SearchOptions::new().wrapper(WrapperKind::Map),
        )
        .unwrap();
    assert_eq!(response.request().index.as_deref(), Some("articles,comments"));
    assert!(response.request().ignore_unavailable);

    let hits = response.hits().await.unwrap();
    assert_eq!(hits.len(), 1);
    let WrappedHit::Map(hit) = &hits[0] else {
        unreachable!("Expected a map hit");
    };
    assert_eq!(hit.index, "articles");
    assert_eq!(hit["name"], "Shared words");
}
