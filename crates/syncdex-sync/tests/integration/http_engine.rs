//! Integration tests running the sync engine over HTTP against a mock
//! search server.

use std::sync::Arc;

use serde_json::json;
use syncdex_core::{ClientConfig, GlobalConfig, ModelOptions, SearchOptions};
use syncdex_sync::{MemoryStore, SearchContext};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{Article, articles};

fn context_for(server: &MockServer) -> SearchContext {
    let config = GlobalConfig {
        client: ClientConfig::with_url(server.uri()),
        ..Default::default()
    };
    let mut context = SearchContext::new(config);
    context
        .register_model("Article", ModelOptions::default())
        .unwrap();
    context
}

#[tokio::test]
async fn test_bootstrap_and_propagate() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/articles"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/articles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"acknowledged": true})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/articles/article/1"))
        .and(body_json(json!({
            "id": "1",
            "name": "Hello world",
            "tags": [],
            "published": true
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"_id": "1", "created": true})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/articles/article/1"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"found": false})))
        .expect(1)
        .mount(&server)
        .await;

    let context = context_for(&server);
    assert_eq!(context.ensure_indexes().await.unwrap(), vec!["articles"]);

    let engine = context
        .engine::<Article>("Article", Arc::new(MemoryStore::new()))
        .unwrap();
    let result = engine
        .index_one(&Article::new(1, "Hello world"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(result["created"], true);

    // Already gone on the server: still a success.
    engine
        .remove_one(&Article::new(1, "Hello world"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_reindex_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/articles"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/articles"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/articles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"acknowledged": true})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/_bulk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "took": 3,
            "errors": false,
            "items": [{"index": {"status": 201}}, {"index": {"status": 201}}]
        })))
        .expect(2)
        .mount(&server)
        .await;

    let context = context_for(&server);
    let engine = context
        .engine::<Article>("Article", Arc::new(MemoryStore::from_records(articles(3))))
        .unwrap();

    let stats = engine.reindex_all(2).await.unwrap();
    assert_eq!(stats.batches, 2);
    assert_eq!(stats.records, 3);
    assert_eq!(stats.failed_items, 0);

    let bulk_bodies: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path() == "/_bulk")
        .map(|r| String::from_utf8(r.body).unwrap())
        .collect();
    assert_eq!(bulk_bodies.len(), 2);
    // Two records per batch: an action line and a source line each.
    assert_eq!(bulk_bodies[0].lines().count(), 4);
    assert_eq!(bulk_bodies[1].lines().count(), 2);
}

#[tokio::test]
async fn test_model_and_global_search_over_http() {
    let server = MockServer::start().await;
    let hits = json!({
        "took": 4,
        "hits": {
            "total": 1,
            "max_score": 0.5,
            "hits": [{
                "_index": "articles",
                "_type": "article",
                "_id": "1",
                "_score": 0.5,
                "_source": {"name": "Hello world", "tags": [], "published": true}
            }]
        }
    });
    Mock::given(method("POST"))
        .and(path("/articles/article/_search"))
        .and(query_param("q", "hello world"))
        .and(query_param("size", "10"))
        .and(query_param("from", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hits.clone()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/articles/_search"))
        .and(query_param("q", "hello world"))
        .and(query_param("ignore_unavailable", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hits))
        .expect(1)
        .mount(&server)
        .await;

    let context = context_for(&server);
    let engine = context
        .engine::<Article>("Article", Arc::new(MemoryStore::new()))
        .unwrap();

    let response = engine
        .search("Hello, world!", &SearchOptions::new().page(1).per_page(10))
        .unwrap();
    let found = response.records().await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, "1");
    assert_eq!(found[0].name, "Hello world");
    assert_eq!(response.total().await.unwrap(), 1);

    let global = context
        .search::<Article>("Hello, world!", &SearchOptions::new())
        .unwrap();
    assert_eq!(global.records().await.unwrap(), found);
}
