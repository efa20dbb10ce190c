//! Integration tests for child models sharing a parent's index.

use serde_json::json;
use syncdex_client::CallKind;
use syncdex_core::{ChildOptions, Error, ModelOptions, SearchOptions, WrapperKind};

use crate::common::{SubArticle, TestHarness};

fn parent_options() -> ModelOptions {
    ModelOptions {
        wrapper: WrapperKind::Map,
        index_options: json!({"settings": {"number_of_shards": 1}}),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_child_mapping_declared_once() {
    let mut harness = TestHarness::new();
    harness.article_engine(parent_options(), Vec::new());
    let options = ChildOptions {
        mapping: json!({"properties": {"name": {"type": "string"}}}),
        ..Default::default()
    };
    harness
        .context
        .register_child("SubArticle", "Article", options.clone())
        .unwrap();
    harness
        .context
        .register_child("SubArticle", "Article", options)
        .unwrap();

    assert_eq!(harness.context.registry().all_indexes(), vec!["articles"]);
    assert_eq!(
        harness.context.registry().all_models(),
        vec!["Article", "SubArticle"]
    );

    let created = harness.context.create_all_indexes().await.unwrap();
    assert_eq!(created, vec!["articles"]);
    assert_eq!(harness.client.count(CallKind::CreateIndex), 1);

    let settings = harness.client.index_settings("articles").unwrap();
    assert_eq!(settings["settings"]["number_of_shards"], 1);
    assert_eq!(
        settings["mappings"]["sub_article"],
        json!({
            "properties": {"name": {"type": "string"}},
            "_parent": {"type": "article"}
        })
    );
}

#[tokio::test]
async fn test_child_delegates_to_parent() {
    let mut harness = TestHarness::new();
    harness.article_engine(parent_options(), Vec::new());
    let (engine, _) = harness.sub_article_engine(ChildOptions::default(), Vec::new());

    let registration = engine.registration();
    assert!(registration.is_child());
    assert_eq!(registration.index_name(), "articles");
    assert_eq!(registration.type_name(), "sub_article");
    assert_eq!(registration.parent_field(), Some("parent_id"));
    assert_eq!(registration.wrapper(), WrapperKind::Map);
    assert_eq!(registration.parent().unwrap().model(), "Article");
}

#[tokio::test]
async fn test_child_documents_route_to_parent() {
    let mut harness = TestHarness::new();
    harness.article_engine(parent_options(), Vec::new());
    let (engine, _) = harness.sub_article_engine(ChildOptions::default(), Vec::new());

    engine
        .index_one(&SubArticle::new(10, "Reply", Some(1)))
        .await
        .unwrap();
    assert_eq!(
        harness
            .client
            .document_parent("articles", "sub_article", "10")
            .as_deref(),
        Some("1")
    );

    let batch = vec![
        SubArticle::new(11, "Second", Some(1)),
        SubArticle::new(12, "Third", Some(2)),
    ];
    let response = engine.bulk_index(&batch).await.unwrap().unwrap();
    assert!(!response.has_errors());
    assert_eq!(
        harness
            .client
            .document_parent("articles", "sub_article", "12")
            .as_deref(),
        Some("2")
    );
}

#[tokio::test]
async fn test_child_without_parent_is_rejected() {
    let mut harness = TestHarness::new();
    harness.article_engine(parent_options(), Vec::new());
    let (engine, _) = harness.sub_article_engine(ChildOptions::default(), Vec::new());

    let orphan = SubArticle::new(10, "Orphan", None);
    let err = engine.index_one(&orphan).await.unwrap_err();
    assert!(matches!(err, Error::MissingParent { .. }));
    let err = engine.remove_one(&orphan).await.unwrap_err();
    assert!(matches!(err, Error::MissingParent { .. }));
    assert!(harness.client.calls().is_empty());
}

#[tokio::test]
async fn test_child_search_targets_child_type() {
    let mut harness = TestHarness::new();
    harness.article_engine(parent_options(), Vec::new());
    let (engine, _) = harness.sub_article_engine(ChildOptions::default(), Vec::new());

    let response = engine.search("reply", &SearchOptions::new()).unwrap();
    assert_eq!(response.request().index.as_deref(), Some("articles"));
    assert_eq!(response.request().doc_type.as_deref(), Some("sub_article"));
    assert_eq!(response.wrapper(), WrapperKind::Map);
}

#[test]
fn test_grandchildren_are_rejected() {
    let mut harness = TestHarness::new();
    harness
        .context
        .register_model("Article", ModelOptions::default())
        .unwrap();
    harness
        .context
        .register_child("SubArticle", "Article", ChildOptions::default())
        .unwrap();

    let err = harness
        .context
        .register_child("Reply", "SubArticle", ChildOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
    assert!(!harness.context.registry().has_model("Reply"));
}
