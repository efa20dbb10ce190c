//! Integration tests for file-based configuration.

use std::io::Write;

use syncdex_client::CallKind;
use syncdex_core::{ClientConfig, Error, GlobalConfig, ModelOptions};
use tempfile::NamedTempFile;

use crate::common::TestHarness;

const CONFIG: &str = r#"
prefix = "test_"
autocreate_indexes = true

[client]
url = "http://search.internal:9200"
timeout_secs = 5

[client.headers]
X-Tenant = "acme"
"#;

fn config_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn test_loaded_config_drives_registration() {
    let file = config_file(CONFIG);
    let config = GlobalConfig::load(file.path()).unwrap();
    assert_eq!(config.prefix, "test_");

    let mut harness = TestHarness::with_config(config);
    let options = ModelOptions {
        client: ClientConfig {
            timeout_secs: Some(30),
            ..Default::default()
        },
        ..Default::default()
    };
    let (engine, _) = harness.article_engine(options, Vec::new());

    let registration = engine.registration();
    assert_eq!(registration.index_name(), "test_articles");

    let client = registration.cached_client();
    assert!(!client.is_connected());
    assert_eq!(
        client.config().url.as_deref(),
        Some("http://search.internal:9200")
    );
    assert_eq!(client.config().timeout_secs, Some(30));
    assert_eq!(client.config().headers["X-Tenant"], "acme");

    let created = harness.context.ensure_indexes().await.unwrap();
    assert_eq!(created, vec!["test_articles"]);
    assert!(harness.client.has_index("test_articles"));
    assert!(client.is_connected());
}

#[tokio::test]
async fn test_autocreate_off_skips_bootstrap() {
    let file = config_file("autocreate_indexes = false\n");
    let config = GlobalConfig::load(file.path()).unwrap();

    let mut harness = TestHarness::with_config(config);
    harness.article_engine(ModelOptions::default(), Vec::new());

    assert!(harness.context.ensure_indexes().await.unwrap().is_empty());
    assert_eq!(harness.client.count(CallKind::CreateIndex), 0);
}

#[test]
fn test_invalid_config_file() {
    let file = config_file("prefix = [1, 2\n");
    let err = GlobalConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
}

#[test]
fn test_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(GlobalConfig::load(&dir.path().join("absent.toml")).is_err());
}
