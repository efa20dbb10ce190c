//! HTTP implementation of [`SearchClient`].
//!
//! Speaks the engine's REST API with `reqwest`:
//!
//! | Primitive | Request |
//! |-----------|---------|
//! | info | `GET /` |
//! | index document | `PUT /{index}/{type}/{id}?parent=` |
//! | delete document | `DELETE /{index}/{type}/{id}?parent=` |
//! | bulk | `POST /_bulk` (NDJSON) |
//! | search | `POST /{index}[/{type}]/_search?q=&size=&from=` |
//! | suggest | `POST /{index}/_suggest` |
//! | create / delete / exists index | `PUT` / `DELETE` / `HEAD /{index}` |

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde_json::Value;
use syncdex_core::{ClientConfig, Document, Error, Result, SearchRequest};
use tokio::sync::OnceCell;

use crate::client::{BulkOperation, BulkResponse, DeleteOutcome, Routing, SearchClient};
use crate::version::EngineVersion;

/// Search engine client over HTTP.
///
/// Cheap to share behind an `Arc`; the underlying connection pool is safe
/// for concurrent use. The engine version is fetched once and cached.
pub struct HttpSearchClient {
    http: reqwest::Client,
    base: Url,
    config: ClientConfig,
    version: OnceCell<EngineVersion>,
}

impl HttpSearchClient {
    /// Build a client from connection config.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unparsable URL or header, and a
    /// transport error if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let url = config.resolved_url();
        let base = Url::parse(&url)
            .map_err(|e| Error::config(format!("Invalid engine URL '{url}': {e}")))?;
        if base.cannot_be_a_base() {
            return Err(Error::config(format!("Invalid engine URL '{url}'")));
        }

        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::config(format!("Invalid header name '{name}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::config(format!("Invalid value for header '{name}': {e}")))?;
            headers.insert(name, value);
        }

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| Error::transport_with_source("Failed to build HTTP client", e))?;

        Ok(Self {
            http,
            base,
            config: config.clone(),
            version: OnceCell::new(),
        })
    }

    /// Base URL of the engine.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Build an engine URL from path segments.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| Error::config(format!("Invalid engine URL '{}'", self.base)))?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        log::debug!("{method} {url}");
        let builder = self.http.request(method, url);
        match self.config.username {
            Some(ref user) => builder.basic_auth(user, self.config.password.as_ref()),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response> {
        builder
            .send()
            .await
            .map_err(|e| Error::transport_with_source(format!("Request to {} failed", self.base), e))
    }

    /// Send and require a success status.
    async fn send_checked(&self, builder: RequestBuilder) -> Result<reqwest::Response> {
        let response = self.send(builder).await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(engine_error(response).await)
        }
    }

    async fn send_json(&self, builder: RequestBuilder) -> Result<Value> {
        let response = self.send_checked(builder).await?;
        read_json(response).await
    }

    fn document_url(&self, routing: &Routing) -> Result<Url> {
        let mut url = self.url(&[&routing.index, &routing.doc_type, &routing.id])?;
        if let Some(ref parent) = routing.parent {
            url.query_pairs_mut().append_pair("parent", parent);
        }
        Ok(url)
    }

    fn search_url(&self, request: &SearchRequest) -> Result<Url> {
        let index = request.index.as_deref().filter(|i| !i.is_empty());
        let mut url = match (index, request.doc_type.as_deref()) {
            (Some(index), Some(doc_type)) => self.url(&[index, doc_type, "_search"])?,
            (Some(index), None) => self.url(&[index, "_search"])?,
            (None, Some(doc_type)) => self.url(&["_all", doc_type, "_search"])?,
            (None, None) => self.url(&["_search"])?,
        };
        {
            let mut query = url.query_pairs_mut();
            if let Some(ref q) = request.q {
                query.append_pair("q", q);
            }
            if let Some(size) = request.size {
                query.append_pair("size", &size.to_string());
            }
            if let Some(from) = request.from {
                query.append_pair("from", &from.to_string());
            }
            if request.ignore_unavailable {
                query.append_pair("ignore_unavailable", "true");
            }
        }
        Ok(strip_empty_query(url))
    }
}

/// Drop a dangling `?` left by an untouched query serializer.
fn strip_empty_query(mut url: Url) -> Url {
    if url.query() == Some("") {
        url.set_query(None);
    }
    url
}

async fn engine_error(response: reqwest::Response) -> Error {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Error::engine(status, body)
}

async fn read_json(response: reqwest::Response) -> Result<Value> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::transport_with_source("Failed to read engine response", e))?;
    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(&bytes)?)
}

#[async_trait]
impl SearchClient for HttpSearchClient {
    async fn info(&self) -> Result<Value> {
        self.send_json(self.request(Method::GET, self.base.clone()))
            .await
    }

    async fn engine_version(&self) -> Result<EngineVersion> {
        self.version
            .get_or_try_init(|| async {
                let info = self.info().await?;
                let number = info
                    .pointer("/version/number")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                EngineVersion::parse(number)
            })
            .await
            .cloned()
    }

    async fn index_document(&self, document: &Document, routing: &Routing) -> Result<Value> {
        let url = self.document_url(routing)?;
        self.send_json(self.request(Method::PUT, url).json(document))
            .await
    }

    async fn delete_document(&self, routing: &Routing) -> Result<DeleteOutcome> {
        let url = self.document_url(routing)?;
        let response = self.send(self.request(Method::DELETE, url)).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(DeleteOutcome::NotFound),
            status if status.is_success() => Ok(DeleteOutcome::Deleted),
            _ => Err(engine_error(response).await),
        }
    }

    async fn bulk(&self, operations: &[BulkOperation]) -> Result<BulkResponse> {
        let mut body = String::new();
        for op in operations {
            body.push_str(&op.to_ndjson()?);
        }
        let url = self.url(&["_bulk"])?;
        let builder = self
            .request(Method::POST, url)
            .header(CONTENT_TYPE, "application/x-ndjson")
            .body(body);
        let value = self.send_json(builder).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn search(&self, request: &SearchRequest) -> Result<Value> {
        let url = self.search_url(request)?;
        let mut builder = self.request(Method::POST, url);
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }
        self.send_json(builder).await
    }

    async fn suggest(&self, index: &str, body: &Value) -> Result<Value> {
        let url = self.url(&[index, "_suggest"])?;
        self.send_json(self.request(Method::POST, url).json(body))
            .await
    }

    async fn create_index(&self, index: &str, settings: &Value) -> Result<()> {
        let url = self.url(&[index])?;
        self.send_checked(self.request(Method::PUT, url).json(settings))
            .await?;
        Ok(())
    }

    async fn delete_index(&self, index: &str) -> Result<bool> {
        let url = self.url(&[index])?;
        let response = self.send(self.request(Method::DELETE, url)).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            _ => Err(engine_error(response).await),
        }
    }

    async fn index_exists(&self, index: &str) -> Result<bool> {
        let url = self.url(&[index])?;
        let response = self.send(self.request(Method::HEAD, url)).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            _ => Err(engine_error(response).await),
        }
    }
}

impl std::fmt::Debug for HttpSearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSearchClient")
            .field("base", &self.base.as_str())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
