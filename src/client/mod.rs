//! HTTP client for a HyperSync endpoint
//!
//! [`Client`] sends single queries (`POST /query/arrow-ipc`) and height lookups
//! (`GET /height`) through the retry policy in [`crate::retry`], and decodes response
//! bodies off the async runtime.


use crate::config::{ClientConfig, StreamConfig};
use crate::decode::decode_query_response;
use crate::error::{Error, Result};
use crate::retry::execute_with_retry;
use crate::stream::{QuerySource, Stream};
use crate::types::{ArchiveHeight, Query, QueryResponse};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use url::Url;

/// Cheaply cloneable handle to one HyperSync endpoint
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
    span: tracing::Span,
}

struct ClientInner {
    http: reqwest::Client,
    config: ClientConfig,
    query_url: Url,
    height_url: Url,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("url", &self.inner.config.url.as_str())
            .field("authenticated", &self.inner.config.bearer_token.is_some())
            .finish()
    }
}

impl Client {
    /// Build a client from `config`
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if the configuration does not validate, [`Error::Network`] if
    /// the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let http = reqwest::Client::builder().build()?;
        let query_url = endpoint(&config.url, &["query", "arrow-ipc"])?;
        let height_url = endpoint(&config.url, &["height"])?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                config,
                query_url,
                height_url,
            }),
            span: tracing::Span::none(),
        })
    }

    /// Emit this client's events under `span`
    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = span;
        self
    }

    /// The configuration this client was built with
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Execute one query, returning one page
    ///
    /// The response may stop short of `to_block`; see
    /// [`QueryResponse::next_block`]. Use [`stream`](Self::stream) to cover a whole
    /// range.
    pub async fn get(&self, query: &Query, cancel: &CancellationToken) -> Result<QueryResponse> {
        execute_with_retry(&self.inner.config.retry, cancel, || self.send_query(query))
            .instrument(self.span.clone())
            .await
    }

    /// Highest block the archive can serve
    pub async fn get_height(&self, cancel: &CancellationToken) -> Result<u64> {
        execute_with_retry(&self.inner.config.retry, cancel, || self.send_height())
            .instrument(self.span.clone())
            .await
    }

    /// Start an ordered stream over `query`'s range
    ///
    /// Equivalent to [`Stream::new`] followed by [`Stream::start`], with this
    /// client's span.
    pub async fn stream(&self, query: Query, config: StreamConfig) -> Result<Stream> {
        let mut stream =
            Stream::new(Arc::new(self.clone()), query, config)?.with_span(self.span.clone());
        stream.start().await?;
        Ok(stream)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request.timeout(self.inner.config.http_req_timeout);
        match &self.inner.config.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send_query(&self, query: &Query) -> Result<QueryResponse> {
        tracing::debug!(
            from_block = query.from_block,
            to_block = ?query.to_block,
            "Sending query"
        );

        let request = self
            .inner
            .http
            .post(self.inner.query_url.clone())
            .json(query);
        let response = self.authorize(request).send().await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await?;
        let decoded = tokio::task::spawn_blocking(move || decode_query_response(&body))
            .await
            .map_err(|e| Error::Other(format!("decode task failed: {e}")))??;

        tracing::debug!(
            next_block = decoded.next_block,
            execution_ms = decoded.total_execution_time,
            "Query answered"
        );
        Ok(decoded)
    }

    async fn send_height(&self) -> Result<u64> {
        let request = self.inner.http.get(self.inner.height_url.clone());
        let response = self.authorize(request).send().await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await?;
        let height: ArchiveHeight = serde_json::from_slice(&body)?;
        Ok(height.height)
    }
}

#[async_trait]
impl QuerySource for Client {
    async fn get(&self, query: &Query, cancel: &CancellationToken) -> Result<QueryResponse> {
        Client::get(self, query, cancel).await
    }

    async fn get_height(&self, cancel: &CancellationToken) -> Result<u64> {
        Client::get_height(self, cancel).await
    }
}

/// `base` with `segments` appended to its path
fn endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| Error::config("url", format!("{base} cannot carry a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
