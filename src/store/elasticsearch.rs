//! Elasticsearch implementation of the index store.
//!
//! Speaks the plain REST API over `reqwest`:
//! - `GET /` to verify the cluster is reachable
//! - `GET /_cat/indices?h=index&format=json` to enumerate indices
//! - `DELETE /{index}` to delete an index
//!
//! Individual requests are retried on transient failures according to the
//! configured request policy.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::{
    error::{StoreError, StoreResult},
    traits::{IndexStore, StoreConnector},
};
use crate::{
    config::{ConfigError, StoreConfig},
    retry::{BackoffPolicy, with_backoff},
};

/// Longest error body kept in a `StoreError::Status`.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Builds a fresh Elasticsearch client per sweep attempt.
#[derive(Debug, Clone)]
pub struct ElasticsearchConnector {
    base_url: Url,
    timeout: Duration,
    policy: BackoffPolicy,
    cancel: CancellationToken,
}

impl ElasticsearchConnector {
    pub fn new(base_url: Url, timeout: Duration, policy: BackoffPolicy) -> Self {
        Self {
            base_url,
            timeout,
            policy,
            cancel: CancellationToken::new(),
        }
    }

    pub fn from_config(config: &StoreConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.url()?,
            config.timeout(),
            config.request_policy(),
        ))
    }

    /// Abort request retry waits when `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

#[async_trait]
impl StoreConnector for ElasticsearchConnector {
    async fn connect(&self) -> StoreResult<Box<dyn IndexStore>> {
        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| StoreError::Unreachable(format!("Failed to build HTTP client: {e}")))?;

        let store = ElasticsearchStore {
            client,
            base_url: self.base_url.clone(),
            policy: self.policy.clone(),
            cancel: self.cancel.clone(),
        };
        store.ping().await?;

        tracing::debug!(endpoint = %self.base_url, "Connected to Elasticsearch");
        Ok(Box::new(store))
    }

    fn endpoint(&self) -> String {
        self.base_url.to_string()
    }
}

/// A connected Elasticsearch cluster.
pub struct ElasticsearchStore {
    client: Client,
    base_url: Url,
    policy: BackoffPolicy,
    cancel: CancellationToken,
}

#[derive(Debug, Deserialize)]
struct CatIndex {
    index: String,
}

#[derive(Debug, Deserialize)]
struct Acknowledged {
    acknowledged: bool,
}

impl ElasticsearchStore {
    /// Base URL with `segments` appended, each percent-encoded.
    fn url_for(&self, segments: &[&str]) -> StoreResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidEndpoint(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn ping(&self) -> StoreResult<()> {
        let url = self.base_url.clone();
        self.send("ping", || self.client.get(url.clone())).await?;
        Ok(())
    }

    /// Send a request with retries, mapping non-2xx responses to errors.
    async fn send<B>(&self, operation: &str, build: B) -> StoreResult<Response>
    where
        B: Fn() -> RequestBuilder,
    {
        let build = &build;
        with_backoff(
            &self.policy,
            operation,
            StoreError::is_transient,
            &self.cancel,
            move || async move {
                let response = build().send().await.map_err(StoreError::from)?;
                check_status(response).await
            },
        )
        .await
    }
}

#[async_trait]
impl IndexStore for ElasticsearchStore {
    async fn index_names(&self) -> StoreResult<Vec<String>> {
        let mut url = self.url_for(&["_cat", "indices"])?;
        url.query_pairs_mut()
            .append_pair("h", "index")
            .append_pair("format", "json");

        let response = self
            .send("list_indices", || self.client.get(url.clone()))
            .await?;
        let indices: Vec<CatIndex> = response.json().await?;

        Ok(indices.into_iter().map(|i| i.index).collect())
    }

    async fn delete_index(&self, name: &str) -> StoreResult<()> {
        let url = self.url_for(&[name])?;

        let response = self
            .send("delete_index", || self.client.delete(url.clone()))
            .await?;
        let ack: Acknowledged = response.json().await?;

        if !ack.acknowledged {
            return Err(StoreError::NotAcknowledged(name.to_string()));
        }
        Ok(())
    }
}

async fn check_status(response: Response) -> StoreResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Status {
        status: status.as_u16(),
        body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
    })
}
