//! HTTP client for a remote store and index.
//!
//! Speaks the server's contract:
//!
//! | request | response |
//! |---|---|
//! | `POST /store` raw bytes, `Content-Type` | `201 {"contentHash": hex}` |
//! | `GET /store/{hex}` | `200` raw bytes, or `404` |
//! | `POST /index {"metadata": entry}` | `200` |
//! | `POST /find` query object | `200` array of entries |
//!
//! Requests run on the blocking pool and are bounded by the configured
//! timeout. Nothing is retried.

use std::io::{self, Read};
use std::time::Duration;

use arcjet_core::Sha512Hash;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::entry::{IndexEntry, Query};
use crate::error::{NetworkError, Result, StoreError};
use crate::traits::{Blob, IndexClient, StoreClient};

/// Default server address.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";

/// Configuration for [`HttpClient`].
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Server base URL; paths are replaced, not appended.
    pub base_url: String,

    /// Upper bound on each request, connect to last byte.
    pub timeout: Duration,

    /// Largest content body accepted from `GET /store`.
    pub max_body_bytes: u64,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
            max_body_bytes: 64 * 1024 * 1024,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreResponse {
    content_hash: String,
}

#[derive(Serialize)]
struct IndexRequest<'a> {
    metadata: &'a IndexEntry,
}

/// Client for a remote Arcjet server. Implements both [`StoreClient`] and
/// [`IndexClient`].
#[derive(Clone)]
pub struct HttpClient {
    agent: ureq::Agent,
    base_url: Url,
    timeout: Duration,
    max_body_bytes: u64,
}

impl HttpClient {
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)?;
        // The outer bound in `run` reports the timeout; the agent's own,
        // slightly later one releases the blocking thread.
        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout + Duration::from_millis(500))
            .build();
        Ok(Self {
            agent,
            base_url,
            timeout: config.timeout,
            max_body_bytes: config.max_body_bytes,
        })
    }

    /// Client for `base_url` with default settings.
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        Self::new(HttpClientConfig {
            base_url: base_url.to_string(),
            ..Default::default()
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(path);
        url
    }

    /// Run a blocking request off the async runtime, bounded by the timeout.
    async fn run<T, F>(&self, request: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(ureq::Agent) -> Result<T> + Send + 'static,
    {
        let agent = self.agent.clone();
        let task = tokio::task::spawn_blocking(move || request(agent));
        match tokio::time::timeout(self.timeout, task).await {
            Err(_) => Err(NetworkError::Timeout.into()),
            Ok(Err(join)) => Err(NetworkError::Unreachable(join.to_string()).into()),
            Ok(Ok(result)) => result,
        }
    }
}

/// Map a transport or status failure.
fn network_error(err: ureq::Error) -> StoreError {
    match err {
        ureq::Error::Status(code, _) => NetworkError::BadStatus(code).into(),
        ureq::Error::Transport(t) => {
            if is_timeout(&t) {
                NetworkError::Timeout.into()
            } else {
                NetworkError::Unreachable(t.to_string()).into()
            }
        }
    }
}

fn is_timeout(t: &ureq::Transport) -> bool {
    std::error::Error::source(t)
        .and_then(|s| s.downcast_ref::<io::Error>())
        .is_some_and(|e| matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock))
}

fn read_json<T: serde::de::DeserializeOwned>(response: ureq::Response) -> Result<T> {
    let body = response.into_string()?;
    Ok(serde_json::from_str(&body)?)
}

#[async_trait]
impl StoreClient for HttpClient {
    async fn put(&self, content: Bytes, content_type: &str) -> Result<Sha512Hash> {
        let url = self.endpoint("/store");
        let content_type = content_type.to_owned();
        let reply: StoreResponse = self
            .run(move |agent| {
                let response = agent
                    .post(url.as_str())
                    .set("Content-Type", &content_type)
                    .send_bytes(&content)
                    .map_err(network_error)?;
                read_json(response)
            })
            .await?;

        Sha512Hash::from_hex(&reply.content_hash)
            .map_err(|e| StoreError::Serialization(format!("contentHash: {e}")))
    }

    async fn get_blob(&self, hash: &Sha512Hash) -> Result<Blob> {
        let hex = hash.to_hex();
        let url = self.endpoint(&format!("/store/{hex}"));
        let limit = self.max_body_bytes;
        self.run(move |agent| {
            let response = match agent.get(url.as_str()).call() {
                Ok(response) => response,
                Err(ureq::Error::Status(404, _)) => return Err(StoreError::NotFound(hex)),
                Err(e) => return Err(network_error(e)),
            };

            let declared = response
                .header("Content-Length")
                .and_then(|v| v.parse::<u64>().ok());
            if declared.is_some_and(|len| len > limit) {
                return Err(StoreError::TooLarge { limit });
            }

            let content_type = response.header("Content-Type").map(str::to_owned);
            let mut content = Vec::new();
            // One byte past the limit tells an oversized body from an exact fit.
            response
                .into_reader()
                .take(limit.saturating_add(1))
                .read_to_end(&mut content)?;
            if content.len() as u64 > limit {
                return Err(StoreError::TooLarge { limit });
            }

            Ok(Blob {
                content: Bytes::from(content),
                content_type,
            })
        })
        .await
    }
}

#[async_trait]
impl IndexClient for HttpClient {
    async fn put(&self, entry: &IndexEntry) -> Result<()> {
        let url = self.endpoint("/index");
        let body = serde_json::to_vec(&IndexRequest { metadata: entry })?;
        self.run(move |agent| {
            agent
                .post(url.as_str())
                .set("Content-Type", "application/json")
                .send_bytes(&body)
                .map_err(network_error)?;
            Ok(())
        })
        .await
    }

    async fn find(&self, query: &Query) -> Result<Vec<IndexEntry>> {
        let url = self.endpoint("/find");
        let body = serde_json::to_vec(query)?;
        self.run(move |agent| {
            let response = agent
                .post(url.as_str())
                .set("Content-Type", "application/json")
                .send_bytes(&body)
                .map_err(network_error)?;
            read_json(response)
        })
        .await
    }
}
