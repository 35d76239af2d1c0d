//! HTTP plumbing shared by the authenticator and the transport.
//!
//! This module provides:
//! - [`HttpBackend`] - Trait for the component that actually performs I/O
//! - [`ReqwestBackend`] - The default backend, built on `reqwest`
//! - [`HttpRequest`] / [`HttpResponse`] - Owned request and response values
//!
//! Retries and per-attempt timeouts are applied above the backend, so a
//! custom backend gets the same failure handling as the default one.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use url::Url;

use crate::config::RetryPolicy;
use crate::error::{Result, SpotOnError};

/// Sent as `User-Agent` on every request.
pub const USER_AGENT: &str = concat!("spoton-rust-sdk/", env!("CARGO_PKG_VERSION"));

/// An outgoing HTTP request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Request accepting JSON, with no body.
    pub fn new(method: Method, url: Url) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        Self {
            method,
            url,
            headers,
            body: None,
        }
    }

    /// Set a header, replacing any previous value.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Attach a JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        self.body = Some(serde_json::to_vec(body)?);
        self.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        Ok(self)
    }

    /// Attach an `application/x-www-form-urlencoded` body.
    pub fn form(mut self, pairs: &[(&str, &str)]) -> Self {
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        self.body = Some(encoded.into_bytes());
        self.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        self
    }
}

/// A fully-read HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Response with no headers.
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// True for 204 or a body that is empty or only whitespace.
    pub fn is_empty(&self) -> bool {
        self.status == StatusCode::NO_CONTENT || self.body.iter().all(u8::is_ascii_whitespace)
    }
}

/// Performs a single HTTP exchange.
///
/// Implementations return `Ok` for any response that arrived, whatever its
/// status, and [`SpotOnError::Network`] when no response could be obtained.
#[async_trait]
pub trait HttpBackend: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// [`HttpBackend`] backed by a pooled `reqwest::Client`.
///
/// Clone is cheap - `reqwest::Client` uses Arc internally for connection pooling.
#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    client: reqwest::Client,
}

impl ReqwestBackend {
    /// Create a backend whose client enforces `timeout` per request.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| SpotOnError::network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Wrap an existing client, sharing its connection pool.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(network_error)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(network_error)?;

        Ok(HttpResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}

fn network_error(err: reqwest::Error) -> SpotOnError {
    if err.is_timeout() {
        SpotOnError::network(format!("request timed out: {}", err))
    } else if err.is_connect() {
        SpotOnError::network(format!("connection failed: {}", err))
    } else {
        SpotOnError::network(err.to_string())
    }
}

/// Append `path` to the base URL, keeping any path prefix the base carries.
pub(crate) fn join_path(base: &Url, path: &str) -> Url {
    let mut url = base.clone();
    let joined = format!(
        "{}/{}",
        base.path().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    url.set_path(&joined);
    url
}

/// Sends requests through a backend with a timeout per attempt and
/// bounded retries for transient failures.
#[derive(Clone)]
pub(crate) struct Dispatcher {
    backend: Arc<dyn HttpBackend>,
    retry: RetryPolicy,
    timeout: Duration,
}

impl Dispatcher {
    pub(crate) fn new(backend: Arc<dyn HttpBackend>, retry: RetryPolicy, timeout: Duration) -> Self {
        Self {
            backend,
            retry,
            timeout,
        }
    }

    /// Send `request`, retrying transport failures and 5xx responses.
    ///
    /// Returns the response for any non-5xx status. A 5xx that survives
    /// every retry becomes a [`SpotOnError::Network`].
    pub(crate) async fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let mut attempt = 0u32;

        loop {
            let outcome = match tokio::time::timeout(
                self.timeout,
                self.backend.execute(request.clone()),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(SpotOnError::network(format!(
                    "{} {} timed out after {:?}",
                    request.method,
                    request.url.path(),
                    self.timeout
                ))),
            };

            let failure = match outcome {
                Ok(response) if response.status.is_server_error() => {
                    SpotOnError::from_status(response.status, &response.body)
                }
                Ok(response) => return Ok(response),
                Err(err) if err.is_retryable() => err,
                Err(err) => return Err(err),
            };

            if attempt >= self.retry.max_retries {
                tracing::error!(
                    "{} {} failed after {} attempt(s): {}",
                    request.method,
                    request.url.path(),
                    attempt + 1,
                    failure
                );
                return Err(failure);
            }

            let delay = self.retry.backoff_for(attempt);
            attempt += 1;
            tracing::warn!(
                "{} {} failed ({}), retry {}/{} in {:?}",
                request.method,
                request.url.path(),
                failure,
                attempt,
                self.retry.max_retries,
                delay
            );
            tokio::time::sleep(delay).await;
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("retry", &self.retry)
            .field("timeout", &self.timeout)
            .finish()
    }
}
