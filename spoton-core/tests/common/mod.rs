//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use spoton_core::{
    ClientConfig, Credential, HttpBackend, HttpRequest, HttpResponse, Result, RetryPolicy,
    SpotOnClient,
};
use wiremock::MockServer;

pub const LOCATION_ID: &str = "BL-1234-5678-9012";
pub const LOCATION_PATH: &str = "/business/v1/locations/BL-1234-5678-9012";
pub const MENUS_PATH: &str = "/menus/v1/locations/BL-1234-5678-9012/menus";
pub const TOKEN_PATH: &str = "/oauth/token";
pub const VERIFY_PATH: &str = "/v1/auth/verify";

/// Location payload with every optional field present.
pub fn location_json() -> Value {
    json!({
        "id": LOCATION_ID,
        "name": "Downtown Bistro",
        "email": "owner@bistro.example",
        "phone": "+1-555-0100",
        "address": {
            "address_line_1": "100 Main St",
            "city": "Springfield",
            "state": "IL",
            "zip": "62701",
            "country": "US"
        },
        "geolocation": {"latitude": 39.7817, "longitude": -89.6501},
        "timezone": "America/Chicago"
    })
}

/// Fast retries so tests don't sleep.
pub fn test_config(base_url: &str, credential: Credential) -> ClientConfig {
    ClientConfig::builder(credential)
        .base_url(base_url)
        .timeout(Duration::from_secs(5))
        .retry(RetryPolicy::new(2, Duration::from_millis(1)))
        .build()
        .unwrap()
}

pub fn api_key_client(server: &MockServer) -> SpotOnClient {
    SpotOnClient::new(test_config(&server.uri(), Credential::api_key("k"))).unwrap()
}

pub fn oauth_client(server: &MockServer) -> SpotOnClient {
    SpotOnClient::new(test_config(
        &server.uri(),
        Credential::client_credentials("my-client", "my-secret"),
    ))
    .unwrap()
}

/// Number of requests the mock server received for `path`.
pub async fn requests_to(server: &MockServer, path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == path)
        .count()
}

/// In-process backend that answers with a closure and records every
/// request it sees.
pub struct RecordingBackend {
    responder: Box<dyn Fn(&HttpRequest) -> HttpResponse + Send + Sync>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl RecordingBackend {
    pub fn new(
        responder: impl Fn(&HttpRequest) -> HttpResponse + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|request| request.url.path() == path)
            .count()
    }
}

#[async_trait]
impl HttpBackend for RecordingBackend {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let response = (self.responder)(&request);
        self.requests.lock().push(request);
        Ok(response)
    }
}

/// Client over a [`RecordingBackend`].
pub fn recording_client(backend: Arc<RecordingBackend>, credential: Credential) -> SpotOnClient {
    SpotOnClient::with_backend(test_config("https://api.spoton.test", credential), backend)
}
