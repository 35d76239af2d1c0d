//! Authenticated requests against the SpotOn API.

use std::sync::Arc;

use reqwest::header::{self, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::auth::Authenticator;
use crate::error::{Result, SpotOnError};
use crate::http::{Dispatcher, HttpRequest, HttpResponse, join_path};
use crate::token::StoredToken;

/// Issues requests with the current bearer token attached and maps every
/// outcome into [`SpotOnError`].
///
/// Safe to share between concurrent callers: each request works from a
/// snapshot of the token taken when it starts.
#[derive(Debug)]
pub struct Transport {
    base_url: Url,
    dispatcher: Dispatcher,
    auth: Arc<Authenticator>,
    reauthenticate_on_unauthorized: bool,
}

impl Transport {
    pub(crate) fn new(
        base_url: Url,
        dispatcher: Dispatcher,
        auth: Arc<Authenticator>,
        reauthenticate_on_unauthorized: bool,
    ) -> Self {
        Self {
            base_url,
            dispatcher,
            auth,
            reauthenticate_on_unauthorized,
        }
    }

    /// Send an authenticated request and return the successful response.
    ///
    /// - no stored token: [`SpotOnError::Authentication`], nothing is sent
    /// - expired token: refreshed once before sending
    /// - 401: token cleared, then either an error or, when configured, one
    ///   forced re-authentication and a single resend
    /// - 5xx and transport faults: retried, then [`SpotOnError::Network`]
    /// - other non-2xx: [`SpotOnError::Api`]
    pub async fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<HttpResponse> {
        let url = join_path(&self.base_url, path);
        let mut stored = self.current_token().await?;
        let mut reauthenticated = false;

        loop {
            let mut request = HttpRequest::new(method.clone(), url.clone());
            if let Some(body) = body {
                request = request.json(body)?;
            }
            let mut auth_value = HeaderValue::from_str(&stored.token.authorization_header())
                .map_err(|_| SpotOnError::authentication("token is not a valid header value"))?;
            auth_value.set_sensitive(true);
            let request = request.header(header::AUTHORIZATION, auth_value);

            tracing::debug!("{} {}", method, url.path());
            let response = self.dispatcher.send(&request).await?;

            if response.status == StatusCode::UNAUTHORIZED {
                self.auth.invalidate(stored.generation);

                if self.reauthenticate_on_unauthorized && !reauthenticated {
                    tracing::warn!(
                        "{} {} returned 401, re-authenticating once",
                        method,
                        url.path()
                    );
                    stored = self.auth.acquire(true).await?;
                    reauthenticated = true;
                    continue;
                }

                tracing::warn!("{} {} returned 401", method, url.path());
                return Err(SpotOnError::from_status(response.status, &response.body));
            }

            if !response.status.is_success() {
                return Err(SpotOnError::from_status(response.status, &response.body));
            }

            return Ok(response);
        }
    }

    /// GET `path` and decode the JSON body. `None` for an empty response.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let response = self.request::<()>(Method::GET, path, None).await?;
        decode(&response)
    }

    /// Send `body` as JSON with `method` and decode the JSON response.
    pub async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<Option<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.request(method, path, Some(body)).await?;
        decode(&response)
    }

    async fn current_token(&self) -> Result<StoredToken> {
        let stored = self.auth.store().snapshot().ok_or_else(|| {
            SpotOnError::authentication("not authenticated; call authenticate() first")
        })?;

        if self.auth.is_fresh(&stored.token) {
            return Ok(stored);
        }

        tracing::debug!("Stored token expired, refreshing before request");
        self.auth.acquire(false).await
    }
}

/// Decode a JSON response body. Empty bodies and a literal `null` decode to
/// `None`.
pub(crate) fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<Option<T>> {
    if response.is_empty() {
        return Ok(None);
    }
    serde_json::from_slice::<Option<T>>(&response.body).map_err(|e| {
        SpotOnError::serialization(format!("unexpected response body: {}", e))
    })
}
