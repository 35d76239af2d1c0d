//! Credential exchange.
//!
//! The [`Authenticator`] turns the client's [`Credential`] into a bearer
//! [`Token`] and is the only writer of the [`TokenStore`].
//!
//! # Policy
//!
//! - A non-forced `authenticate` returns the stored token when it is still
//!   fresh (see [`Authenticator::is_fresh`]) without any network call.
//! - Exchanges are serialized. A caller that queued behind an exchange that
//!   replaced the token gets that token back instead of starting another
//!   exchange, whether or not it asked to force and however short the new
//!   token's lifetime is.
//! - On failure the store is left as it was.

use std::time::Duration;

use chrono::Duration as ChronoDuration;
use oauth2::basic::{BasicClient, BasicErrorResponse, BasicTokenType};
use oauth2::{
    AuthType, AuthUrl, ClientId, ClientSecret, RequestTokenError, TokenResponse, TokenUrl,
};
use reqwest::Method;
use reqwest::header::{HeaderName, HeaderValue};
use serde::Deserialize;
use tokio::sync::Mutex;
use url::Url;

use crate::credential::{Credential, Secret};
use crate::error::{Result, SpotOnError};
use crate::http::{Dispatcher, HttpRequest, HttpResponse, join_path};
use crate::token::{StoredToken, Token, TokenStore};

/// Client-credentials token endpoint.
pub const TOKEN_PATH: &str = "/oauth/token";

/// API key verification endpoint.
pub const API_KEY_VERIFY_PATH: &str = "/v1/auth/verify";

const API_KEY_HEADER: &str = "x-api-key";

/// Body of a successful API key verification.
#[derive(Debug, Deserialize)]
struct VerifyResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Exchanges a [`Credential`] for a [`Token`] and keeps it in a
/// [`TokenStore`].
#[derive(Debug)]
pub struct Authenticator {
    credential: Credential,
    base_url: Url,
    dispatcher: Dispatcher,
    store: TokenStore,
    exchange_lock: Mutex<()>,
    expiry_buffer: ChronoDuration,
}

impl Authenticator {
    pub(crate) fn new(
        credential: Credential,
        base_url: Url,
        dispatcher: Dispatcher,
        expiry_buffer: Duration,
    ) -> Self {
        Self {
            credential,
            base_url,
            dispatcher,
            store: TokenStore::new(),
            exchange_lock: Mutex::new(()),
            expiry_buffer: ChronoDuration::from_std(expiry_buffer)
                .unwrap_or_else(|_| ChronoDuration::zero()),
        }
    }

    /// The store this authenticator writes to.
    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Whether `token` can be used without refreshing first.
    ///
    /// Tokens are refreshed once inside the expiry buffer, or past half
    /// their lifetime when the lifetime is shorter than twice the buffer.
    pub fn is_fresh(&self, token: &Token) -> bool {
        let buffer = token
            .lifetime()
            .map_or(self.expiry_buffer, |lifetime| self.expiry_buffer.min(lifetime / 2));
        !token.expires_within(buffer)
    }

    /// Obtain a token, exchanging credentials if needed.
    ///
    /// With `force` set, a fresh stored token is ignored and a new exchange
    /// is performed (unless one completed while this call was waiting).
    pub async fn authenticate(&self, force: bool) -> Result<Token> {
        self.acquire(force).await.map(|stored| stored.token)
    }

    pub(crate) async fn acquire(&self, force: bool) -> Result<StoredToken> {
        let observed = self.store.generation();

        if !force {
            if let Some(stored) = self.fresh_snapshot() {
                tracing::debug!("Using cached {} token", self.credential.mode());
                return Ok(stored);
            }
        }

        let _guard = self.exchange_lock.lock().await;

        // Someone else finished an exchange while we were queued.
        if let Some(stored) = self.store.snapshot() {
            if stored.generation != observed {
                tracing::debug!("Reusing token from concurrent exchange");
                return Ok(stored);
            }
            if !force && self.is_fresh(&stored.token) {
                return Ok(stored);
            }
        }

        tracing::debug!("Exchanging {} credential for a token", self.credential.mode());
        let token = self.exchange().await.map_err(|e| {
            tracing::warn!("Authentication failed: {}", e);
            e.into_authentication()
        })?;

        let generation = self.store.replace(token.clone());
        tracing::info!(
            "Authenticated with {} credential (expires: {})",
            self.credential.mode(),
            token
                .expires_at
                .map(|at| at.to_rfc3339())
                .unwrap_or_else(|| "never".to_string())
        );

        Ok(StoredToken { token, generation })
    }

    /// Drop the stored token if it is still the one written at
    /// `generation`; used after the API rejects it.
    pub(crate) fn invalidate(&self, generation: u64) {
        if self.store.clear_if_current(generation) {
            tracing::warn!("Stored token rejected by the API; cleared");
        }
    }

    /// Forget the current token.
    pub fn sign_out(&self) {
        self.store.clear();
        tracing::debug!("Token cleared");
    }

    fn fresh_snapshot(&self) -> Option<StoredToken> {
        self.store
            .snapshot()
            .filter(|stored| self.is_fresh(&stored.token))
    }

    async fn exchange(&self) -> Result<Token> {
        match &self.credential {
            Credential::ApiKey { key } => self.verify_api_key(key).await,
            Credential::OAuthClientCredentials {
                client_id,
                client_secret,
            } => self.exchange_client_credentials(client_id, client_secret).await,
        }
    }

    /// One round trip that checks the key. The API may answer with a
    /// session token; otherwise the key itself is the bearer value.
    async fn verify_api_key(&self, key: &Secret) -> Result<Token> {
        let mut value = HeaderValue::from_str(key.expose()).map_err(|_| {
            SpotOnError::validation("API key contains characters not allowed in an HTTP header")
        })?;
        value.set_sensitive(true);

        let request = HttpRequest::new(Method::POST, join_path(&self.base_url, API_KEY_VERIFY_PATH))
            .header(HeaderName::from_static(API_KEY_HEADER), value);
        let response = self.dispatcher.send(&request).await?;
        let response = check_status(response)?;

        match session_token(&response) {
            Some(body) => build_token(body.access_token, body.token_type, body.expires_in),
            None => Token::new(key.expose()),
        }
    }

    /// Two-legged OAuth client-credentials grant, sent through the
    /// dispatcher so it shares the retry policy and backend.
    async fn exchange_client_credentials(
        &self,
        client_id: &str,
        client_secret: &Secret,
    ) -> Result<Token> {
        let client = oauth_client(&self.base_url, client_id, client_secret);
        let dispatcher = &self.dispatcher;

        let response = client
            .exchange_client_credentials()
            .request_async(|request| async move {
                let response = dispatcher.send(&from_oauth_request(request)?).await?;
                into_oauth_response(response)
            })
            .await
            .map_err(oauth_error)?;

        if *response.token_type() != BasicTokenType::Bearer {
            return Err(SpotOnError::authentication(format!(
                "unsupported token type {:?}",
                response.token_type()
            )));
        }

        let token = Token::new(response.access_token().secret().as_str())?;
        Ok(match response.expires_in() {
            Some(lifetime) => token.expiring_after(lifetime),
            None => token,
        })
    }
}

/// Session token carried by a verify response, if any. Bodies that are
/// empty, not JSON, or without an `access_token` yield `None`.
struct SessionToken {
    access_token: String,
    token_type: Option<String>,
    expires_in: Option<i64>,
}

fn session_token(response: &HttpResponse) -> Option<SessionToken> {
    if response.is_empty() {
        return None;
    }
    let body: VerifyResponse = match serde_json::from_slice(&response.body) {
        Ok(body) => body,
        Err(e) => {
            tracing::debug!("API key verify body is not a token response: {}", e);
            return None;
        }
    };
    body.access_token.map(|access_token| SessionToken {
        access_token,
        token_type: body.token_type,
        expires_in: body.expires_in,
    })
}

fn oauth_client(base_url: &Url, client_id: &str, client_secret: &Secret) -> BasicClient {
    let token_url = join_path(base_url, TOKEN_PATH);
    BasicClient::new(
        ClientId::new(client_id.to_string()),
        Some(ClientSecret::new(client_secret.expose().to_string())),
        AuthUrl::from_url(token_url.clone()),
        Some(TokenUrl::from_url(token_url)),
    )
    .set_auth_type(AuthType::RequestBody)
}

fn from_oauth_request(request: oauth2::HttpRequest) -> Result<HttpRequest> {
    let method = Method::from_bytes(request.method.as_str().as_bytes())
        .map_err(|e| SpotOnError::validation(format!("invalid token request method: {}", e)))?;

    let mut converted = HttpRequest::new(method, request.url);
    for (name, value) in request.headers.iter() {
        let name = HeaderName::from_bytes(name.as_str().as_bytes())
            .map_err(|e| SpotOnError::validation(format!("invalid token request header: {}", e)))?;
        let value = HeaderValue::from_bytes(value.as_bytes())
            .map_err(|e| SpotOnError::validation(format!("invalid token request header: {}", e)))?;
        converted.headers.insert(name, value);
    }
    converted.body = Some(request.body);
    Ok(converted)
}

fn into_oauth_response(response: HttpResponse) -> Result<oauth2::HttpResponse> {
    let status_code = oauth2::http::StatusCode::from_u16(response.status.as_u16())
        .map_err(|e| SpotOnError::network(format!("invalid status from token endpoint: {}", e)))?;

    let mut headers = oauth2::http::HeaderMap::new();
    for (name, value) in response.headers.iter() {
        if let (Ok(name), Ok(value)) = (
            oauth2::http::header::HeaderName::from_bytes(name.as_str().as_bytes()),
            oauth2::http::header::HeaderValue::from_bytes(value.as_bytes()),
        ) {
            headers.append(name, value);
        }
    }

    Ok(oauth2::HttpResponse {
        status_code,
        headers,
        body: response.body,
    })
}

fn oauth_error(err: RequestTokenError<SpotOnError, BasicErrorResponse>) -> SpotOnError {
    match err {
        RequestTokenError::ServerResponse(response) => {
            let code = response.error().to_string();
            SpotOnError::Authentication {
                message: response
                    .error_description()
                    .cloned()
                    .unwrap_or_else(|| code.clone()),
                code: Some(code),
                details: None,
            }
        }
        RequestTokenError::Request(err) => err,
        RequestTokenError::Parse(err, _) => {
            SpotOnError::authentication(format!("malformed token response: {}", err))
        }
        RequestTokenError::Other(message) => SpotOnError::authentication(message),
    }
}

fn check_status(response: HttpResponse) -> Result<HttpResponse> {
    if response.status.is_success() {
        Ok(response)
    } else {
        Err(SpotOnError::from_status(response.status, &response.body))
    }
}

fn build_token(
    access_token: String,
    token_type: Option<String>,
    expires_in: Option<i64>,
) -> Result<Token> {
    if let Some(kind) = token_type {
        if !kind.eq_ignore_ascii_case("bearer") {
            return Err(SpotOnError::authentication(format!(
                "unsupported token type {:?}",
                kind
            )));
        }
    }

    let token = Token::new(access_token)?;
    Ok(match expires_in {
        Some(seconds) => token.expiring_in(seconds),
        None => token,
    })
}
