//! Credentials used to authenticate against the SpotOn API.
//!
//! - [`Secret`] - A wrapper for sensitive values that prevents accidental logging
//! - [`Credential`] - The authentication mode and its secrets

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Result, SpotOnError};

/// A secret value that prevents accidental exposure in logs.
///
/// The inner value is only accessible via [`expose()`](Secret::expose).
/// Debug and Display implementations show `[REDACTED]` instead of the value,
/// and the memory is wiped when the secret is dropped.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Create a new secret from a string value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the secret value.
    ///
    /// Use sparingly and never log the result.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the secret is empty or only whitespace.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret([REDACTED])")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Secret {}

/// How a client authenticates.
///
/// Deserializes from either `{"apiKey": "..."}` or
/// `{"clientId": "...", "clientSecret": "..."}`; snake_case keys are accepted
/// too.
///
/// # Examples
///
/// ```
/// use spoton_core::Credential;
///
/// let key = Credential::api_key("your-api-key-here");
/// assert_eq!(key.mode(), "api_key");
///
/// let oauth: Credential =
///     serde_json::from_str(r#"{"clientId": "id", "clientSecret": "secret"}"#).unwrap();
/// assert_eq!(oauth.mode(), "client_credentials");
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Credential {
    /// A static API key verified by the API.
    ApiKey {
        #[serde(rename = "apiKey", alias = "api_key")]
        key: Secret,
    },

    /// OAuth 2.0 client-credentials grant.
    OAuthClientCredentials {
        #[serde(rename = "clientId", alias = "client_id")]
        client_id: String,
        #[serde(rename = "clientSecret", alias = "client_secret")]
        client_secret: Secret,
    },
}

impl Credential {
    /// API key credential.
    pub fn api_key(key: impl Into<String>) -> Self {
        Credential::ApiKey {
            key: Secret::new(key),
        }
    }

    /// OAuth client-credentials pair.
    pub fn client_credentials(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Credential::OAuthClientCredentials {
            client_id: client_id.into(),
            client_secret: Secret::new(client_secret),
        }
    }

    /// Short, log-safe name of the authentication mode.
    pub fn mode(&self) -> &'static str {
        match self {
            Credential::ApiKey { .. } => "api_key",
            Credential::OAuthClientCredentials { .. } => "client_credentials",
        }
    }

    /// Reject credentials with blank fields.
    pub fn validate(&self) -> Result<()> {
        match self {
            Credential::ApiKey { key } if key.is_empty() => {
                Err(SpotOnError::validation("API key must not be empty"))
            }
            Credential::OAuthClientCredentials { client_id, .. } if client_id.trim().is_empty() => {
                Err(SpotOnError::validation("client ID must not be empty"))
            }
            Credential::OAuthClientCredentials { client_secret, .. } if client_secret.is_empty() => {
                Err(SpotOnError::validation("client secret must not be empty"))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::ApiKey { key } => f.debug_struct("ApiKey").field("key", key).finish(),
            Credential::OAuthClientCredentials {
                client_id,
                client_secret,
            } => f
                .debug_struct("OAuthClientCredentials")
                .field("client_id", client_id)
                .field("client_secret", client_secret)
                .finish(),
        }
    }
}
