//! Client configuration.
//!
//! A [`ClientConfig`] is built once, validated, and then fixed for the
//! lifetime of the client that owns it.
//!
//! ```
//! use std::time::Duration;
//! use spoton_core::{ClientConfig, Credential, RetryPolicy};
//!
//! let config = ClientConfig::builder(Credential::api_key("your-api-key-here"))
//!     .base_url("https://sandbox-api.spoton.com")
//!     .timeout(Duration::from_secs(10))
//!     .retry(RetryPolicy::none())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.base_url().as_str(), "https://sandbox-api.spoton.com/");
//! ```

use std::time::Duration;

use url::Url;

use crate::credential::Credential;
use crate::error::{Result, SpotOnError};

/// Production API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.spoton.com";

/// Per-attempt request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Tokens expiring within this window are refreshed before use.
pub const DEFAULT_EXPIRY_BUFFER_SECS: u64 = 60;

const DEFAULT_MAX_RETRIES: u32 = 2;
const DEFAULT_INITIAL_BACKOFF_MS: u64 = 250;
const DEFAULT_MAX_BACKOFF_MS: u64 = 5_000;

const ENV_API_KEY: &str = "SPOTON_API_KEY";
const ENV_CLIENT_ID: &str = "SPOTON_CLIENT_ID";
const ENV_CLIENT_SECRET: &str = "SPOTON_CLIENT_SECRET";
const ENV_BASE_URL: &str = "SPOTON_BASE_URL";
const ENV_TIMEOUT_SECS: &str = "SPOTON_TIMEOUT_SECS";
const ENV_MAX_RETRIES: &str = "SPOTON_MAX_RETRIES";

/// Bounded exponential backoff for transient failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. Total attempts = `max_retries + 1`.
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// Retry up to `max_retries` times, starting at `initial_backoff`.
    pub fn new(max_retries: u32, initial_backoff: Duration) -> Self {
        Self {
            max_retries,
            initial_backoff,
            max_backoff: Duration::from_millis(DEFAULT_MAX_BACKOFF_MS).max(initial_backoff),
        }
    }

    /// Never retry.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Delay before retry number `attempt` (0-based): doubles each time,
    /// capped at `max_backoff`.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_RETRIES,
            Duration::from_millis(DEFAULT_INITIAL_BACKOFF_MS),
        )
    }
}

/// Immutable configuration for a [`SpotOnClient`](crate::SpotOnClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    credential: Credential,
    base_url: Url,
    timeout: Duration,
    retry: RetryPolicy,
    reauthenticate_on_unauthorized: bool,
    expiry_buffer: Duration,
}

impl ClientConfig {
    /// Configuration with defaults for everything but the credential.
    pub fn new(credential: Credential) -> Result<Self> {
        Self::builder(credential).build()
    }

    /// Start a builder with defaults for everything but the credential.
    pub fn builder(credential: Credential) -> ClientConfigBuilder {
        ClientConfigBuilder::new(credential)
    }

    /// Build a configuration from `SPOTON_*` environment variables.
    ///
    /// `SPOTON_API_KEY` wins over `SPOTON_CLIENT_ID`/`SPOTON_CLIENT_SECRET`.
    /// `SPOTON_BASE_URL`, `SPOTON_TIMEOUT_SECS` and `SPOTON_MAX_RETRIES` are
    /// optional.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let credential = Self::credential_from(&lookup).ok_or_else(|| {
            SpotOnError::validation(format!(
                "set {} or both {} and {}",
                ENV_API_KEY, ENV_CLIENT_ID, ENV_CLIENT_SECRET
            ))
        })?;
        Self::builder(credential).overrides_from(lookup)?.build()
    }

    /// Credential named by `SPOTON_API_KEY`, or by `SPOTON_CLIENT_ID` and
    /// `SPOTON_CLIENT_SECRET` together.
    pub fn credential_from_env() -> Option<Credential> {
        Self::credential_from(|name| std::env::var(name).ok())
    }

    /// [`credential_from_env`](Self::credential_from_env) over an arbitrary
    /// variable lookup.
    pub fn credential_from(lookup: impl Fn(&str) -> Option<String>) -> Option<Credential> {
        match (
            lookup(ENV_API_KEY),
            lookup(ENV_CLIENT_ID),
            lookup(ENV_CLIENT_SECRET),
        ) {
            (Some(key), _, _) => Some(Credential::api_key(key)),
            (None, Some(id), Some(secret)) => Some(Credential::client_credentials(id, secret)),
            _ => None,
        }
    }

    /// The credential requests are authenticated with.
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// API endpoint all paths are joined onto.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Per-attempt request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Retry policy for transient failures.
    pub fn retry(&self) -> RetryPolicy {
        self.retry
    }

    /// Whether a 401 triggers one forced re-authentication and a single
    /// retry of the request.
    pub fn reauthenticate_on_unauthorized(&self) -> bool {
        self.reauthenticate_on_unauthorized
    }

    /// How long before expiry a token is refreshed.
    pub fn expiry_buffer(&self) -> Duration {
        self.expiry_buffer
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    credential: Credential,
    base_url: String,
    timeout: Duration,
    retry: RetryPolicy,
    reauthenticate_on_unauthorized: bool,
    expiry_buffer: Duration,
}

impl ClientConfigBuilder {
    fn new(credential: Credential) -> Self {
        Self {
            credential,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
            reauthenticate_on_unauthorized: false,
            expiry_buffer: Duration::from_secs(DEFAULT_EXPIRY_BUFFER_SECS),
        }
    }

    /// Override the API endpoint, e.g. for a sandbox.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Per-attempt request timeout. Must be non-zero.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn reauthenticate_on_unauthorized(mut self, enabled: bool) -> Self {
        self.reauthenticate_on_unauthorized = enabled;
        self
    }

    pub fn expiry_buffer(mut self, buffer: Duration) -> Self {
        self.expiry_buffer = buffer;
        self
    }

    /// Apply `SPOTON_BASE_URL`, `SPOTON_TIMEOUT_SECS` and
    /// `SPOTON_MAX_RETRIES` from the environment, when set.
    pub fn env_overrides(self) -> Result<Self> {
        self.overrides_from(|name| std::env::var(name).ok())
    }

    /// [`env_overrides`](Self::env_overrides) over an arbitrary variable
    /// lookup.
    pub fn overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(base_url) = lookup(ENV_BASE_URL) {
            self.base_url = base_url;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                SpotOnError::validation(format!("{} must be a whole number of seconds", ENV_TIMEOUT_SECS))
            })?;
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(raw) = lookup(ENV_MAX_RETRIES) {
            let retries: u32 = raw.trim().parse().map_err(|_| {
                SpotOnError::validation(format!("{} must be a non-negative integer", ENV_MAX_RETRIES))
            })?;
            self.retry.max_retries = retries;
        }
        Ok(self)
    }

    /// Validate and freeze the configuration.
    pub fn build(self) -> Result<ClientConfig> {
        self.credential.validate()?;

        let base_url = Url::parse(self.base_url.trim()).map_err(|e| {
            SpotOnError::validation(format!("invalid base URL {:?}: {}", self.base_url, e))
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(SpotOnError::validation(format!(
                "base URL must use http or https, got {}",
                base_url.scheme()
            )));
        }
        if base_url.cannot_be_a_base() {
            return Err(SpotOnError::validation(format!(
                "base URL {} cannot be used as a base",
                base_url
            )));
        }
        if self.timeout.is_zero() {
            return Err(SpotOnError::validation("timeout must be greater than zero"));
        }

        Ok(ClientConfig {
            credential: self.credential,
            base_url,
            timeout: self.timeout,
            retry: self.retry,
            reauthenticate_on_unauthorized: self.reauthenticate_on_unauthorized,
            expiry_buffer: self.expiry_buffer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new(Credential::api_key("k")).unwrap();
        assert_eq!(config.base_url().as_str(), "https://api.spoton.com/");
        assert_eq!(config.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.retry().max_retries, 2);
        assert!(!config.reauthenticate_on_unauthorized());
    }

    #[test]
    fn test_build_rejects_bad_input() {
        let bad_url = ClientConfig::builder(Credential::api_key("k"))
            .base_url("not a url")
            .build();
        assert!(bad_url.is_err());

        let ftp = ClientConfig::builder(Credential::api_key("k"))
            .base_url("ftp://api.spoton.com")
            .build();
        assert!(ftp.is_err());

        let zero_timeout = ClientConfig::builder(Credential::api_key("k"))
            .timeout(Duration::ZERO)
            .build();
        assert!(zero_timeout.is_err());

        assert!(ClientConfig::new(Credential::api_key("")).is_err());
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_retries: 5,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(350),
        };
        assert_eq!(policy.backoff_for(0), Duration::from_millis(100));
        assert_eq!(policy.backoff_for(1), Duration::from_millis(200));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(350));
        assert_eq!(policy.backoff_for(40), Duration::from_millis(350));
    }

    #[test]
    fn test_from_lookup_api_key() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("SPOTON_API_KEY", "abc"),
            ("SPOTON_BASE_URL", "https://sandbox-api.spoton.com"),
            ("SPOTON_TIMEOUT_SECS", "5"),
            ("SPOTON_MAX_RETRIES", "0"),
        ]))
        .unwrap();

        assert_eq!(config.credential(), &Credential::api_key("abc"));
        assert_eq!(config.base_url().host_str(), Some("sandbox-api.spoton.com"));
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.retry().max_retries, 0);
    }

    #[test]
    fn test_from_lookup_client_credentials() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("SPOTON_CLIENT_ID", "id"),
            ("SPOTON_CLIENT_SECRET", "secret"),
        ]))
        .unwrap();
        assert_eq!(config.credential().mode(), "client_credentials");
    }

    #[test]
    fn test_from_lookup_missing_credentials() {
        let err = ClientConfig::from_lookup(lookup_from(&[("SPOTON_CLIENT_ID", "id")])).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Validation);

        let bad_timeout = ClientConfig::from_lookup(lookup_from(&[
            ("SPOTON_API_KEY", "abc"),
            ("SPOTON_TIMEOUT_SECS", "soon"),
        ]));
        assert!(bad_timeout.is_err());
    }

    #[test]
    fn test_overrides_keep_unset_fields() {
        let builder = ClientConfig::builder(Credential::api_key("k"))
            .base_url("https://sandbox-api.spoton.com")
            .retry(RetryPolicy::new(4, Duration::from_millis(10)))
            .overrides_from(lookup_from(&[("SPOTON_MAX_RETRIES", "1")]))
            .unwrap();
        let config = builder.build().unwrap();

        assert_eq!(config.base_url().host_str(), Some("sandbox-api.spoton.com"));
        assert_eq!(config.retry().max_retries, 1);
        assert_eq!(config.retry().initial_backoff, Duration::from_millis(10));
    }
}
