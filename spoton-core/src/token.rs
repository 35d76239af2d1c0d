//! Bearer tokens and the per-client token store.
//!
//! This module provides:
//! - [`Token`] - A bearer value with an optional expiry
//! - [`TokenStore`] - Holds at most one token for a client instance
//! - [`StoredToken`] - A snapshot of the store tagged with its generation

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;

use crate::credential::Secret;
use crate::error::{Result, SpotOnError};

/// A bearer token granted by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    value: Secret,

    issued_at: DateTime<Utc>,

    /// When this token expires. `None` means it is treated as valid until
    /// the API answers 401.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Token {
    /// Create a token. Fails if the value is empty.
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = Secret::new(value);
        if value.is_empty() {
            return Err(SpotOnError::authentication(
                "identity provider returned an empty access token",
            ));
        }
        Ok(Self {
            value,
            issued_at: Utc::now(),
            expires_at: None,
        })
    }

    /// Set an absolute expiration time.
    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Set the expiration relative to now, as reported by `expires_in`.
    ///
    /// A lifetime too large to represent leaves the token without an
    /// expiry.
    pub fn expiring_in(self, seconds: i64) -> Self {
        match Duration::try_seconds(seconds).and_then(|d| Utc::now().checked_add_signed(d)) {
            Some(expires_at) => self.with_expiry(expires_at),
            None => self,
        }
    }

    /// [`expiring_in`](Self::expiring_in) for a `std` duration.
    pub fn expiring_after(self, lifetime: std::time::Duration) -> Self {
        match i64::try_from(lifetime.as_secs()) {
            Ok(seconds) => self.expiring_in(seconds),
            Err(_) => self,
        }
    }

    /// The secret bearer value.
    pub fn value(&self) -> &Secret {
        &self.value
    }

    /// Check if this token has expired.
    ///
    /// Returns `false` if no expiration is set.
    pub fn is_expired(&self) -> bool {
        self.expires_at.map(|exp| exp <= Utc::now()).unwrap_or(false)
    }

    /// Check if this token will expire within the given duration.
    pub fn expires_within(&self, duration: Duration) -> bool {
        self.expires_at
            .map(|exp| exp <= Utc::now() + duration)
            .unwrap_or(false)
    }

    /// Time between issue and expiry, if the token expires.
    pub fn lifetime(&self) -> Option<Duration> {
        self.expires_at.map(|exp| exp - self.issued_at)
    }

    /// The `Authorization` header value for this token.
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.value.expose())
    }
}

/// A token read from the store, with the generation it was written at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredToken {
    pub token: Token,
    /// Store generation the token was written at.
    pub generation: u64,
}

#[derive(Debug, Default)]
struct Slot {
    token: Option<Token>,
    generation: u64,
}

/// Process-local holder of the current token.
///
/// Reads hand out snapshots; a request in flight keeps the token it
/// started with even if the store is replaced meanwhile. Every write
/// bumps the generation counter so a late 401 for an old token cannot
/// clear a newer one.
#[derive(Debug, Default)]
pub struct TokenStore {
    slot: RwLock<Slot>,
}

impl TokenStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current token, if any.
    pub fn snapshot(&self) -> Option<StoredToken> {
        let slot = self.slot.read();
        slot.token.as_ref().map(|token| StoredToken {
            token: token.clone(),
            generation: slot.generation,
        })
    }

    /// Current write generation.
    pub fn generation(&self) -> u64 {
        self.slot.read().generation
    }

    /// Whether no token is stored.
    pub fn is_empty(&self) -> bool {
        self.slot.read().token.is_none()
    }

    /// Replace the stored token and return the new generation.
    pub(crate) fn replace(&self, token: Token) -> u64 {
        let mut slot = self.slot.write();
        slot.generation += 1;
        slot.token = Some(token);
        slot.generation
    }

    /// Remove the stored token.
    pub(crate) fn clear(&self) {
        let mut slot = self.slot.write();
        if slot.token.take().is_some() {
            slot.generation += 1;
        }
    }

    /// Remove the stored token only if it is still the one written at
    /// `generation`. Returns whether anything was cleared.
    pub(crate) fn clear_if_current(&self, generation: u64) -> bool {
        let mut slot = self.slot.write();
        if slot.generation != generation || slot.token.is_none() {
            return false;
        }
        slot.token = None;
        slot.generation += 1;
        true
    }
}
