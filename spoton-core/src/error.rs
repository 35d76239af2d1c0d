//! Error taxonomy for the SpotOn client.
//!
//! Every failure surfaced to callers is a [`SpotOnError`]. Each variant maps
//! to one machine-readable [`ErrorKind`], carries a human-readable message
//! and, where the API supplied them, a provider error code and a structured
//! details payload.

use std::fmt;

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Maximum length for response bodies quoted in error messages.
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SpotOnError>;

/// Machine-readable classification of a [`SpotOnError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad or expired credentials, or a 401 from the API.
    Authentication,
    /// Connectivity failures, timeouts, and 5xx responses after retries.
    Network,
    /// A well-formed 4xx application error.
    Api,
    /// A response body that does not match the expected shape.
    Serialization,
    /// Malformed input rejected before anything was sent.
    Validation,
}

impl ErrorKind {
    /// The stable name of this kind, e.g. `"AuthenticationError"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Authentication => "AuthenticationError",
            ErrorKind::Network => "NetworkError",
            ErrorKind::Api => "ApiError",
            ErrorKind::Serialization => "SerializationError",
            ErrorKind::Validation => "ValidationError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for all SpotOn client operations.
#[derive(Debug, Clone, Error)]
pub enum SpotOnError {
    /// Credentials were rejected, no token is available, or the API
    /// answered 401.
    #[error("authentication failed: {message}")]
    Authentication {
        message: String,
        code: Option<String>,
        details: Option<Value>,
    },

    /// The request could not be completed (DNS, connect, timeout, or a
    /// server error that persisted through all retries).
    #[error("network error: {message}")]
    Network { message: String },

    /// The API rejected the request with a structured 4xx error.
    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
        details: Option<Value>,
    },

    /// The response body could not be decoded into the expected type.
    #[error("serialization error: {message}")]
    Serialization { message: String },

    /// Input was rejected locally before dispatch.
    #[error("validation error: {message}")]
    Validation { message: String },
}

impl SpotOnError {
    /// Authentication failure with no provider code or details.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
            code: None,
            details: None,
        }
    }

    /// Transport failure: no usable response was obtained.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// A request or response body could not be encoded or decoded.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Input rejected locally before any request was made.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// The machine-readable kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SpotOnError::Authentication { .. } => ErrorKind::Authentication,
            SpotOnError::Network { .. } => ErrorKind::Network,
            SpotOnError::Api { .. } => ErrorKind::Api,
            SpotOnError::Serialization { .. } => ErrorKind::Serialization,
            SpotOnError::Validation { .. } => ErrorKind::Validation,
        }
    }

    /// The human-readable message, without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            SpotOnError::Authentication { message, .. }
            | SpotOnError::Network { message }
            | SpotOnError::Api { message, .. }
            | SpotOnError::Serialization { message }
            | SpotOnError::Validation { message } => message,
        }
    }

    /// The provider error code, when the API returned one.
    pub fn code(&self) -> Option<&str> {
        match self {
            SpotOnError::Authentication { code, .. } | SpotOnError::Api { code, .. } => {
                code.as_deref()
            }
            _ => None,
        }
    }

    /// The structured error details, when the API returned any.
    pub fn details(&self) -> Option<&Value> {
        match self {
            SpotOnError::Authentication { details, .. } | SpotOnError::Api { details, .. } => {
                details.as_ref()
            }
            _ => None,
        }
    }

    /// HTTP status of an [`SpotOnError::Api`] error.
    pub fn status(&self) -> Option<u16> {
        match self {
            SpotOnError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the failure is transient and the request may be re-sent.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SpotOnError::Network { .. })
    }

    /// Re-label any failure as an authentication failure, keeping the
    /// provider code and details. Used for errors raised during a token
    /// exchange.
    pub(crate) fn into_authentication(self) -> Self {
        match self {
            SpotOnError::Authentication { .. } => self,
            SpotOnError::Api {
                code,
                message,
                details,
                ..
            } => SpotOnError::Authentication {
                message,
                code,
                details,
            },
            other => SpotOnError::authentication(other.to_string()),
        }
    }

    /// Build an error from a non-success HTTP response.
    ///
    /// 401 maps to [`ErrorKind::Authentication`], 5xx to
    /// [`ErrorKind::Network`], anything else to [`ErrorKind::Api`].
    pub fn from_status(status: StatusCode, body: &[u8]) -> Self {
        let provider = ProviderError::parse(body);
        let fallback = || {
            let text = String::from_utf8_lossy(body);
            if text.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("no response body")
                    .to_string()
            } else {
                truncate_body(text.trim())
            }
        };

        match status.as_u16() {
            401 => {
                let ProviderError {
                    code,
                    message,
                    details,
                } = provider.unwrap_or_default();
                SpotOnError::Authentication {
                    message: message.unwrap_or_else(|| "unauthorized".to_string()),
                    code,
                    details,
                }
            }
            500..=599 => SpotOnError::network(format!("server error {}: {}", status, fallback())),
            _ => {
                let ProviderError {
                    code,
                    message,
                    details,
                } = provider.unwrap_or_default();
                SpotOnError::Api {
                    status: status.as_u16(),
                    code,
                    message: message.unwrap_or_else(fallback),
                    details,
                }
            }
        }
    }
}

impl From<serde_json::Error> for SpotOnError {
    fn from(err: serde_json::Error) -> Self {
        SpotOnError::serialization(err.to_string())
    }
}

/// Truncate a response body to avoid logging excessive data.
fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }
    let mut cut = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}... (truncated, {} total bytes)", &body[..cut], body.len())
}

/// Error payload as returned by the API.
///
/// Accepts the flat `{code, message, details}` shape, the nested
/// `{error: {code, message, details}}` shape, and the OAuth
/// `{error, error_description}` shape.
#[derive(Debug, Default, PartialEq)]
struct ProviderError {
    code: Option<String>,
    message: Option<String>,
    details: Option<Value>,
}

#[derive(Deserialize)]
struct RawProviderError {
    #[serde(default)]
    code: Option<Value>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    details: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

impl ProviderError {
    fn parse(body: &[u8]) -> Option<Self> {
        let raw: RawProviderError = serde_json::from_slice(body).ok()?;
        Some(Self::from_raw(raw))
    }

    fn from_raw(raw: RawProviderError) -> Self {
        let mut parsed = ProviderError {
            code: raw.code.as_ref().and_then(value_to_code),
            message: raw.message.or(raw.error_description),
            details: raw.details,
        };

        match raw.error {
            Some(Value::String(error)) => {
                parsed.code.get_or_insert(error);
            }
            Some(nested @ Value::Object(_)) => {
                if let Ok(inner) = serde_json::from_value::<RawProviderError>(nested) {
                    let inner = Self::from_raw(inner);
                    parsed.code = parsed.code.or(inner.code);
                    parsed.message = parsed.message.or(inner.message);
                    parsed.details = parsed.details.or(inner.details);
                }
            }
            _ => {}
        }

        parsed
    }
}

fn value_to_code(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
