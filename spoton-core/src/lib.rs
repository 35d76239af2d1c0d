//! # SpotOn Core
//!
//! Authenticating HTTP client for the SpotOn API.
//!
//! This crate provides:
//! - [`Credential`] - API key or OAuth client credentials
//! - [`TokenStore`] / [`Authenticator`] - Token exchange, caching and refresh
//! - [`Transport`] - Authenticated requests with timeouts, retries and a typed error taxonomy
//! - Resource clients ([`BusinessResource`], [`MenusResource`]) with awaitable
//!   and callback-style operations
//! - [`SpotOnClient`] - The composition root tying these together
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use spoton_core::{SpotOnClient, ErrorKind};
//!
//! # async fn example() {
//! let client = SpotOnClient::with_api_key("your-api-key-here").unwrap();
//!
//! match client.authenticate().await {
//!     Ok(()) => {}
//!     Err(e) if e.kind() == ErrorKind::Authentication => {
//!         eprintln!("check your credentials: {}", e.message());
//!         return;
//!     }
//!     Err(e) => {
//!         eprintln!("could not reach SpotOn: {}", e);
//!         return;
//!     }
//! }
//!
//! // Awaitable form
//! let location = client.business().get_location("BL-1234-5678-9012").await;
//!
//! // Callback form, same request underneath
//! let handle = client.business().get_location_with("BL-1234-5678-9012", |result| {
//!     if let Ok(Some(location)) = result {
//!         println!("{}", location.name);
//!     }
//! });
//! handle.finished().await;
//! # let _ = location;
//! # }
//! ```

pub mod auth;
pub mod call;
pub mod client;
pub mod config;
pub mod credential;
pub mod error;
pub mod http;
pub mod ids;
pub mod model;
pub mod resources;
pub mod token;
pub mod transport;

// Re-export commonly used types at crate root
pub use auth::Authenticator;

pub use call::CallHandle;

pub use client::SpotOnClient;

pub use config::{
    ClientConfig,
    ClientConfigBuilder,
    RetryPolicy,
    DEFAULT_BASE_URL,
};

pub use credential::{
    Credential,
    Secret,
};

pub use error::{
    ErrorKind,
    Result,
    SpotOnError,
};

pub use http::{
    HttpBackend,
    HttpRequest,
    HttpResponse,
    ReqwestBackend,
};

pub use ids::LocationId;

pub use model::{
    Address,
    Geolocation,
    Location,
    Menu,
};

pub use resources::{
    BusinessResource,
    MenusResource,
};

pub use token::{
    StoredToken,
    Token,
    TokenStore,
};

pub use transport::Transport;
