//! The composition root.

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::auth::Authenticator;
use crate::call::CallHandle;
use crate::config::ClientConfig;
use crate::credential::Credential;
use crate::error::Result;
use crate::http::{Dispatcher, HttpBackend, ReqwestBackend};
use crate::resources::{BusinessResource, MenusResource};
use crate::token::TokenStore;
use crate::transport::Transport;

/// Client for the SpotOn API.
///
/// Owns one credential, one token store, one authenticator and one
/// transport. Resource clients are created on first use and share them.
/// Independent clients (for example with different credentials) can live
/// side by side in one process.
///
/// # Example
///
/// ```no_run
/// use spoton_core::SpotOnClient;
///
/// # async fn example() -> spoton_core::Result<()> {
/// let client = SpotOnClient::with_api_key("your-api-key-here")?;
/// client.authenticate().await?;
///
/// if let Some(location) = client.business().get_location("BL-1234-5678-9012").await? {
///     println!("{} ({})", location.name, location.id);
/// }
/// # Ok(())
/// # }
/// ```
pub struct SpotOnClient {
    config: ClientConfig,
    auth: Arc<Authenticator>,
    transport: Arc<Transport>,
    business: OnceLock<BusinessResource>,
    menus: OnceLock<MenusResource>,
}

impl SpotOnClient {
    /// Create a client that talks HTTP through `reqwest`.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let backend = ReqwestBackend::new(config.timeout())?;
        Ok(Self::with_backend(config, Arc::new(backend)))
    }

    /// Client for the production API using an API key.
    pub fn with_api_key(key: impl Into<String>) -> Result<Self> {
        Self::new(ClientConfig::new(Credential::api_key(key))?)
    }

    /// Client for the production API using OAuth client credentials.
    pub fn with_client_credentials(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self> {
        Self::new(ClientConfig::new(Credential::client_credentials(
            client_id,
            client_secret,
        ))?)
    }

    /// Create a client on top of a custom [`HttpBackend`].
    pub fn with_backend(config: ClientConfig, backend: Arc<dyn HttpBackend>) -> Self {
        let dispatcher = Dispatcher::new(backend, config.retry(), config.timeout());
        let auth = Arc::new(Authenticator::new(
            config.credential().clone(),
            config.base_url().clone(),
            dispatcher.clone(),
            config.expiry_buffer(),
        ));
        let transport = Arc::new(Transport::new(
            config.base_url().clone(),
            dispatcher,
            auth.clone(),
            config.reauthenticate_on_unauthorized(),
        ));

        Self {
            config,
            auth,
            transport,
            business: OnceLock::new(),
            menus: OnceLock::new(),
        }
    }

    /// Authenticate, reusing a still-valid token.
    ///
    /// Every failure, including rejected credentials, is returned as an
    /// error. See [`try_authenticate`](Self::try_authenticate) for a boolean
    /// wrapper.
    pub async fn authenticate(&self) -> Result<()> {
        self.auth.authenticate(false).await.map(|_| ())
    }

    /// Authenticate with a new token exchange even if a valid token is
    /// stored.
    pub async fn reauthenticate(&self) -> Result<()> {
        self.auth.authenticate(true).await.map(|_| ())
    }

    /// [`authenticate`](Self::authenticate), reporting only whether the
    /// client is ready. The error is logged, not returned.
    pub async fn try_authenticate(&self) -> bool {
        match self.authenticate().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Authentication failed ({}): {}", e.kind(), e.message());
                false
            }
        }
    }

    /// Callback form of [`authenticate`](Self::authenticate).
    pub fn authenticate_with<F>(&self, callback: F) -> CallHandle
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        let auth = self.auth.clone();
        CallHandle::spawn(
            async move { auth.authenticate(false).await.map(|_| ()) },
            callback,
        )
    }

    /// Whether a token is stored and not about to expire.
    pub fn is_authenticated(&self) -> bool {
        self.auth
            .store()
            .snapshot()
            .is_some_and(|stored| self.auth.is_fresh(&stored.token))
    }

    /// Forget the current token.
    pub fn sign_out(&self) {
        self.auth.sign_out();
    }

    /// The token store owned by this client.
    pub fn token_store(&self) -> &TokenStore {
        self.auth.store()
    }

    /// Configuration the client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Shared transport, for calls not covered by a resource client.
    pub fn transport(&self) -> &Arc<Transport> {
        &self.transport
    }

    /// Business resource (locations).
    pub fn business(&self) -> &BusinessResource {
        self.business
            .get_or_init(|| BusinessResource::new(self.transport.clone()))
    }

    /// Menus resource.
    pub fn menus(&self) -> &MenusResource {
        self.menus
            .get_or_init(|| MenusResource::new(self.transport.clone()))
    }
}

impl fmt::Debug for SpotOnClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpotOnClient")
            .field("base_url", &self.config.base_url().as_str())
            .field("credential", &self.config.credential().mode())
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
