//! Demo settings.
//!
//! Read from `demo.toml` in the platform config directory (or the file named
//! by `SPOTON_DEMO_CONFIG`). `SPOTON_*` environment variables override the
//! file.
//!
//! ```toml
//! base_url = "https://sandbox-api.spoton.com"
//! location_id = "BL-1234-5678-9012"
//! log_level = "debug"
//!
//! [credentials]
//! apiKey = "your-api-key-here"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::Deserialize;
use spoton_core::{ClientConfig, Credential};

const CONFIG_FILE: &str = "demo.toml";
const DEFAULT_LOCATION_ID: &str = "BL-1234-5678-9012";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DemoSettings {
    /// Credentials as `{apiKey}` or `{clientId, clientSecret}`.
    pub credentials: Option<Credential>,

    /// API endpoint; the production API when unset.
    pub base_url: Option<String>,

    /// Location to fetch.
    pub location_id: String,

    /// Logging level used when `RUST_LOG` is not set.
    pub log_level: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: Option<u64>,

    /// Re-authenticate once when a request is answered with 401.
    pub reauthenticate_on_unauthorized: bool,

    /// Path to the configuration file that was loaded.
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            credentials: None,
            base_url: None,
            location_id: DEFAULT_LOCATION_ID.to_string(),
            log_level: "info".to_string(),
            timeout_secs: None,
            reauthenticate_on_unauthorized: false,
            config_path: None,
        }
    }
}

impl DemoSettings {
    /// Load from the default location, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = std::env::var_os("SPOTON_DEMO_CONFIG")
            .map(PathBuf::from)
            .or_else(default_config_path);

        let mut settings = match path {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        settings.apply_overrides(|name| std::env::var(name).ok());
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {:?}", path))?;
        let mut settings: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse settings from {:?}", path))?;
        settings.config_path = Some(path.to_path_buf());
        Ok(settings)
    }

    /// Values that only the demo reads from the environment. Client
    /// settings such as the base URL are applied in
    /// [`client_config`](Self::client_config).
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(credential) = ClientConfig::credential_from(&lookup) {
            self.credentials = Some(credential);
        }
        if let Some(location_id) = lookup("SPOTON_LOCATION_ID") {
            self.location_id = location_id;
        }
    }

    /// Client configuration described by these settings, with the
    /// library's `SPOTON_*` overrides applied on top.
    pub fn client_config(&self) -> Result<ClientConfig> {
        self.client_config_from(|name| std::env::var(name).ok())
    }

    fn client_config_from(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<ClientConfig> {
        let Some(credential) = self.credentials.clone() else {
            bail!(
                "no credentials configured; set SPOTON_API_KEY, or SPOTON_CLIENT_ID and \
                 SPOTON_CLIENT_SECRET, or add a [credentials] table to {}",
                CONFIG_FILE
            );
        };

        let mut builder = ClientConfig::builder(credential)
            .reauthenticate_on_unauthorized(self.reauthenticate_on_unauthorized);
        if let Some(base_url) = &self.base_url {
            builder = builder.base_url(base_url.clone());
        }
        if let Some(secs) = self.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        builder
            .overrides_from(lookup)
            .context("Invalid SPOTON_* override")?
            .build()
            .context("Invalid client configuration")
    }
}

fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "spoton", "spoton-sdk").map(|d| d.config_dir().join(CONFIG_FILE))
}
