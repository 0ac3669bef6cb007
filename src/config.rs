//! API configuration: credentials, endpoint bases, and HTTP timeouts.
//!
//! Configuration is resolved once into an [`ApiConfig`] and handed to
//! [`ApiClient::new`](crate::api::ApiClient::new). Nothing in the request path
//! reads the environment.

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

/// Default base URL for the Letterboxd API.
pub const DEFAULT_API_BASE: &str = "https://api.letterboxd.com/api/v0";

/// Default base URL for the public Letterboxd site (used for member lookups).
pub const DEFAULT_SITE_BASE: &str = "https://letterboxd.com";

/// Default HTTP connect timeout (10 seconds).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default HTTP read timeout (30 seconds).
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment variable holding the API key.
pub const ENV_API_KEY: &str = "LBXD_KEY";

/// Environment variable holding the API secret.
pub const ENV_API_SECRET: &str = "LBXD_SECRET";

/// Optional override for [`DEFAULT_API_BASE`].
pub const ENV_API_BASE: &str = "LBXD_API_BASE";

/// Optional override for [`DEFAULT_SITE_BASE`].
pub const ENV_SITE_BASE: &str = "LBXD_SITE_BASE";

/// Errors raised while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is unset or blank.
    #[error("missing required setting {name}: set it in the environment or a .env file")]
    Missing {
        /// The variable name.
        name: &'static str,
    },
}

/// Connection settings for the Letterboxd API.
///
/// The secret is never printed: `Debug` redacts it.
#[derive(Clone)]
pub struct ApiConfig {
    api_base: String,
    site_base: String,
    api_key: String,
    api_secret: String,
    connect_timeout: Duration,
    read_timeout: Duration,
}

impl ApiConfig {
    /// Creates a configuration with default bases and timeouts.
    #[must_use]
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            site_base: DEFAULT_SITE_BASE.to_string(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    /// Reads credentials and optional base overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] if `LBXD_KEY` or `LBXD_SECRET` is unset or blank.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] if a required variable is absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let api_key = read(ENV_API_KEY).ok_or(ConfigError::Missing { name: ENV_API_KEY })?;
        let api_secret = read(ENV_API_SECRET).ok_or(ConfigError::Missing {
            name: ENV_API_SECRET,
        })?;

        let mut config = Self::new(api_key, api_secret);
        if let Some(base) = read(ENV_API_BASE) {
            config = config.with_api_base(base);
        }
        if let Some(base) = read(ENV_SITE_BASE) {
            config = config.with_site_base(base);
        }

        debug!(
            api_base = %config.api_base,
            site_base = %config.site_base,
            "resolved API configuration"
        );
        Ok(config)
    }

    /// Overrides the API base URL. A trailing slash is dropped.
    #[must_use]
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = trim_base(base.into());
        self
    }

    /// Overrides the public site base URL. A trailing slash is dropped.
    #[must_use]
    pub fn with_site_base(mut self, base: impl Into<String>) -> Self {
        self.site_base = trim_base(base.into());
        self
    }

    /// Overrides the HTTP connect and read timeouts.
    #[must_use]
    pub fn with_timeouts(mut self, connect: Duration, read: Duration) -> Self {
        self.connect_timeout = connect;
        self.read_timeout = read;
        self
    }

    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    #[must_use]
    pub fn site_base(&self) -> &str {
        &self.site_base
    }

    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub(crate) fn api_secret(&self) -> &str {
        &self.api_secret
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("api_base", &self.api_base)
            .field("site_base", &self.site_base)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("connect_timeout", &self.connect_timeout)
            .field("read_timeout", &self.read_timeout)
            .finish()
    }
}

fn trim_base(base: String) -> String {
    base.trim().trim_end_matches('/').to_string()
}
