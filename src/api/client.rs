//! Signed HTTP client for the Letterboxd API.
//!
//! [`ApiClient`] is created once from an [`ApiConfig`] and reused for every
//! call, taking advantage of reqwest connection pooling. Cloning is cheap.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use super::error::ApiError;
use super::signing::{generate_nonce, sign, unix_timestamp};
use crate::config::ApiConfig;
use crate::fetch::RequestIssuer;

/// User-Agent sent with every request.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("lbxd/{version}")
}

/// HTTP client that signs each API request with the configured credentials.
///
/// # Example
///
/// ```no_run
/// use lbxd::{ApiClient, ApiConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ApiClient::new(ApiConfig::from_env()?)?;
/// let film = client.call("film/2bbs").await?;
/// println!("{}", film["name"]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    // Site lookups read the profile page's own status, so redirects are not followed
    site: Client,
    config: Arc<ApiConfig>,
}

impl ApiClient {
    /// Builds a client using the timeouts from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ClientBuild`] if reqwest rejects the configuration.
    #[instrument(level = "debug", skip(config), fields(api_base = %config.api_base()))]
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let http = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.read_timeout())
            .user_agent(default_user_agent())
            .gzip(true)
            .build()
            .map_err(|source| ApiError::ClientBuild { source })?;

        let site = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.read_timeout())
            .user_agent(default_user_agent())
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|source| ApiError::ClientBuild { source })?;

        Ok(Self {
            http,
            site,
            config: Arc::new(config),
        })
    }

    /// Returns the configuration this client was built with.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub(crate) fn site_http(&self) -> &Client {
        &self.site
    }

    /// Returns `{api_base}/{path}` without any signing parameters.
    #[must_use]
    pub fn endpoint_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.api_base(),
            path.trim_start_matches('/')
        )
    }

    /// Builds the fully signed URL for a GET on `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidUrl`] if the joined URL does not parse.
    pub fn signed_url(&self, path: &str) -> Result<Url, ApiError> {
        let endpoint = self.endpoint_url(path);
        let mut url = Url::parse(&endpoint).map_err(|_| ApiError::invalid_url(&endpoint))?;

        url.query_pairs_mut()
            .append_pair("apikey", self.config.api_key())
            .append_pair("nonce", &generate_nonce())
            .append_pair("timestamp", &unix_timestamp().to_string());

        let signature = sign(self.config.api_secret(), "GET", url.as_str(), "")
            .ok_or(ApiError::Signing { url: endpoint })?;
        url.query_pairs_mut().append_pair("signature", &signature);

        Ok(url)
    }

    /// Issues a signed GET for `path` and parses the body as JSON.
    ///
    /// # Errors
    ///
    /// - [`ApiError::NotFound`] for HTTP 404
    /// - [`ApiError::HttpStatus`] for any other non-success status
    /// - [`ApiError::Timeout`] / [`ApiError::Network`] for transport failures
    /// - [`ApiError::Decode`] if the body is not JSON
    #[instrument(skip(self), fields(path = %path))]
    pub async fn call(&self, path: &str) -> Result<Value, ApiError> {
        let endpoint = self.endpoint_url(path);
        let url = self.signed_url(path)?;

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ApiError::transport(&endpoint, e))?;

        let status = response.status();
        debug!(status = status.as_u16(), "API response");

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::not_found(endpoint));
        }
        if !status.is_success() {
            return Err(ApiError::http_status(endpoint, status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::transport(&endpoint, e))?;
        serde_json::from_str(&body).map_err(|e| ApiError::decode(endpoint, e.to_string()))
    }
}

#[async_trait]
impl RequestIssuer for ApiClient {
    async fn issue(&self, target: &str) -> Result<Value, ApiError> {
        self.call(target).await
    }
}
