//! HTTP client for registry communication.
//!
//! A thin layer over reqwest shared by the authenticator, the manifest client
//! and the config resolver. It owns connection pooling and timeouts, maps a
//! registry host to its base URL, and translates transport failures into
//! [`DockyardError::RegistryUnreachable`] in one place.

use crate::digest::Digest;
use crate::error::{DockyardError, Result};
use crate::reference::ImageReference;
use reqwest::{Client as ReqwestClient, RequestBuilder, Response};
use std::time::Duration;
use tracing::debug;


/// Configuration for the HTTP client.
///
/// # Examples
///
/// ```
/// use libdockyard::client::ClientConfig;
///
/// let config = ClientConfig::new()
///     .with_timeout(60)
///     .with_plain_http_host("localhost:5000");
/// assert!(config.is_plain_http("localhost:5000"));
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout in seconds (default: 30)
    pub timeout_seconds: u64,
    /// Maximum idle connections per host (default: 10)
    pub max_idle_per_host: usize,
    /// User-Agent header sent with every request
    pub user_agent: String,
    /// Registry hosts reached over `http://` instead of `https://`
    pub plain_http_hosts: Vec<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            max_idle_per_host: 10,
            user_agent: format!("dockyard/{}", env!("CARGO_PKG_VERSION")),
            plain_http_hosts: Vec::new(),
        }
    }
}

impl ClientConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the request timeout in seconds.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Sets the maximum idle connections per host.
    pub fn with_max_idle_per_host(mut self, max: usize) -> Self {
        self.max_idle_per_host = max;
        self
    }

    /// Sets the User-Agent header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Marks a registry host as plain HTTP.
    pub fn with_plain_http_host(mut self, host: impl Into<String>) -> Self {
        self.plain_http_hosts.push(host.into());
        self
    }

    /// Returns true when `host` should be contacted over `http://`.
    pub fn is_plain_http(&self, host: &str) -> bool {
        self.plain_http_hosts.iter().any(|h| h == host)
    }
}

/// HTTP client for registry operations.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct Client {
    http_client: ReqwestClient,
    config: ClientConfig,
}

impl Client {
    /// Creates a client with default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Creates a client with custom configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use libdockyard::client::{Client, ClientConfig};
    ///
    /// let client = Client::with_config(ClientConfig::new().with_timeout(5)).unwrap();
    /// assert_eq!(client.registry_url("ghcr.io"), "https://ghcr.io");
    /// ```
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .pool_max_idle_per_host(config.max_idle_per_host)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                DockyardError::config_with_source("Failed to create HTTP client", None, e)
            })?;

        Ok(Self {
            http_client,
            config,
        })
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the base URL for a registry host, without trailing slash.
    pub fn registry_url(&self, host: &str) -> String {
        let scheme = if self.config.is_plain_http(host) {
            "http"
        } else {
            "https"
        };
        format!("{}://{}", scheme, host)
    }

    /// `GET /v2/<name>/manifests/<reference>` for an image reference.
    pub fn manifest_url(&self, reference: &ImageReference) -> String {
        format!(
            "{}/v2/{}/manifests/{}",
            self.registry_url(reference.registry_host()),
            reference.repository(),
            reference.manifest_reference()
        )
    }

    /// `GET /v2/<name>/blobs/<digest>` within the reference's repository.
    pub fn blob_url(&self, reference: &ImageReference, digest: &Digest) -> String {
        format!(
            "{}/v2/{}/blobs/{}",
            self.registry_url(reference.registry_host()),
            reference.repository(),
            digest
        )
    }

    /// Starts a GET request.
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.http_client.get(url)
    }

    /// Sends a request, translating transport failures.
    ///
    /// Any HTTP status is returned as `Ok`; interpreting it is up to the
    /// caller.
    pub async fn send(&self, request: RequestBuilder, url: &str) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| self.translate_reqwest_error(e, url))?;
        debug!(url = %url, status = %response.status(), "registry responded");
        Ok(response)
    }

    /// Reads a response body, translating transport failures.
    pub async fn read_body(&self, response: Response, url: &str) -> Result<Vec<u8>> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.translate_reqwest_error(e, url))?;
        Ok(bytes.to_vec())
    }

    /// Translates a reqwest error into a DockyardError.
    pub(crate) fn translate_reqwest_error(&self, error: reqwest::Error, url: &str) -> DockyardError {
        if error.is_timeout() {
            DockyardError::unreachable_with_source(
                format!(
                    "Request to {} timed out after {} seconds",
                    url, self.config.timeout_seconds
                ),
                error,
            )
        } else if error.is_connect() {
            DockyardError::unreachable_with_source(format!("Failed to connect to {}", url), error)
        } else if error.is_builder() {
            DockyardError::unreachable_with_source(format!("Invalid request URL {}", url), error)
        } else {
            DockyardError::unreachable_with_source(
                format!("Network error communicating with {}", url),
                error,
            )
        }
    }
}
