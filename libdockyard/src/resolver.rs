//! High-level resolution API.
//!
//! [`ImageResolver`] answers the two questions a session launcher asks about
//! an image reference: does the image exist, and what is its working
//! directory. It composes the parser, authenticator, manifest client and
//! config resolver, and turns registry trouble into plain answers.
//!
//! # Examples
//!
//! ```no_run
//! use libdockyard::{Availability, ImageResolver, RegistryCredential};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut resolver = ImageResolver::builder()
//!         .deadline(Duration::from_secs(10))
//!         .build()?;
//!
//!     let credential = RegistryCredential::oauth2("glpat-...");
//!     let resolution = resolver
//!         .resolve("registry.gitlab.com/group/project/image:1.0", Some(&credential))
//!         .await?;
//!
//!     if resolution.availability == Availability::Present {
//!         println!("working directory: {}", resolution.working_directory.display());
//!     }
//!     Ok(())
//! }
//! ```

use crate::auth::{Authenticator, RegistryCredential};
use crate::cache::{ManifestKey, ManifestMemo};
use crate::client::{Client, ClientConfig};
use crate::config::Config;
use crate::error::{DockyardError, Result};
use crate::manifest::ManifestClient;
use crate::oci::{DEFAULT_WORKING_DIR, Manifest};
use crate::reference::ImageReference;
use crate::workdir::ConfigResolver;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, instrument, trace, warn};

/// Whether an image could be found on its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    /// A manifest was retrieved.
    Present,
    /// The registry answered but has no such manifest, or refused an
    /// anonymous request.
    Absent,
    /// The registry could not be reached before the timeout or deadline.
    Unreachable,
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Availability::Present => "present",
            Availability::Absent => "absent",
            Availability::Unreachable => "unreachable",
        };
        f.write_str(s)
    }
}

/// Outcome of resolving one reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub reference: ImageReference,
    pub availability: Availability,
    /// `/` unless the image is present and configures one.
    pub working_directory: PathBuf,
}

impl Resolution {
    fn unavailable(reference: ImageReference, availability: Availability) -> Self {
        Self {
            reference,
            availability,
            working_directory: PathBuf::from(DEFAULT_WORKING_DIR),
        }
    }

    /// Returns true when the image was found.
    pub fn exists(&self) -> bool {
        self.availability == Availability::Present
    }
}

/// Resolves image references against their registries.
///
/// One resolver is meant to serve one inbound request: it remembers the last
/// manifest it fetched so that `exists` followed by `working_directory` on the
/// same reference costs a single manifest lookup.
pub struct ImageResolver {
    authenticator: Authenticator,
    manifests: ManifestClient,
    configs: ConfigResolver,
    memo: ManifestMemo,
    deadline: Option<Duration>,
}

impl ImageResolver {
    /// Creates a resolver on top of an existing client.
    pub fn new(client: Client) -> Self {
        Self {
            authenticator: Authenticator::new(client.clone()),
            manifests: ManifestClient::new(client.clone()),
            configs: ConfigResolver::new(client),
            memo: ManifestMemo::new(),
            deadline: None,
        }
    }

    /// Returns a builder for a resolver with custom settings.
    pub fn builder() -> ImageResolverBuilder {
        ImageResolverBuilder::new()
    }

    /// Creates a resolver from loaded configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use libdockyard::{Config, ImageResolver};
    ///
    /// let config = Config::from_yaml_str("network:\n  deadline: 5").unwrap();
    /// let resolver = ImageResolver::from_config(&config).unwrap();
    /// assert_eq!(resolver.deadline(), Some(std::time::Duration::from_secs(5)));
    /// ```
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut builder = ImageResolverBuilder::new().client_config(config.to_client_config());
        if let Some(deadline) = config.deadline() {
            builder = builder.deadline(deadline);
        }
        builder.build()
    }

    /// End-to-end limit applied to [`resolve`](Self::resolve).
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Parses `raw` and determines availability and working directory.
    ///
    /// # Errors
    ///
    /// - `UnparseableReference` / `AmbiguousReference` for a bad reference
    /// - `AuthenticationRejected` when the supplied credential was refused
    ///
    /// Every other registry failure is reported through
    /// [`Resolution::availability`].
    #[instrument(skip(self, credential), fields(authenticated = credential.is_some()))]
    pub async fn resolve(
        &mut self,
        raw: &str,
        credential: Option<&RegistryCredential>,
    ) -> Result<Resolution> {
        let reference = ImageReference::parse(raw)?;

        let Some(limit) = self.deadline else {
            return self.resolve_reference(reference, credential).await;
        };

        match tokio::time::timeout(limit, self.resolve_reference(reference.clone(), credential))
            .await
        {
            Ok(resolution) => resolution,
            Err(_) => {
                warn!(reference = %reference, ?limit, "resolution deadline expired");
                Ok(Resolution::unavailable(reference, Availability::Unreachable))
            }
        }
    }

    async fn resolve_reference(
        &mut self,
        reference: ImageReference,
        credential: Option<&RegistryCredential>,
    ) -> Result<Resolution> {
        let manifest = match self.lookup_manifest(&reference, credential).await {
            Ok(manifest) => manifest,
            Err(e) => {
                let availability = degrade(e, credential)?;
                return Ok(Resolution::unavailable(reference, availability));
            }
        };

        let working_directory = self
            .configs
            .working_directory_for(&reference, &manifest, credential)
            .await;

        Ok(Resolution {
            reference,
            availability: Availability::Present,
            working_directory,
        })
    }

    /// Reports whether the image exists.
    ///
    /// Unreachable registries and refused anonymous requests read as
    /// `Ok(false)`; a refused credential is an error.
    pub async fn exists(
        &mut self,
        reference: &ImageReference,
        credential: Option<&RegistryCredential>,
    ) -> Result<bool> {
        match self.lookup_manifest(reference, credential).await {
            Ok(_) => Ok(true),
            Err(e) => degrade(e, credential).map(|_| false),
        }
    }

    /// Returns the image's configured working directory, or `/`.
    pub async fn working_directory(
        &mut self,
        reference: &ImageReference,
        credential: Option<&RegistryCredential>,
    ) -> PathBuf {
        match self.lookup_manifest(reference, credential).await {
            Ok(manifest) => {
                self.configs
                    .working_directory_for(reference, &manifest, credential)
                    .await
            }
            Err(e) => {
                debug!(error = %e, "no manifest, using default working directory");
                PathBuf::from(DEFAULT_WORKING_DIR)
            }
        }
    }

    async fn lookup_manifest(
        &mut self,
        reference: &ImageReference,
        credential: Option<&RegistryCredential>,
    ) -> Result<Manifest> {
        let key = ManifestKey::new(reference, credential);
        if let Some(manifest) = self.memo.get(&key) {
            trace!(reference = %reference, "manifest memo hit");
            return Ok(manifest.clone());
        }

        let token = self.authenticator.authenticate(reference, credential).await?;
        let manifest = self.manifests.get_manifest(reference, token.as_ref()).await?;
        self.memo.store(key, manifest.clone());
        Ok(manifest)
    }
}

/// Maps a registry error to an availability, or keeps it as an error when a
/// supplied credential was refused.
fn degrade(error: DockyardError, credential: Option<&RegistryCredential>) -> Result<Availability> {
    match error {
        DockyardError::AuthenticationRejected { .. } if credential.is_some() => Err(error),
        DockyardError::RegistryUnreachable { .. } => {
            warn!(error = %error, "registry unreachable");
            Ok(Availability::Unreachable)
        }
        DockyardError::ImageNotFound { .. } => {
            debug!(error = %error, "image not found");
            Ok(Availability::Absent)
        }
        other => {
            warn!(error = %other, "treating image as absent");
            Ok(Availability::Absent)
        }
    }
}

/// Builder for an [`ImageResolver`] with custom settings.
///
/// # Examples
///
/// ```
/// use libdockyard::ImageResolver;
/// use std::time::Duration;
///
/// let resolver = ImageResolver::builder()
///     .timeout(5)
///     .deadline(Duration::from_secs(20))
///     .plain_http_host("localhost:5000")
///     .build()
///     .unwrap();
/// assert_eq!(resolver.deadline(), Some(Duration::from_secs(20)));
/// ```
#[derive(Debug, Default)]
pub struct ImageResolverBuilder {
    client: ClientConfig,
    deadline: Option<Duration>,
}

impl ImageResolverBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-request HTTP timeout in seconds.
    pub fn timeout(mut self, seconds: u64) -> Self {
        self.client = self.client.with_timeout(seconds);
        self
    }

    /// Limit on a whole [`ImageResolver::resolve`] call.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Reach `host` over `http://`.
    pub fn plain_http_host(mut self, host: impl Into<String>) -> Self {
        self.client = self.client.with_plain_http_host(host);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.client = self.client.with_user_agent(user_agent);
        self
    }

    /// Replace all HTTP client settings at once.
    pub fn client_config(mut self, config: ClientConfig) -> Self {
        self.client = config;
        self
    }

    /// Build the resolver.
    pub fn build(self) -> Result<ImageResolver> {
        let client = Client::with_config(self.client)?;
        let mut resolver = ImageResolver::new(client);
        resolver.deadline = self.deadline;
        Ok(resolver)
    }
}
