//! Working directory lookup from an image's config blob.
//!
//! This is advisory metadata: every step is best-effort and any failure
//! (no manifest, no config digest, blob fetch refused, unreadable JSON)
//! resolves to `/` instead of an error.

use crate::auth::{Authenticator, RegistryCredential};
use crate::client::Client;
use crate::error::Result;
use crate::manifest::ManifestClient;
use crate::oci::{CONFIG_BLOB_ACCEPT, DEFAULT_WORKING_DIR, ImageConfig, Manifest};
use crate::reference::ImageReference;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use std::path::PathBuf;
use tracing::{debug, instrument};

#[cfg(test)]
mod tests;

/// Resolves the configured working directory of an image.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    client: Client,
    authenticator: Authenticator,
    manifests: ManifestClient,
}

impl ConfigResolver {
    /// Creates a resolver sharing `client`'s connection pool.
    pub fn new(client: Client) -> Self {
        Self {
            authenticator: Authenticator::new(client.clone()),
            manifests: ManifestClient::new(client.clone()),
            client,
        }
    }

    /// Fetches the manifest, then the config blob, and returns `WorkingDir`.
    pub async fn working_directory(
        &self,
        reference: &ImageReference,
        credential: Option<&RegistryCredential>,
    ) -> PathBuf {
        let token = match self.authenticator.authenticate(reference, credential).await {
            Ok(token) => token,
            Err(e) => {
                debug!(error = %e, "authentication for manifest failed, using default working directory");
                return PathBuf::from(DEFAULT_WORKING_DIR);
            }
        };

        match self.manifests.get_manifest(reference, token.as_ref()).await {
            Ok(manifest) => {
                self.working_directory_for(reference, &manifest, credential)
                    .await
            }
            Err(e) => {
                debug!(error = %e, "manifest unavailable, using default working directory");
                PathBuf::from(DEFAULT_WORKING_DIR)
            }
        }
    }

    /// Same as [`working_directory`](Self::working_directory) for an already
    /// fetched manifest.
    #[instrument(skip(self, manifest, credential), fields(reference = %reference))]
    pub async fn working_directory_for(
        &self,
        reference: &ImageReference,
        manifest: &Manifest,
        credential: Option<&RegistryCredential>,
    ) -> PathBuf {
        match self.fetch_config(reference, manifest, credential).await {
            Ok(Some(config)) => config.working_directory(),
            Ok(None) => PathBuf::from(DEFAULT_WORKING_DIR),
            Err(e) => {
                debug!(error = %e, "config blob unavailable, using default working directory");
                PathBuf::from(DEFAULT_WORKING_DIR)
            }
        }
    }

    async fn fetch_config(
        &self,
        reference: &ImageReference,
        manifest: &Manifest,
        credential: Option<&RegistryCredential>,
    ) -> Result<Option<ImageConfig>> {
        let Some(digest) = manifest.config_digest() else {
            debug!("manifest has no usable config digest");
            return Ok(None);
        };

        // Tokens are single-purpose, so the blob gets its own.
        let token = self.authenticator.authenticate(reference, credential).await?;

        let url = self.client.blob_url(reference, &digest);
        let mut request = self.client.get(&url).header(ACCEPT, CONFIG_BLOB_ACCEPT);
        if let Some(token) = &token {
            request = request.header(AUTHORIZATION, token.to_header_value());
        }

        let response = self.client.send(request, &url).await?;
        if response.status() != StatusCode::OK {
            debug!(status = %response.status(), "config blob request failed");
            return Ok(None);
        }

        let body = self.client.read_body(response, &url).await?;
        if digest.verify(&body) == Some(false) {
            debug!(%digest, "config blob does not match its digest");
            return Ok(None);
        }

        Ok(Some(ImageConfig::from_bytes(&body)))
    }
}
