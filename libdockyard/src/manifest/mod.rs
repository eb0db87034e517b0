//! Manifest retrieval with media-type negotiation.
//!
//! A manifest is requested as a Docker V2 manifest first. If the registry
//! answers with anything but `200`, the request is repeated once asking for
//! an OCI V1 manifest. Some registries mishandle a multi-value `Accept`
//! header, so the two media types are never combined into one request, and
//! a non-200 is read as "wrong type or absent", not as a transient fault.

use crate::auth::BearerToken;
use crate::client::Client;
use crate::error::{DockyardError, Result};
use crate::oci::{DOCKER_MANIFEST_V2, Manifest, OCI_MANIFEST_V1};
use crate::reference::ImageReference;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use tracing::{debug, instrument};


/// Media types in the order they are requested.
pub const NEGOTIATION_ORDER: [&str; 2] = [DOCKER_MANIFEST_V2, OCI_MANIFEST_V1];

/// Fetches manifests from a registry.
#[derive(Debug, Clone)]
pub struct ManifestClient {
    client: Client,
}

impl ManifestClient {
    /// Creates a manifest client sharing `client`'s connection pool.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Fetches the manifest for `reference`.
    ///
    /// # Errors
    ///
    /// - `ImageNotFound` when neither media type yields a `200`
    /// - `RegistryUnreachable` on network failure
    #[instrument(skip(self, token), fields(reference = %reference, authenticated = token.is_some()))]
    pub async fn get_manifest(
        &self,
        reference: &ImageReference,
        token: Option<&BearerToken>,
    ) -> Result<Manifest> {
        let url = self.client.manifest_url(reference);

        for media_type in NEGOTIATION_ORDER {
            let mut request = self.client.get(&url).header(ACCEPT, media_type);
            if let Some(token) = token {
                request = request.header(AUTHORIZATION, token.to_header_value());
            }

            let response = self.client.send(request, &url).await?;
            let status = response.status();
            if status != StatusCode::OK {
                debug!(%status, media_type, "manifest not available as this media type");
                continue;
            }

            let content_type = header_string(&response, CONTENT_TYPE.as_str());
            let content_digest = header_string(&response, "Docker-Content-Digest");
            let body = self.client.read_body(response, &url).await?;

            let manifest = Manifest::from_bytes(&body, content_type.as_deref())
                .with_content_digest(content_digest);
            debug!(
                media_type = manifest.media_type.as_deref().unwrap_or("unknown"),
                "manifest retrieved"
            );
            return Ok(manifest);
        }

        Err(DockyardError::not_found(reference.to_string()))
    }

    /// Reports whether the manifest exists.
    ///
    /// `ImageNotFound` becomes `Ok(false)`; network failures stay errors so
    /// they are never mistaken for absence.
    pub async fn image_exists(
        &self,
        reference: &ImageReference,
        token: Option<&BearerToken>,
    ) -> Result<bool> {
        match self.get_manifest(reference, token).await {
            Ok(_) => Ok(true),
            Err(DockyardError::ImageNotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

fn header_string(response: &reqwest::Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}
