//! Registry document types.
//!
//! Registries disagree in the details of the JSON they return, so documents
//! are read field by field from a `serde_json::Value` rather than through a
//! strict schema. Anything missing or of the wrong shape reads as absent.

use crate::digest::Digest;
use serde_json::Value;
use std::path::PathBuf;
use std::str::FromStr;


/// Docker image manifest, schema 2.
pub const DOCKER_MANIFEST_V2: &str = "application/vnd.docker.distribution.manifest.v2+json";

/// OCI image manifest, v1.
pub const OCI_MANIFEST_V1: &str = "application/vnd.oci.image.manifest.v1+json";

/// Accept header used for config blobs.
pub const CONFIG_BLOB_ACCEPT: &str = "application/json";

/// Working directory assumed when an image does not configure one.
pub const DEFAULT_WORKING_DIR: &str = "/";

/// An image manifest as far as this crate cares about it.
///
/// Only `config_digest` drives behaviour; the other fields are carried along
/// for callers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    /// `mediaType` from the body, else the response `Content-Type`
    pub media_type: Option<String>,
    /// `config.digest`
    pub config_digest: Option<String>,
    /// `layers`, untouched
    pub layers: Vec<Value>,
    /// `Docker-Content-Digest` response header
    pub content_digest: Option<String>,
}

impl Manifest {
    /// Reads a manifest body. Never fails; malformed input yields empty
    /// fields.
    ///
    /// # Examples
    ///
    /// ```
    /// use libdockyard::oci::Manifest;
    ///
    /// let manifest = Manifest::from_bytes(br#"{"config":{"digest":"sha256:abc"}}"#, None);
    /// assert_eq!(manifest.config_digest.as_deref(), Some("sha256:abc"));
    ///
    /// let manifest = Manifest::from_bytes(b"not json", Some("application/json"));
    /// assert_eq!(manifest.config_digest, None);
    /// ```
    pub fn from_bytes(bytes: &[u8], content_type: Option<&str>) -> Self {
        let value: Value = serde_json::from_slice(bytes).unwrap_or(Value::Null);

        let media_type = value
            .get("mediaType")
            .and_then(Value::as_str)
            .or(content_type)
            .map(|s| s.to_string());

        let config_digest = value
            .get("config")
            .and_then(|config| config.get("digest"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());

        let layers = value
            .get("layers")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        Self {
            media_type,
            config_digest,
            layers,
            content_digest: None,
        }
    }

    /// Attaches the digest the registry reported for this manifest.
    pub fn with_content_digest(mut self, digest: Option<String>) -> Self {
        self.content_digest = digest;
        self
    }

    /// Returns the config digest if present and well-formed.
    pub fn config_digest(&self) -> Option<Digest> {
        self.config_digest
            .as_deref()
            .and_then(|d| Digest::from_str(d).ok())
    }
}

/// The part of an image config blob this crate reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageConfig {
    /// `config.WorkingDir`
    pub working_dir: Option<String>,
}

impl ImageConfig {
    /// Reads a config blob. Never fails.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let value: Value = serde_json::from_slice(bytes).unwrap_or(Value::Null);

        let working_dir = value
            .get("config")
            .and_then(|config| config.get("WorkingDir"))
            .and_then(Value::as_str)
            .map(|s| s.to_string());

        Self { working_dir }
    }

    /// The configured working directory, or `/` when absent or empty.
    pub fn working_directory(&self) -> PathBuf {
        match self.working_dir.as_deref() {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => PathBuf::from(DEFAULT_WORKING_DIR),
        }
    }
}
