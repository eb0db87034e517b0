//! Single-entry memo of the most recent manifest lookup.
//!
//! `exists` and `working_directory` on the same resolver usually ask for the
//! same manifest back to back. The memo remembers the last result so the
//! second call skips the probe, token exchange and manifest request. It holds
//! exactly one entry, never expires, and lives only as long as its resolver.

use crate::auth::RegistryCredential;
use crate::oci::Manifest;
use crate::reference::ImageReference;

#[cfg(test)]
mod tests;

/// Identity of a manifest lookup.
///
/// The credential is kept as a sha256 fingerprint so the key never holds the
/// secret itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ManifestKey {
    registry_host: String,
    repository: String,
    target: String,
    credential: Option<String>,
}

impl ManifestKey {
    /// Builds the key for looking up `reference` with `credential`.
    pub fn new(reference: &ImageReference, credential: Option<&RegistryCredential>) -> Self {
        Self {
            registry_host: reference.registry_host().to_string(),
            repository: reference.repository().to_string(),
            target: reference.manifest_reference(),
            credential: credential.map(RegistryCredential::fingerprint),
        }
    }
}

/// Remembers one `(key, manifest)` pair.
#[derive(Debug, Default)]
pub struct ManifestMemo {
    entry: Option<(ManifestKey, Manifest)>,
}

impl ManifestMemo {
    /// Creates an empty memo.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the remembered manifest if it was stored under `key`.
    pub fn get(&self, key: &ManifestKey) -> Option<&Manifest> {
        match &self.entry {
            Some((stored, manifest)) if stored == key => Some(manifest),
            _ => None,
        }
    }

    /// Replaces the remembered entry.
    pub fn store(&mut self, key: ManifestKey, manifest: Manifest) {
        self.entry = Some((key, manifest));
    }
}
