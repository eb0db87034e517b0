//! OCI content digest validation and verification.
//!
//! This module wraps `oci_spec::image::Digest` so digests coming from user
//! input (`image@sha256:...`) or registry documents (`config.digest`) go
//! through the same validation, and adds content verification for fetched
//! blobs.

use crate::error::{DockyardError, Result};
use oci_spec::image::{Digest as OciDigest, DigestAlgorithm};
use sha2::{Digest as Sha2Digest, Sha256, Sha512};
use std::fmt;
use std::str::FromStr;


/// A validated content digest such as `sha256:7173b8...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest(OciDigest);

impl FromStr for Digest {
    type Err = DockyardError;

    fn from_str(s: &str) -> Result<Self> {
        let oci_digest = OciDigest::from_str(s).map_err(|e| DockyardError::UnparseableReference {
            input: format!("{} (invalid digest: {})", s, e),
        })?;
        Ok(Digest(oci_digest))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Digest {
    /// Returns the algorithm part, e.g. `sha256`.
    pub fn algorithm(&self) -> &DigestAlgorithm {
        self.0.algorithm()
    }

    /// Returns the encoded hash part after the colon.
    pub fn encoded(&self) -> &str {
        self.0.digest()
    }

    /// Checks that `content` hashes to this digest.
    ///
    /// Returns `None` when the algorithm is not one we can compute, so callers
    /// can decide whether an unverifiable blob is acceptable.
    ///
    /// # Examples
    ///
    /// ```
    /// use libdockyard::digest::Digest;
    /// use std::str::FromStr;
    ///
    /// let digest = Digest::from_str(
    ///     "sha256:2c26b46b68ffc68ff99b453c1d30413413422d706483bfa0f98a5e886266e7ae",
    /// ).unwrap();
    /// assert_eq!(digest.verify(b"foo"), Some(true));
    /// assert_eq!(digest.verify(b"bar"), Some(false));
    /// ```
    pub fn verify(&self, content: &[u8]) -> Option<bool> {
        let computed = match self.algorithm() {
            DigestAlgorithm::Sha256 => format!("{:x}", Sha256::digest(content)),
            DigestAlgorithm::Sha512 => format!("{:x}", Sha512::digest(content)),
            _ => return None,
        };
        Some(computed == self.encoded())
    }
}
