//! Error types for dockyard
//!
//! Every fallible operation in the crate returns [`DockyardError`]. The
//! variants mirror the ways a resolution can go wrong: the reference string
//! itself is bad, the registry cannot be reached, the image is not there, or
//! the registry refused the credentials we presented.

use crate::reference::ImageReference;
use thiserror::Error;


/// Main error type for dockyard operations
#[derive(Error, Debug)]
pub enum DockyardError {
    /// No grammar accepted the input string
    #[error("Cannot parse image reference '{input}'")]
    UnparseableReference { input: String },

    /// More than one grammar accepted the input string
    #[error(
        "Cannot parse image reference '{input}': {} possible interpretations ({})",
        .candidates.len(),
        render_candidates(.candidates)
    )]
    AmbiguousReference {
        input: String,
        candidates: Vec<ImageReference>,
    },

    /// Network-level failure (connection, DNS, timeout, deadline)
    #[error("Registry unreachable: {message}")]
    RegistryUnreachable {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Manifest negotiation finished without a manifest
    #[error("Image not found: {reference}")]
    ImageNotFound { reference: String },

    /// Explicit 403 or a malformed authentication challenge
    #[error("Authentication rejected (status: {status_code:?}): {message}")]
    AuthenticationRejected {
        message: String,
        status_code: Option<u16>,
    },

    /// Configuration errors (invalid config file, unusable client settings)
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<String>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Result type alias for dockyard operations
pub type Result<T> = std::result::Result<T, DockyardError>;

fn render_candidates(candidates: &[ImageReference]) -> String {
    candidates
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl DockyardError {
    /// Creates a new unparseable reference error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libdockyard::error::DockyardError;
    ///
    /// let err = DockyardError::unparseable("not//valid");
    /// assert!(matches!(err, DockyardError::UnparseableReference { .. }));
    /// ```
    pub fn unparseable<S: Into<String>>(input: S) -> Self {
        Self::UnparseableReference {
            input: input.into(),
        }
    }

    /// Creates a new ambiguous reference error carrying every interpretation.
    pub fn ambiguous<S: Into<String>>(input: S, candidates: Vec<ImageReference>) -> Self {
        Self::AmbiguousReference {
            input: input.into(),
            candidates,
        }
    }

    /// Creates a new unreachable-registry error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libdockyard::error::DockyardError;
    ///
    /// let err = DockyardError::unreachable("connection refused");
    /// assert!(err.is_unreachable());
    /// ```
    pub fn unreachable<S: Into<String>>(message: S) -> Self {
        Self::RegistryUnreachable {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new unreachable-registry error with a source error.
    pub fn unreachable_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::RegistryUnreachable {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new image-not-found error.
    pub fn not_found<S: Into<String>>(reference: S) -> Self {
        Self::ImageNotFound {
            reference: reference.into(),
        }
    }

    /// Creates a new authentication error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libdockyard::error::DockyardError;
    ///
    /// let err = DockyardError::authentication("token request denied", Some(403));
    /// assert!(matches!(err, DockyardError::AuthenticationRejected { .. }));
    /// ```
    pub fn authentication<S: Into<String>>(message: S, status_code: Option<u16>) -> Self {
        Self::AuthenticationRejected {
            message: message.into(),
            status_code,
        }
    }

    /// Creates a new configuration error with a source error.
    pub fn config_with_source<S, E>(message: S, path: Option<S>, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Config {
            message: message.into(),
            path: path.map(|p| p.into()),
            source: Some(Box::new(source)),
        }
    }

    /// Returns true for network-level failures.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::RegistryUnreachable { .. })
    }

    /// Returns true for errors raised while parsing the reference string.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Self::UnparseableReference { .. } | Self::AmbiguousReference { .. }
        )
    }
}

impl From<config::ConfigError> for DockyardError {
    fn from(err: config::ConfigError) -> Self {
        DockyardError::config_with_source("Configuration error", None, err)
    }
}
