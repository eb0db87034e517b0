//! Dockyard - container image reference resolution
//!
//! Dockyard takes a user-supplied image reference such as `nginx:1.28` or
//! `registry.example.com/group/project/image@sha256:...`, works out which
//! registry and repository it names, checks that the image exists there, and
//! reads the working directory configured in the image.
//!
//! # Quick Start
//!
//! ```no_run
//! use libdockyard::ImageResolver;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut resolver = ImageResolver::builder().build()?;
//!
//!     let resolution = resolver.resolve("jupyter/minimal-notebook", None).await?;
//!     println!(
//!         "{} is {} (working directory {})",
//!         resolution.reference,
//!         resolution.availability,
//!         resolution.working_directory.display()
//!     );
//!     Ok(())
//! }
//! ```
//!
//! # Main Types
//!
//! - [`ImageResolver`] - Entry point: `resolve`, `exists`, `working_directory`
//! - [`ImageReference`] - Parsed, canonical image reference
//! - [`RegistryCredential`] - Per-request `oauth2` token credential
//! - [`Resolution`] / [`Availability`] - What a resolution found
//! - [`DockyardError`] - Every failure the crate reports
//!
//! # Behaviour worth knowing
//!
//! - A reference that more than one grammar accepts is rejected with
//!   [`DockyardError::AmbiguousReference`]; nothing is guessed.
//! - Manifests are requested as Docker V2 first and OCI V1 second.
//! - Registry failures never become errors at the facade, except a refused
//!   credential. A network failure is reported as
//!   [`Availability::Unreachable`], never as absence.

#![warn(clippy::all)]

/// Returns the libdockyard crate version.
///
/// # Examples
///
/// ```
/// let version = libdockyard::version();
/// assert!(!version.is_empty());
/// ```
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// High-level public API (main entry point)
mod resolver;
pub use resolver::{Availability, ImageResolver, ImageResolverBuilder, Resolution};

// Re-export commonly used types for convenience
pub use auth::RegistryCredential;
pub use config::Config;
pub use digest::Digest;
pub use error::{DockyardError, Result};
pub use reference::{ImageReference, Target};

// Building blocks, public for callers that need one step on its own
#[doc(hidden)]
pub mod auth;
#[doc(hidden)]
pub mod cache;
#[doc(hidden)]
pub mod client;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod digest;
#[doc(hidden)]
pub mod error;
#[doc(hidden)]
pub mod manifest;
#[doc(hidden)]
pub mod oci;
#[doc(hidden)]
pub mod reference;
#[doc(hidden)]
pub mod workdir;
