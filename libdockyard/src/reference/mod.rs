//! Image reference parsing.
//!
//! A raw string such as `nginx`, `user/app:1.0` or
//! `gitlab.example.com/group/project/image@sha256:...` is matched against an
//! ordered list of grammars. Each grammar is an independent matcher that
//! tokenizes the input and applies its own defaults. The parse succeeds only
//! when exactly one grammar accepts the whole string; when several do, the
//! string names different images depending on how it is read, and parsing
//! fails with every interpretation attached.

use crate::digest::Digest;
use crate::error::{DockyardError, Result};
use std::fmt;
use std::str::FromStr;
use tracing::trace;


/// Registry used when the reference does not name one.
pub const DEFAULT_REGISTRY: &str = "registry-1.docker.io";

/// Namespace for single-segment Docker Hub images (`nginx` -> `library/nginx`).
pub const DEFAULT_NAMESPACE: &str = "library";

/// Tag used when the reference carries neither a tag nor a digest.
pub const DEFAULT_TAG: &str = "latest";

/// Docker Hub host names. Hub images always carry a namespace, so these
/// never front a top-level repository.
const DOCKER_HUB_HOSTS: &[&str] = &[DEFAULT_REGISTRY, "docker.io", "index.docker.io"];

const MAX_TAG_LEN: usize = 128;

/// What a reference points at inside its repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A mutable tag such as `latest` or `1.28`
    Tag(String),
    /// An immutable content digest
    Digest(Digest),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Tag(tag) => f.write_str(tag),
            Target::Digest(digest) => digest.fmt(f),
        }
    }
}

/// A fully qualified container image reference.
///
/// Constructed only through [`ImageReference::parse`] (or `FromStr`), so the
/// registry host and repository are always filled in and exactly one of tag or
/// digest is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    registry_host: String,
    repository: String,
    target: Target,
}

type Matcher = fn(&str) -> Option<ImageReference>;

/// Grammars from most to least specific.
const GRAMMARS: &[(&str, Matcher)] = &[
    ("hostname/namespace/path", match_hosted_path),
    ("hostname/image", match_hosted_image),
    ("username/image", match_hub_namespaced),
    ("image", match_hub_library),
];

impl ImageReference {
    /// Parses a raw reference string.
    ///
    /// # Examples
    ///
    /// ```
    /// use libdockyard::reference::ImageReference;
    ///
    /// let reference = ImageReference::parse("nginx").unwrap();
    /// assert_eq!(reference.registry_host(), "registry-1.docker.io");
    /// assert_eq!(reference.repository(), "library/nginx");
    /// assert_eq!(reference.tag(), Some("latest"));
    /// ```
    ///
    /// # Errors
    ///
    /// - `UnparseableReference` when no grammar accepts the input
    /// - `AmbiguousReference` when more than one does
    pub fn parse(raw: &str) -> Result<Self> {
        let input = raw.trim();
        let mut candidates = Self::candidates(input);

        match candidates.len() {
            0 => Err(DockyardError::unparseable(input)),
            1 => Ok(candidates.remove(0)),
            _ => Err(DockyardError::ambiguous(input, candidates)),
        }
    }

    /// Returns every interpretation of `input`, one per matching grammar.
    pub fn candidates(input: &str) -> Vec<Self> {
        GRAMMARS
            .iter()
            .filter_map(|(name, matcher)| {
                let candidate = matcher(input)?;
                trace!(grammar = name, reference = %candidate, "reference grammar matched");
                Some(candidate)
            })
            .collect()
    }

    fn new(registry_host: &str, repository: String, target: Option<Target>) -> Self {
        Self {
            registry_host: registry_host.to_string(),
            repository,
            target: target.unwrap_or_else(|| Target::Tag(DEFAULT_TAG.to_string())),
        }
    }

    /// Returns the registry host, possibly with a port (`localhost:5000`).
    pub fn registry_host(&self) -> &str {
        &self.registry_host
    }

    /// Returns the slash-separated repository path (`library/nginx`).
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Returns the tag or digest this reference points at.
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Returns the tag, if the reference is tag-based.
    pub fn tag(&self) -> Option<&str> {
        match &self.target {
            Target::Tag(tag) => Some(tag),
            Target::Digest(_) => None,
        }
    }

    /// Returns the digest, if the reference is digest-based.
    pub fn digest(&self) -> Option<&Digest> {
        match &self.target {
            Target::Tag(_) => None,
            Target::Digest(digest) => Some(digest),
        }
    }

    /// The `<reference>` path element of a manifest URL.
    pub fn manifest_reference(&self) -> String {
        self.target.to_string()
    }
}

impl FromStr for ImageReference {
    type Err = DockyardError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.registry_host, self.repository)?;
        match &self.target {
            Target::Tag(tag) => write!(f, ":{}", tag),
            Target::Digest(digest) => write!(f, "@{}", digest),
        }
    }
}

// Grammar 1: gitlab.example.com/group/project[/more...][:tag|@digest]
fn match_hosted_path(input: &str) -> Option<ImageReference> {
    let (name, target) = split_target(input)?;
    let (host, path) = name.split_once('/')?;
    let components: Vec<&str> = path.split('/').collect();

    if !is_hostname(host) || components.len() < 2 || !components.iter().all(|c| is_path_component(c))
    {
        return None;
    }
    Some(ImageReference::new(host, components.join("/"), target))
}

// Grammar 2: localhost:5000/app[:tag|@digest]
fn match_hosted_image(input: &str) -> Option<ImageReference> {
    let (name, target) = split_target(input)?;
    let (host, image) = name.split_once('/')?;

    if !is_hostname(host) || !is_path_component(image) || DOCKER_HUB_HOSTS.contains(&host) {
        return None;
    }
    Some(ImageReference::new(host, image.to_string(), target))
}

// Grammar 3: username/image[:tag|@digest] on Docker Hub
fn match_hub_namespaced(input: &str) -> Option<ImageReference> {
    let (name, target) = split_target(input)?;
    let (username, image) = name.split_once('/')?;

    if !is_username(username) || !is_path_component(image) {
        return None;
    }
    Some(ImageReference::new(
        DEFAULT_REGISTRY,
        format!("{}/{}", username, image),
        target,
    ))
}

// Grammar 4: image[:tag|@digest] in the Docker Hub library namespace
fn match_hub_library(input: &str) -> Option<ImageReference> {
    let (name, target) = split_target(input)?;

    if !is_path_component(name) {
        return None;
    }
    Some(ImageReference::new(
        DEFAULT_REGISTRY,
        format!("{}/{}", DEFAULT_NAMESPACE, name),
        target,
    ))
}

/// Splits the optional `:tag` or `@digest` suffix off the last path segment.
///
/// Returns `None` when a suffix is present but malformed.
fn split_target(input: &str) -> Option<(&str, Option<Target>)> {
    let tail_start = input.rfind('/').map_or(0, |i| i + 1);
    let tail = &input[tail_start..];

    if let Some(at) = tail.find('@') {
        let digest = Digest::from_str(&tail[at + 1..]).ok()?;
        return Some((&input[..tail_start + at], Some(Target::Digest(digest))));
    }

    if let Some(colon) = tail.rfind(':') {
        let tag = &tail[colon + 1..];
        if !is_tag(tag) {
            return None;
        }
        return Some((
            &input[..tail_start + colon],
            Some(Target::Tag(tag.to_string())),
        ));
    }

    Some((input, None))
}

fn starts_alphanumeric(s: &str) -> bool {
    s.chars().next().is_some_and(|c| c.is_ascii_alphanumeric())
}

fn is_path_component(s: &str) -> bool {
    starts_alphanumeric(s)
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

fn is_username(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric())
}

fn is_tag(s: &str) -> bool {
    s.len() <= MAX_TAG_LEN
        && s.chars().next().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// A registry host: has a dot, a port, or is `localhost`.
fn is_hostname(s: &str) -> bool {
    let (host, port) = match s.split_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (s, None),
    };

    let host_ok = starts_alphanumeric(host)
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    let port_ok = port.is_none_or(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));

    host_ok && port_ok && (host.contains('.') || port.is_some() || host == "localhost")
}
