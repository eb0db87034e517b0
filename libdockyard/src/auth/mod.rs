//! Registry authentication.
//!
//! Registries that require authentication answer an anonymous request with
//! `401` and a `WWW-Authenticate: Bearer realm=...,service=...,scope=...`
//! challenge. The [`Authenticator`] probes for that challenge and exchanges
//! it at the realm for a short-lived bearer token, optionally presenting a
//! [`RegistryCredential`] as HTTP Basic auth.

use crate::client::Client;
use crate::error::{DockyardError, Result};
use crate::reference::ImageReference;
use base64::{Engine as _, engine::general_purpose};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, WWW_AUTHENTICATE};
use serde::Deserialize;
use sha2::{Digest as Sha2Digest, Sha256};
use std::fmt;
use tracing::{debug, instrument};
use url::Url;


/// Credential supplied by the caller for one resolution.
///
/// The username is always `oauth2`; the secret is a platform access token.
#[derive(Clone, PartialEq, Eq)]
pub struct RegistryCredential {
    secret_token: String,
}

impl RegistryCredential {
    /// Username presented with every credential.
    pub const USERNAME: &'static str = "oauth2";

    /// Creates an `oauth2` credential from an access token.
    ///
    /// # Examples
    ///
    /// ```
    /// use libdockyard::auth::RegistryCredential;
    ///
    /// let credential = RegistryCredential::oauth2("glpat-secret");
    /// assert_eq!(credential.username(), "oauth2");
    /// ```
    pub fn oauth2(secret_token: impl Into<String>) -> Self {
        Self {
            secret_token: secret_token.into(),
        }
    }

    /// Returns the username (`oauth2`).
    pub fn username(&self) -> &str {
        Self::USERNAME
    }

    /// Returns the secret token.
    pub fn secret_token(&self) -> &str {
        &self.secret_token
    }

    /// Returns the `Authorization: Basic ...` header value.
    pub fn to_header_value(&self) -> String {
        let credentials = format!("{}:{}", Self::USERNAME, self.secret_token);
        format!("Basic {}", general_purpose::STANDARD.encode(credentials))
    }

    /// Stable identity of the credential that does not reveal the secret.
    pub fn fingerprint(&self) -> String {
        format!("{:x}", Sha256::digest(self.secret_token.as_bytes()))
    }
}

impl fmt::Debug for RegistryCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryCredential")
            .field("username", &Self::USERNAME)
            .field("secret_token", &"<redacted>")
            .finish()
    }
}

/// Short-lived token issued by a registry's auth service.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Wraps a raw token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the `Authorization: Bearer ...` header value.
    pub fn to_header_value(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

/// Information parsed from a WWW-Authenticate header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChallenge {
    /// The authentication scheme (e.g., "Bearer")
    pub scheme: String,

    /// The token endpoint
    pub realm: String,

    /// The service identifier
    pub service: Option<String>,

    /// The scope being requested
    pub scope: Option<String>,
}

impl AuthChallenge {
    /// Parses a WWW-Authenticate header value.
    ///
    /// Parameter values may be quoted; quoted values can contain commas
    /// (`scope="repository:app:pull,push"`). A value listing several
    /// challenges (`Basic realm="x", Bearer realm="..."`) yields the first
    /// Bearer one, or the first challenge when none is Bearer.
    ///
    /// # Examples
    ///
    /// ```
    /// use libdockyard::auth::AuthChallenge;
    ///
    /// let header = r#"Bearer realm="https://auth.example.com/token",service="registry""#;
    /// let challenge = AuthChallenge::parse(header).unwrap();
    /// assert!(challenge.is_bearer());
    /// assert_eq!(challenge.service.as_deref(), Some("registry"));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `AuthenticationRejected` when the header has no scheme or no
    /// `realm` parameter.
    pub fn parse(header: &str) -> Result<Self> {
        let mut first = None;
        for challenge in split_challenges(header) {
            let parsed = Self::parse_single(challenge);
            if matches!(&parsed, Ok(c) if c.is_bearer()) {
                return parsed;
            }
            first.get_or_insert(parsed);
        }
        first.unwrap_or_else(|| {
            Err(DockyardError::authentication(
                "Empty WWW-Authenticate header",
                Some(401),
            ))
        })
    }

    fn parse_single(challenge: &str) -> Result<Self> {
        let (scheme, params) = challenge.split_once(char::is_whitespace).ok_or_else(|| {
            DockyardError::authentication("Invalid WWW-Authenticate header format", Some(401))
        })?;

        let mut realm = None;
        let mut service = None;
        let mut scope = None;

        for (key, value) in parse_params(params) {
            match key.to_ascii_lowercase().as_str() {
                "realm" => realm = Some(value),
                "service" => service = Some(value),
                "scope" => scope = Some(value),
                _ => {}
            }
        }

        let realm = realm.filter(|r| !r.is_empty()).ok_or_else(|| {
            DockyardError::authentication(
                "WWW-Authenticate header missing required 'realm' parameter",
                Some(401),
            )
        })?;

        Ok(Self {
            scheme: scheme.to_string(),
            realm,
            service,
            scope,
        })
    }

    /// Returns true for a Bearer challenge.
    pub fn is_bearer(&self) -> bool {
        self.scheme.eq_ignore_ascii_case("bearer")
    }
}

/// Splits a header value into one slice per challenge.
///
/// A top-level comma starts a new challenge when the token after it is not
/// followed by `=`.
fn split_challenges(header: &str) -> Vec<&str> {
    let mut challenges = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;

    for (i, c) in header.char_indices() {
        if in_quotes {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_quotes = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            ',' if starts_scheme(&header[i + 1..]) => {
                challenges.push(header[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    challenges.push(header[start..].trim());
    challenges.retain(|c| !c.is_empty());
    challenges
}

fn starts_scheme(rest: &str) -> bool {
    let rest = rest.trim_start();
    let end = rest
        .find(|c: char| c.is_whitespace() || c == '=' || c == ',')
        .unwrap_or(rest.len());
    end > 0 && !rest[end..].trim_start().starts_with('=')
}

/// Splits `k1="v1", k2=v2` into pairs, honouring quotes and backslash escapes.
fn parse_params(params: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut chars = params.chars().peekable();

    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace() || *c == ',') {
            chars.next();
        }
        if chars.peek().is_none() {
            break;
        }

        let mut key = String::new();
        while let Some(&c) = chars.peek() {
            if c == '=' || c == ',' {
                break;
            }
            key.push(c);
            chars.next();
        }
        if chars.next() != Some('=') {
            // bare token without a value
            continue;
        }

        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }

        let mut value = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            value.push(escaped);
                        }
                    }
                    '"' => break,
                    _ => value.push(c),
                }
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c == ',' {
                    break;
                }
                value.push(c);
                chars.next();
            }
            value = value.trim_end().to_string();
        }

        pairs.push((key.trim().to_string(), value));
    }

    pairs
}

/// Outcome of probing a registry endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    /// The registry demands a bearer token obtained from this challenge
    Challenge(AuthChallenge),
    /// The registry answered without asking for authentication
    NoAuthRequired,
}

/// Token endpoint response. Providers differ in which field they fill.
#[derive(Debug, Default, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
}

impl TokenResponse {
    fn into_token(self) -> Option<BearerToken> {
        self.token
            .filter(|t| !t.is_empty())
            .or(self.access_token.filter(|t| !t.is_empty()))
            .map(BearerToken::new)
    }
}

/// Negotiates bearer tokens with a registry.
#[derive(Debug, Clone)]
pub struct Authenticator {
    client: Client,
}

impl Authenticator {
    /// Creates an authenticator sharing `client`'s connection pool.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Sends an anonymous request to the manifest endpoint and reports
    /// whether the registry challenged it.
    ///
    /// # Errors
    ///
    /// - `RegistryUnreachable` on network failure
    /// - `AuthenticationRejected` when a `401` carries no usable Bearer
    ///   challenge (missing header, missing realm, other scheme, bad realm URL)
    #[instrument(skip(self), fields(reference = %reference))]
    pub async fn probe(&self, reference: &ImageReference) -> Result<Probe> {
        let url = self.client.manifest_url(reference);
        let response = self.client.send(self.client.get(&url), &url).await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            debug!(status = %response.status(), "registry did not ask for authentication");
            return Ok(Probe::NoAuthRequired);
        }

        let mut challenges = response
            .headers()
            .get_all(WWW_AUTHENTICATE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .peekable();

        if challenges.peek().is_none() {
            return Err(DockyardError::authentication(
                format!("{} answered 401 without a WWW-Authenticate header", url),
                Some(401),
            ));
        }

        let mut last_error = None;
        for header in challenges {
            match AuthChallenge::parse(header) {
                Ok(challenge) if challenge.is_bearer() => {
                    validate_realm(&challenge.realm)?;
                    debug!(realm = %challenge.realm, "registry issued a bearer challenge");
                    return Ok(Probe::Challenge(challenge));
                }
                Ok(challenge) => {
                    last_error = Some(DockyardError::authentication(
                        format!("Unsupported authentication scheme '{}'", challenge.scheme),
                        Some(401),
                    ));
                }
                Err(e) => last_error = Some(e),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            DockyardError::authentication("No usable authentication challenge", Some(401))
        }))
    }

    /// Exchanges a challenge for a bearer token at the challenge's realm.
    ///
    /// Returns `Ok(None)` when the token service answers without a token; the
    /// caller then proceeds unauthenticated.
    ///
    /// # Errors
    ///
    /// - `RegistryUnreachable` on network failure
    /// - `AuthenticationRejected` when the token service answers `403`
    #[instrument(
        skip(self, challenge, credential),
        fields(realm = %challenge.realm, with_credential = credential.is_some())
    )]
    pub async fn exchange(
        &self,
        challenge: &AuthChallenge,
        credential: Option<&RegistryCredential>,
    ) -> Result<Option<BearerToken>> {
        let mut query = Vec::new();
        if let Some(service) = &challenge.service {
            query.push(("service", service.as_str()));
        }
        if let Some(scope) = &challenge.scope {
            query.push(("scope", scope.as_str()));
        }

        let mut request = self
            .client
            .get(&challenge.realm)
            .header(ACCEPT, "application/json");
        if !query.is_empty() {
            request = request.query(&query);
        }
        if let Some(credential) = credential {
            request = request.header(AUTHORIZATION, credential.to_header_value());
        }

        let response = self.client.send(request, &challenge.realm).await?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::FORBIDDEN => {
                return Err(DockyardError::authentication(
                    format!("Token request to {} was refused", challenge.realm),
                    Some(403),
                ));
            }
            status => {
                debug!(%status, "token service did not issue a token");
                return Ok(None);
            }
        }

        let body = self.client.read_body(response, &challenge.realm).await?;
        let token = serde_json::from_slice::<TokenResponse>(&body)
            .unwrap_or_default()
            .into_token();
        if token.is_none() {
            debug!("token response carried no token");
        }
        Ok(token)
    }

    /// Probes, then exchanges when challenged.
    pub async fn authenticate(
        &self,
        reference: &ImageReference,
        credential: Option<&RegistryCredential>,
    ) -> Result<Option<BearerToken>> {
        match self.probe(reference).await? {
            Probe::NoAuthRequired => Ok(None),
            Probe::Challenge(challenge) => self.exchange(&challenge, credential).await,
        }
    }
}

fn validate_realm(realm: &str) -> Result<()> {
    match Url::parse(realm) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(DockyardError::authentication(
            format!("Challenge realm '{}' is not an HTTP URL", realm),
            Some(401),
        )),
    }
}
