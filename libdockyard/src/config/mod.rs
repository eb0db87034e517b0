//! Resolver configuration.
//!
//! Values are layered: built-in defaults, then an optional YAML file, then
//! `DOCKYARD_*` environment variables. Nested keys in the environment use a
//! double underscore, e.g. `DOCKYARD_NETWORK__TIMEOUT=60` or
//! `DOCKYARD_REGISTRIES__PLAIN_HTTP=localhost:5000,registry.local:5000`.

use crate::client::ClientConfig;
use crate::error::{DockyardError, Result};
use config::{Config as ConfigRs, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;


/// Prefix of environment variables read by [`Config::load`].
pub const ENV_PREFIX: &str = "DOCKYARD";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Config {
    #[serde(default)]
    pub network: Network,
    #[serde(default)]
    pub registries: Registries,
}

impl Config {
    /// Parses a `Config` from a YAML string layered over the defaults.
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let builder = ConfigRs::builder()
            .add_source(ConfigRs::try_from(&Config::default())?)
            .add_source(File::from_str(s, FileFormat::Yaml));

        Self::from_builder(builder, None)
    }

    /// Loads a `Config` from an optional YAML file and the environment.
    ///
    /// A given path must exist; `None` means defaults plus environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, environment())
    }

    pub(crate) fn load_with_env(path: Option<&Path>, env: Environment) -> Result<Self> {
        let mut builder = ConfigRs::builder().add_source(ConfigRs::try_from(&Config::default())?);

        if let Some(p) = path {
            builder = builder.add_source(File::from(p).format(FileFormat::Yaml).required(true));
        }
        builder = builder.add_source(env);

        Self::from_builder(builder, path)
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
        path: Option<&Path>,
    ) -> Result<Self> {
        builder
            .build()
            .and_then(|cfg| cfg.try_deserialize())
            .map_err(|e| {
                DockyardError::config_with_source(
                    "Failed to load configuration".to_string(),
                    path.map(|p| p.display().to_string()),
                    e,
                )
            })
    }

    /// HTTP client settings derived from this configuration.
    pub fn to_client_config(&self) -> ClientConfig {
        let mut client = ClientConfig::new()
            .with_timeout(self.network.timeout)
            .with_max_idle_per_host(self.network.max_idle_per_host)
            .with_user_agent(self.network.user_agent.clone());
        for host in &self.registries.plain_http {
            client = client.with_plain_http_host(host.clone());
        }
        client
    }

    /// End-to-end deadline for a resolution, if one is configured.
    pub fn deadline(&self) -> Option<Duration> {
        self.network.deadline.map(Duration::from_secs)
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("registries.plain_http")
        .try_parsing(true)
}

/// Network settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Network {
    /// Per-request timeout in seconds.
    #[serde(default = "default_network_timeout")]
    pub timeout: u64,

    #[serde(default = "default_max_idle_per_host")]
    pub max_idle_per_host: usize,

    /// Whole-resolution deadline in seconds.
    #[serde(default)]
    pub deadline: Option<u64>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for Network {
    fn default() -> Self {
        Self {
            timeout: default_network_timeout(),
            max_idle_per_host: default_max_idle_per_host(),
            deadline: None,
            user_agent: default_user_agent(),
        }
    }
}

fn default_network_timeout() -> u64 {
    30
}

fn default_max_idle_per_host() -> usize {
    10
}

fn default_user_agent() -> String {
    format!("dockyard/{}", env!("CARGO_PKG_VERSION"))
}

/// Per-registry settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Registries {
    /// Hosts reached over `http://` (local and test registries).
    #[serde(default)]
    pub plain_http: Vec<String>,
}
