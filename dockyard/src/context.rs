//! Application context that holds resolved configuration
//!
//! Configuration is layered in this order:
//! 1. Default values
//! 2. Config file (`--config`, `DOCKYARD_CONFIG`, or the per-user default)
//! 3. `DOCKYARD_*` environment variables
//!
//! Once built, the context is passed as read-only to the command handlers.

use crate::format::ColorChoice;
use libdockyard::Config;
use std::path::{Path, PathBuf};

/// How much diagnostic output to emit on stderr
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VerbosityLevel {
    Quiet,
    Normal,
    Verbose,
    Debug,
    Trace,
}

impl VerbosityLevel {
    /// Maps the number of `-v` flags to a level.
    pub fn from_count(count: u8) -> Self {
        match count {
            0 => VerbosityLevel::Normal,
            1 => VerbosityLevel::Verbose,
            2 => VerbosityLevel::Debug,
            _ => VerbosityLevel::Trace,
        }
    }

    /// Default tracing filter for this level.
    pub fn filter(self) -> &'static str {
        match self {
            VerbosityLevel::Quiet => "off",
            VerbosityLevel::Normal => "warn",
            VerbosityLevel::Verbose => "libdockyard=info,dockyard=info",
            VerbosityLevel::Debug => "libdockyard=debug,dockyard=debug",
            VerbosityLevel::Trace => "libdockyard=trace,dockyard=trace",
        }
    }
}

/// Application context with resolved configuration and runtime state
#[derive(Debug, Clone)]
pub struct AppContext {
    /// Resolved configuration
    pub config: Config,
    /// Whether output may contain ANSI colors
    pub color: bool,
    pub verbosity: VerbosityLevel,
}

impl AppContext {
    /// Build the context, reading `config_path` if given or the per-user
    /// default file if one exists.
    pub fn build(
        config_path: Option<&Path>,
        color: ColorChoice,
        verbosity: VerbosityLevel,
    ) -> Result<Self, String> {
        let path = match config_path {
            Some(p) => Some(p.to_path_buf()),
            None => default_config_path().filter(|p| p.exists()),
        };

        let config = Config::load(path.as_deref()).map_err(|e| e.to_string())?;

        Ok(Self {
            config,
            color: color.enabled(),
            verbosity,
        })
    }
}

/// `$XDG_CONFIG_HOME/dockyard/config.yaml` or the platform equivalent
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("dockyard").join("config.yaml"))
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
