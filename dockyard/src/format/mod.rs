use owo_colors::OwoColorize;
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable pretty format
    Pretty,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "yaml" | "yml" => OutputFormat::Yaml,
            _ => OutputFormat::Pretty,
        }
    }
}

/// Whether to color terminal output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

impl From<&str> for ColorChoice {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "always" => ColorChoice::Always,
            "never" => ColorChoice::Never,
            _ => ColorChoice::Auto,
        }
    }
}

impl ColorChoice {
    /// Resolves `Auto` against the terminal and `NO_COLOR`.
    pub fn enabled(self) -> bool {
        match self {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => {
                std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
            }
        }
    }
}

/// Trait for types that can be formatted for CLI output
pub trait Formattable: Serialize {
    /// Format the type for pretty (human-readable) output
    fn format_pretty(&self, color: bool) -> String;
}

/// Format a single item for output
pub fn format_output<T: Formattable>(
    item: &T,
    format: OutputFormat,
    color: bool,
) -> Result<String, String> {
    match format {
        OutputFormat::Pretty => Ok(item.format_pretty(color)),
        OutputFormat::Json => serde_json::to_string_pretty(item)
            .map_err(|e| format!("Failed to serialize to JSON: {}", e)),
        OutputFormat::Yaml => {
            serde_yaml::to_string(item).map_err(|e| format!("Failed to serialize to YAML: {}", e))
        }
    }
}

pub fn checkmark(color: bool) -> String {
    if color {
        format!("{}", "✓".green().bold())
    } else {
        "✓".to_string()
    }
}

pub fn error_mark(color: bool) -> String {
    if color {
        format!("{}", "✗".red().bold())
    } else {
        "✗".to_string()
    }
}

pub fn warning_mark(color: bool) -> String {
    if color {
        format!("{}", "⚠".yellow().bold())
    } else {
        "⚠".to_string()
    }
}

/// Print an error message to stderr
pub fn error(color: bool, message: &str) {
    eprintln!("{} {}", error_mark(color), message);
}
