//! `dockyard parse`: show how a reference string is interpreted.

use super::{describe_error, exit_code};
use crate::context::AppContext;
use crate::format::{self, Formattable, OutputFormat};
use libdockyard::{ImageReference, Target};
use owo_colors::OwoColorize;
use serde::Serialize;

/// Structured view of a parsed reference
#[derive(Debug, Serialize, PartialEq)]
pub struct ParsedReference {
    pub input: String,
    pub canonical: String,
    pub registry: String,
    pub repository: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

impl ParsedReference {
    fn new(input: &str, reference: &ImageReference) -> Self {
        let (tag, digest) = match reference.target() {
            Target::Tag(tag) => (Some(tag.clone()), None),
            Target::Digest(digest) => (None, Some(digest.to_string())),
        };
        Self {
            input: input.to_string(),
            canonical: reference.to_string(),
            registry: reference.registry_host().to_string(),
            repository: reference.repository().to_string(),
            tag,
            digest,
        }
    }
}

impl Formattable for ParsedReference {
    fn format_pretty(&self, color: bool) -> String {
        let canonical = if color {
            self.canonical.bold().to_string()
        } else {
            self.canonical.clone()
        };
        let mut out = format!(
            "{} {}\n  Registry:   {}\n  Repository: {}",
            format::checkmark(color),
            canonical,
            self.registry,
            self.repository
        );
        if let Some(tag) = &self.tag {
            out.push_str(&format!("\n  Tag:        {}", tag));
        }
        if let Some(digest) = &self.digest {
            out.push_str(&format!("\n  Digest:     {}", digest));
        }
        out
    }
}

/// Parses `raw` into its structured view.
pub fn parse_reference(raw: &str) -> libdockyard::Result<ParsedReference> {
    ImageReference::parse(raw).map(|reference| ParsedReference::new(raw, &reference))
}

pub fn handle_parse(ctx: &AppContext, raw: &str, format: OutputFormat) {
    let parsed = match parse_reference(raw) {
        Ok(parsed) => parsed,
        Err(e) => {
            format::error(ctx.color, &describe_error(&e));
            std::process::exit(exit_code(&e));
        }
    };

    match format::format_output(&parsed, format, ctx.color) {
        Ok(output) => println!("{}", output.trim_end()),
        Err(e) => {
            format::error(ctx.color, &e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
#[path = "parse_tests.rs"]
mod tests;
