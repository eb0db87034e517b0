//! `dockyard check`: does an image exist, and where does it start?

use super::{describe_error, exit_code};
use crate::context::{AppContext, VerbosityLevel};
use crate::format::{self, Formattable, OutputFormat};
use libdockyard::{Availability, ImageResolver, RegistryCredential, Resolution};
use serde::Serialize;
use tracing::info;

/// Result of checking one image
#[derive(Debug, Serialize, PartialEq)]
pub struct ImageCheck {
    pub image: String,
    pub exists: bool,
    pub availability: Availability,
    pub working_directory: String,
}

impl From<Resolution> for ImageCheck {
    fn from(resolution: Resolution) -> Self {
        Self {
            image: resolution.reference.to_string(),
            exists: resolution.exists(),
            availability: resolution.availability,
            working_directory: resolution.working_directory.display().to_string(),
        }
    }
}

impl Formattable for ImageCheck {
    fn format_pretty(&self, color: bool) -> String {
        let (mark, status) = match self.availability {
            Availability::Present => (format::checkmark(color), "exists"),
            Availability::Unreachable => (format::warning_mark(color), "registry unreachable"),
            Availability::Absent => (format::error_mark(color), "not found"),
        };
        format!(
            "{} {} ({})\n  Working directory: {}",
            mark, self.image, status, self.working_directory
        )
    }
}

/// Resolves `raw` with the context's configuration.
pub async fn check_image(
    ctx: &AppContext,
    raw: &str,
    token: Option<&str>,
) -> libdockyard::Result<ImageCheck> {
    let mut resolver = ImageResolver::from_config(&ctx.config)?;
    let credential = token.map(RegistryCredential::oauth2);

    let resolution = resolver.resolve(raw, credential.as_ref()).await?;

    if resolution.availability == Availability::Unreachable {
        info!(image = %resolution.reference, "registry could not be reached");
    }
    Ok(ImageCheck::from(resolution))
}

pub async fn handle_check(ctx: &AppContext, raw: &str, token: Option<&str>, format: OutputFormat) {
    if ctx.verbosity >= VerbosityLevel::Verbose {
        eprintln!("Resolving {}", raw);
    }

    let check = match check_image(ctx, raw, token).await {
        Ok(check) => check,
        Err(e) => {
            format::error(ctx.color, &describe_error(&e));
            std::process::exit(exit_code(&e));
        }
    };

    match format::format_output(&check, format, ctx.color) {
        Ok(output) => println!("{}", output.trim_end()),
        Err(e) => {
            format::error(ctx.color, &e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
#[path = "check_tests.rs"]
mod tests;
