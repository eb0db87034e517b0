use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod context;
mod format;

/// Dockyard - container image reference resolver
///
/// Parses image references the way a session launcher sees them, checks that
/// the image exists on its registry, and reports its working directory.
#[derive(Parser, Debug)]
#[command(name = "dockyard")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress diagnostics on stderr
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Control colored output: auto, always, never
    #[arg(long, global = true, default_value = "auto")]
    color: String,

    /// Configuration file (YAML)
    #[arg(long, global = true, env = "DOCKYARD_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Display version information
    Version,
    /// Show how an image reference is interpreted
    Parse {
        /// Image reference (e.g. nginx:1.28, host/ns/repo@sha256:...)
        reference: String,
        /// Output format: pretty, json, yaml
        #[arg(short, long, default_value = "pretty")]
        format: String,
    },
    /// Check that an image exists and report its working directory
    Check {
        /// Image reference
        reference: String,
        /// Registry token, sent as the password of user `oauth2`
        #[arg(long, env = "DOCKYARD_TOKEN", hide_env_values = true)]
        token: Option<String>,
        /// Output format: pretty, json, yaml
        #[arg(short, long, default_value = "pretty")]
        format: String,
    },
}

fn init_tracing(verbosity: context::VerbosityLevel) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| verbosity.filter().into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let verbosity = if cli.quiet {
        context::VerbosityLevel::Quiet
    } else {
        context::VerbosityLevel::from_count(cli.verbose)
    };
    init_tracing(verbosity);

    let color = format::ColorChoice::from(cli.color.as_str());

    if let Commands::Version = cli.command {
        commands::version::print_version();
        return;
    }

    let ctx = match context::AppContext::build(cli.config.as_deref(), color, verbosity) {
        Ok(ctx) => ctx,
        Err(e) => {
            format::error(color.enabled(), &e);
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::Version => commands::version::print_version(),
        Commands::Parse { reference, format } => {
            let fmt = format::OutputFormat::from(format.as_str());
            commands::parse::handle_parse(&ctx, &reference, fmt);
        }
        Commands::Check {
            reference,
            token,
            format,
        } => {
            let fmt = format::OutputFormat::from(format.as_str());
            commands::check::handle_check(&ctx, &reference, token.as_deref(), fmt).await;
        }
    }
}
