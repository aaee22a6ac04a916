// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! Stampkit CLI - claim and verify Stamps from the command line.
//!
//! # Examples
//!
//! ```bash
//! # List platforms and their providers
//! stampkit platforms
//!
//! # Claim GitHub stamps (prints the authorization URL, then waits for the
//! # redirect URL to be pasted)
//! stampkit claim --platform github
//!
//! # Verify every address-derived provider in one request
//! stampkit verify
//!
//! # Show the stored passport as JSON
//! stampkit stamps --format json --pretty
//! ```

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::{claim, config, platforms, stamps, verify};

// ============================================================================
// CLI Definition
// ============================================================================

/// Stampkit CLI - Stamp claiming and verification.
#[derive(Parser)]
#[command(name = "stampkit")]
#[command(about = "Stamp credential claiming CLI")]
#[command(long_about = r#"
Stampkit acquires proofs from identity platforms, exchanges them for
verifiable credentials and keeps the resulting Stamps in a local passport.

Examples:
  stampkit platforms                          # Supported platforms
  stampkit claim --platform github            # OAuth claim
  stampkit claim --platform eth -P ethPossessionsGte#1
  stampkit verify                             # Bulk EVM verification
  stampkit stamps --format json               # Stored passport
"#)]
#[command(version)]
#[command(author = "Stampkit Contributors")]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Wallet address, overriding settings and environment.
    #[arg(long, short, global = true)]
    pub address: Option<String>,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// List supported platforms and providers.
    #[command(visible_alias = "p")]
    Platforms,

    /// Claim stamps on one or more platforms.
    #[command(visible_alias = "c")]
    Claim(claim::ClaimArgs),

    /// Verify all eligible address-derived providers at once.
    #[command(visible_alias = "v")]
    Verify(verify::VerifyArgs),

    /// Show stored stamps.
    #[command(visible_alias = "s")]
    Stamps,

    /// Manage configuration.
    Config(config::ConfigArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[repr(i32)]
pub enum ExitCode {
    /// General error.
    Error = 1,
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return; // No logging in quiet mode
    }

    let filter = if verbose {
        EnvFilter::new("stampkit=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stampkit=warn"))
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Commands::Platforms => platforms::run(&cli),
        Commands::Claim(args) => claim::run(args, &cli).await,
        Commands::Verify(args) => verify::run(args, &cli).await,
        Commands::Stamps => stamps::run(&cli).await,
        Commands::Config(args) => config::run(args, &cli).await,
    };

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e:#}");
        }
        std::process::exit(ExitCode::Error as i32);
    }

    Ok(())
}
