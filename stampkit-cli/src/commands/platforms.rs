//! Platforms command - list supported platforms.

use anyhow::Result;
use stampkit_providers::PlatformRegistry;
use tracing::info;

use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Runs the platforms command.
pub fn run(cli: &Cli) -> Result<()> {
    info!("Listing platforms");

    let platforms = PlatformRegistry::all();

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);

            println!("{}", formatter.format_platforms_header());
            println!("{}", "─".repeat(70));

            for desc in platforms {
                println!("{}", formatter.format_platform(desc, cli.verbose));
            }

            println!();
            println!(
                "Total: {} platforms ({} address-derived)",
                platforms.len(),
                platforms.iter().filter(|d| d.is_evm()).count()
            );
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_platforms(platforms)?);
        }
    }

    Ok(())
}
