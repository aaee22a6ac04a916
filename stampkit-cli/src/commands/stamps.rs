//! Stamps command - show the stored passport.

use anyhow::Result;
use chrono::Utc;

use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Runs the stamps command.
pub async fn run(cli: &Cli) -> Result<()> {
    let store = super::open_passport().await?;
    let passport = store.get().await;

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_passport(&passport, Utc::now()));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&passport)?);
        }
    }

    Ok(())
}
