//! Verify command - one-click verification of address-derived stamps.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use clap::Args;
use stampkit_core::PlatformId;
use stampkit_providers::{PopupLauncher, ProofError};
use tracing::info;

use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the verify command.
#[derive(Args, Default)]
pub struct VerifyArgs {
    /// Re-verify providers that already hold a valid stamp.
    #[arg(long)]
    pub reissue: bool,
}

/// Bulk verification never opens a popup.
struct NoPopup;

#[async_trait]
impl PopupLauncher for NoPopup {
    async fn open(&self, platform: PlatformId, _url: &str) -> Result<(), ProofError> {
        Err(ProofError::Popup(format!(
            "{platform} needs a popup; use `stampkit claim`"
        )))
    }
}

/// Runs the verify command.
pub async fn run(args: &VerifyArgs, cli: &Cli) -> Result<()> {
    let session = super::open_session(cli, Arc::new(NoPopup)).await?;

    let existing = session.store().valid_providers(Utc::now()).await;
    info!(existing = existing.len(), reissue = args.reissue, "Bulk verify");

    let result = session.bulk_verifier().verify(&existing, args.reissue).await;
    session.close();
    let outcome = result?;

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_bulk(&outcome));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_bulk(&outcome)?);
        }
    }

    Ok(())
}
