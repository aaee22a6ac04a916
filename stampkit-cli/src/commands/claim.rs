//! Claim command - acquire proofs and commit stamps.
//!
//! OAuth platforms print their authorization URL instead of opening a
//! browser window. After authorizing, paste the full redirect URL back into
//! the terminal; it is posted on the session's redirect bus like a popup
//! redirect would be.

use std::sync::{Arc, OnceLock};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use clap::Args;
use stampkit_claim::{ClaimHandler, Session};
use stampkit_core::{ClaimTarget, PlatformId, ProviderId, StampClaimForPlatform};
use stampkit_fetch::{RedirectBus, RedirectData};
use stampkit_providers::{PlatformRegistry, PopupLauncher, ProofError};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the claim command.
#[derive(Args)]
pub struct ClaimArgs {
    /// Platforms to claim, in order. Comma-separated or repeated.
    #[arg(long, short = 'p', value_delimiter = ',', required = true)]
    pub platform: Vec<String>,

    /// Providers to claim. Defaults to every provider of each platform.
    #[arg(long, short = 'P', value_delimiter = ',')]
    pub provider: Vec<String>,
}

/// Runs the claim command.
pub async fn run(args: &ClaimArgs, cli: &Cli) -> Result<()> {
    let batch = build_batch(&args.platform, &args.provider)?;

    let popup = Arc::new(TerminalPopup::new());
    let session = super::open_session(cli, popup.clone()).await?;
    popup.attach(session.redirects().clone());

    let handler = TerminalHandler { quiet: cli.quiet };
    let result = session
        .orchestrator()
        .claim_credentials(&handler, &batch)
        .await;
    session.close();
    let outcome = result?;

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_batch(&outcome));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_batch(&outcome)?);
        }
    }

    print_summary(&session, cli).await;
    Ok(())
}

async fn print_summary(session: &Session, cli: &Cli) {
    if cli.quiet || cli.format == OutputFormat::Json {
        return;
    }
    eprintln!("Passport now holds {} stamps", session.store().len().await);
}

/// Builds the claim batch from platform names and an optional provider filter.
///
/// A platform the filter leaves empty stays in the batch and is skipped when
/// the batch runs. At least one platform must select a provider.
pub fn build_batch(
    platforms: &[String],
    providers: &[String],
) -> Result<Vec<StampClaimForPlatform>> {
    let filter: Vec<ProviderId> = providers.iter().map(ProviderId::new).collect();
    let mut batch = Vec::with_capacity(platforms.len());

    for name in platforms {
        let target: ClaimTarget = name
            .parse()
            .with_context(|| format!("unknown platform: {name}"))?;

        let selected = match target.platform() {
            Some(id) => {
                let desc = PlatformRegistry::get(id)
                    .with_context(|| format!("platform not registered: {id}"))?;
                if filter.is_empty() {
                    desc.provider_ids()
                } else {
                    filter.iter().filter(|p| desc.has_provider(p)).cloned().collect()
                }
            }
            None => filter.clone(),
        };

        if selected.is_empty() {
            warn!(platform = %target, "No providers selected, platform will be skipped");
        }
        batch.push(StampClaimForPlatform::new(target, selected));
    }

    if batch.iter().all(|entry| entry.selected_providers.is_empty()) {
        bail!("no providers selected");
    }
    Ok(batch)
}

// ============================================================================
// Terminal Popup
// ============================================================================

/// Popup launcher that prints the URL and reads the redirect from stdin.
struct TerminalPopup {
    bus: OnceLock<RedirectBus>,
    stdin: Mutex<Lines<BufReader<Stdin>>>,
}

impl TerminalPopup {
    fn new() -> Self {
        Self {
            bus: OnceLock::new(),
            stdin: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }

    fn attach(&self, bus: RedirectBus) {
        let _ = self.bus.set(bus);
    }
}

#[async_trait]
impl PopupLauncher for TerminalPopup {
    async fn open(&self, platform: PlatformId, url: &str) -> Result<(), ProofError> {
        let bus = self
            .bus
            .get()
            .ok_or_else(|| ProofError::Popup("no redirect bus attached".to_string()))?;

        eprintln!("Authorize {} at:\n\n  {url}\n", platform.display_name());
        eprintln!("Then paste the URL you were redirected to:");

        let line = self
            .stdin
            .lock()
            .await
            .next_line()
            .await
            .map_err(|e| ProofError::Popup(e.to_string()))?
            .ok_or_else(|| ProofError::Popup("stdin closed".to_string()))?;

        let data = RedirectData::from_redirect_url(line.trim())
            .map_err(|e| ProofError::Popup(format!("invalid redirect URL: {e}")))?;

        if !bus.sender(platform.path()).send(data) {
            warn!(%platform, "Redirect pasted but nobody is waiting");
        }
        Ok(())
    }
}

// ============================================================================
// Terminal Handler
// ============================================================================

struct TerminalHandler {
    quiet: bool,
}

#[async_trait]
impl ClaimHandler for TerminalHandler {
    async fn on_claim_step(&self, step: usize) {
        info!(step, "Claim step");
        if !self.quiet {
            eprintln!("Step {}...", step + 1);
        }
    }

    fn indicate_error(&self, target: &ClaimTarget) {
        if !self.quiet {
            eprintln!("No stamps verified for {target}");
        }
    }

    async fn on_sponsorship(&self, platform: PlatformId, success: bool) {
        if self.quiet {
            return;
        }
        if success {
            eprintln!(
                "{} sponsorship requested. Link your account, then claim again.",
                platform.display_name()
            );
        } else {
            eprintln!("{} sponsorship failed.", platform.display_name());
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
