//! CLI command implementations.

pub mod claim;
pub mod config;
pub mod platforms;
pub mod stamps;
pub mod verify;

use std::sync::Arc;

use anyhow::{Context, Result};
use stampkit_claim::Session;
use stampkit_providers::PopupLauncher;
use stampkit_store::{PassportStore, Settings, SettingsStore, default_passport_path};

use crate::Cli;

/// Loads settings with environment overrides, then applies `--address`.
pub async fn resolve_settings(cli: &Cli) -> Result<Settings> {
    let store = SettingsStore::load_default().await?;
    let mut settings = store.resolved().await;
    if let Some(address) = &cli.address {
        settings.address = Some(address.clone());
    }
    Ok(settings)
}

/// Opens the on-disk passport.
pub async fn open_passport() -> Result<Arc<PassportStore>> {
    let path = default_passport_path();
    let store = PassportStore::open(path.clone())
        .await
        .with_context(|| format!("opening passport at {}", path.display()))?;
    Ok(Arc::new(store))
}

/// Opens a claim session against the on-disk passport.
pub async fn open_session(cli: &Cli, popup: Arc<dyn PopupLauncher>) -> Result<Session> {
    let settings = resolve_settings(cli).await?;
    let store = open_passport().await?;
    Session::open(settings, store, popup).context("opening session (is an address configured?)")
}
