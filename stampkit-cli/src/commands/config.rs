//! Config command - manage configuration.

use anyhow::Result;
use clap::{Args, Subcommand};
use stampkit_store::{
    ENV_ADDRESS, ENV_IAM_TOKEN, ENV_IAM_URL, Settings, SettingsStore, default_config_dir,
    default_passport_path, default_settings_path,
};
use tracing::info;

use crate::output::JsonFormatter;
use crate::{Cli, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration.
    Show,

    /// Show configuration paths.
    Path,

    /// Write a settings file with defaults, keeping existing values.
    Init,

    /// Set the wallet address.
    Address {
        /// Address to store.
        address: String,
    },

    /// Reset to defaults.
    Reset,
}

/// Runs the config command.
pub async fn run(args: &ConfigArgs, cli: &Cli) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(cli).await,
        ConfigAction::Path => show_paths(cli),
        ConfigAction::Init => init_config().await,
        ConfigAction::Address { address } => set_address(address).await,
        ConfigAction::Reset => reset_config().await,
    }
}

async fn show_config(cli: &Cli) -> Result<()> {
    let settings = super::resolve_settings(cli).await?;

    match cli.format {
        OutputFormat::Text => print_settings(&settings),
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&settings)?);
        }
    }

    Ok(())
}

fn print_settings(settings: &Settings) {
    println!("Stampkit Configuration");
    println!("{}", "─".repeat(40));
    println!();
    println!(
        "Address:          {}",
        settings.address.as_deref().unwrap_or("(not set)")
    );
    println!("IAM URL:          {}", settings.iam_url);
    println!("IAM version:      {}", settings.iam_version);
    println!(
        "IAM token:        {}",
        if settings.iam_token.is_some() { "set" } else { "not set" }
    );
    println!("Signature type:   {}", settings.signature_type.as_str());
    println!("Callback URL:     {}", settings.callback_url);
    println!(
        "Signer command:   {}",
        settings.signer_command.as_deref().unwrap_or("(none)")
    );
    println!(
        "Attestation URL:  {}",
        settings.attestation_url.as_deref().unwrap_or("(none)")
    );
    println!("Chain id:         {}", settings.chain_id);
    println!("Redirect timeout: {}s", settings.redirect_timeout_secs);
    println!("Request timeout:  {}s", settings.request_timeout_secs);
    println!("Log level:        {}", settings.log_level);
}

fn show_paths(cli: &Cli) -> Result<()> {
    let config_dir = default_config_dir();
    let settings_path = default_settings_path();
    let passport_path = default_passport_path();

    match cli.format {
        OutputFormat::Text => {
            println!("Configuration Paths");
            println!("{}", "─".repeat(40));
            println!();
            println!("Config dir:    {}", config_dir.display());
            println!("Settings file: {}", settings_path.display());
            println!("Passport file: {}", passport_path.display());
            println!();
            println!("Environment:   {ENV_ADDRESS}, {ENV_IAM_URL}, {ENV_IAM_TOKEN}");
        }
        OutputFormat::Json => {
            let paths = serde_json::json!({
                "config_dir": config_dir.display().to_string(),
                "settings_file": settings_path.display().to_string(),
                "passport_file": passport_path.display().to_string(),
            });
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&paths)?);
        }
    }

    Ok(())
}

async fn init_config() -> Result<()> {
    let store = SettingsStore::load_default().await?;
    store.save().await?;

    info!(path = %store.path().display(), "Settings written");
    println!("Wrote {}", store.path().display());

    Ok(())
}

async fn set_address(address: &str) -> Result<()> {
    let store = SettingsStore::load_default().await?;
    let address = address.trim().to_string();
    store
        .update(|s| s.address = Some(address.clone()))
        .await;
    store.save().await?;

    info!(%address, "Address updated");
    println!("Address set to: {address}");

    Ok(())
}

async fn reset_config() -> Result<()> {
    let path = default_settings_path();

    if path.exists() {
        tokio::fs::remove_file(&path).await?;
        info!(path = %path.display(), "Settings reset");
        println!("Configuration reset to defaults");
    } else {
        println!("No configuration file to reset");
    }

    Ok(())
}
