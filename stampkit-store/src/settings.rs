//! User settings store.
//!
//! Manages settings with persistence, environment overrides and change
//! notification.

use serde::{Deserialize, Serialize};
use stampkit_core::SignatureType;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, watch};
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::persistence::{default_settings_path, load_json, save_json};

/// Overrides `iam_url`.
pub const ENV_IAM_URL: &str = "STAMPKIT_IAM_URL";
/// Supplies the bearer token. Never persisted.
pub const ENV_IAM_TOKEN: &str = "STAMPKIT_IAM_TOKEN";
/// Overrides `address`.
pub const ENV_ADDRESS: &str = "STAMPKIT_ADDRESS";

// ============================================================================
// Settings Types
// ============================================================================

/// User settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Verification service base URL.
    pub iam_url: String,

    /// Verification API version.
    pub iam_version: String,

    /// Credential signature scheme.
    pub signature_type: SignatureType,

    /// OAuth redirect target.
    pub callback_url: String,

    /// Attestation signing endpoint.
    pub attestation_url: Option<String>,

    /// Target chain for attestations.
    pub chain_id: String,

    /// How long to wait for an OAuth redirect.
    pub redirect_timeout_secs: u64,

    /// HTTP request timeout.
    pub request_timeout_secs: u64,

    /// External command that signs a message passed as its last argument.
    pub signer_command: Option<String>,

    /// Log level.
    pub log_level: LogLevel,

    /// Wallet address.
    pub address: Option<String>,

    /// Bearer token, from the environment only.
    #[serde(skip)]
    pub iam_token: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            iam_url: "http://localhost:80/api".to_string(),
            iam_version: "0.0.0".to_string(),
            signature_type: SignatureType::default(),
            callback_url: "http://localhost:3000/".to_string(),
            attestation_url: None,
            chain_id: "0xa".to_string(),
            redirect_timeout_secs: 300,
            request_timeout_secs: 30,
            signer_command: None,
            log_level: LogLevel::default(),
            address: None,
            iam_token: None,
        }
    }
}

impl Settings {
    /// Redirect wait as a duration.
    pub fn redirect_timeout(&self) -> Duration {
        Duration::from_secs(self.redirect_timeout_secs)
    }

    /// Request timeout as a duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Applies environment overrides read through `lookup`.
    ///
    /// Empty values are ignored.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = read(ENV_IAM_URL) {
            debug!(iam_url = %url, "IAM URL overridden from environment");
            self.iam_url = url;
        }
        if let Some(token) = read(ENV_IAM_TOKEN) {
            self.iam_token = Some(token);
        }
        if let Some(address) = read(ENV_ADDRESS) {
            self.address = Some(address);
        }
    }

    /// Applies overrides from the process environment.
    #[must_use]
    pub fn with_env(mut self) -> Self {
        self.apply_env_overrides(|key| std::env::var(key).ok());
        self
    }
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Error level logging.
    Error,
    /// Warning level logging.
    #[default]
    Warn,
    /// Info level logging.
    Info,
    /// Debug level logging.
    Debug,
    /// Trace level logging.
    Trace,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Trace => write!(f, "trace"),
        }
    }
}

// ============================================================================
// Settings Store
// ============================================================================

/// Persistent settings store with change notifications.
pub struct SettingsStore {
    settings: Arc<RwLock<Settings>>,
    path: PathBuf,
    notify: watch::Sender<u64>,
    version: Arc<RwLock<u64>>,
}

impl SettingsStore {
    /// Creates a store holding defaults, saved to `path`.
    pub fn new(path: PathBuf) -> Self {
        Self::with_settings(path, Settings::default())
    }

    fn with_settings(path: PathBuf, settings: Settings) -> Self {
        let (notify, _) = watch::channel(0);
        Self {
            settings: Arc::new(RwLock::new(settings)),
            path,
            notify,
            version: Arc::new(RwLock::new(0)),
        }
    }

    /// Loads settings from the default path.
    pub async fn load_default() -> Result<Self, StoreError> {
        Self::load(default_settings_path()).await
    }

    /// Loads settings from a path, falling back to defaults.
    pub async fn load(path: PathBuf) -> Result<Self, StoreError> {
        let settings = if path.exists() {
            info!(path = %path.display(), "Loading settings");
            load_json(&path).await.unwrap_or_else(|e| {
                warn!(error = %e, "Failed to load settings, using defaults");
                Settings::default()
            })
        } else {
            debug!(path = %path.display(), "Settings file not found, using defaults");
            Settings::default()
        };

        Ok(Self::with_settings(path, settings))
    }

    /// Returns the settings file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets a copy of the stored settings.
    pub async fn get(&self) -> Settings {
        self.settings.read().await.clone()
    }

    /// Gets the stored settings with environment overrides applied.
    pub async fn resolved(&self) -> Settings {
        self.get().await.with_env()
    }

    /// Updates settings and notifies subscribers.
    pub async fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut Settings),
    {
        {
            let mut settings = self.settings.write().await;
            f(&mut settings);
        }
        self.notify_change().await;
    }

    /// Saves settings to disk.
    pub async fn save(&self) -> Result<(), StoreError> {
        let settings = self.settings.read().await;
        save_json(&self.path, &*settings).await?;
        info!(path = %self.path.display(), "Settings saved");
        Ok(())
    }

    /// Subscribes to settings changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.notify.subscribe()
    }

    async fn notify_change(&self) {
        let mut version = self.version.write().await;
        *version += 1;
        let _ = self.notify.send(*version);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.iam_version, "0.0.0");
        assert_eq!(settings.signature_type, SignatureType::Eip712);
        assert_eq!(settings.redirect_timeout(), Duration::from_secs(300));
        assert_eq!(settings.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"iam_url": "https://iam.example/api"}"#).unwrap();
        assert_eq!(settings.iam_url, "https://iam.example/api");
        assert_eq!(settings.redirect_timeout_secs, 300);
    }

    #[test]
    fn test_env_overrides() {
        let mut settings = Settings::default();
        settings.apply_env_overrides(env(&[
            (ENV_IAM_URL, "https://iam.example/api"),
            (ENV_IAM_TOKEN, "jwt"),
            (ENV_ADDRESS, "  "),
        ]));

        assert_eq!(settings.iam_url, "https://iam.example/api");
        assert_eq!(settings.iam_token.as_deref(), Some("jwt"));
        assert_eq!(settings.address, None);
    }

    #[tokio::test]
    async fn test_token_is_never_persisted() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");

        let store = SettingsStore::new(path.clone());
        store
            .update(|s| {
                s.iam_token = Some("secret-jwt".into());
                s.address = Some("0xabc".into());
            })
            .await;
        store.save().await.unwrap();

        let raw = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(!raw.contains("secret-jwt"));

        let reloaded = SettingsStore::load(path).await.unwrap().get().await;
        assert_eq!(reloaded.address.as_deref(), Some("0xabc"));
        assert_eq!(reloaded.iam_token, None);
    }

    #[tokio::test]
    async fn test_update_notifies_subscribers() {
        let store = SettingsStore::new(PathBuf::from("unused.json"));
        let mut rx = store.subscribe();

        store.update(|s| s.chain_id = "0x1".into()).await;

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), 1);
        assert_eq!(store.get().await.chain_id, "0x1");
    }

    #[tokio::test]
    async fn test_load_corrupt_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        tokio::fs::write(&path, "{{{").await.unwrap();

        let store = SettingsStore::load(path).await.unwrap();
        assert_eq!(store.get().await, Settings::default());
    }
}
