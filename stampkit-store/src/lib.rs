// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `Stampkit` Store
//!
//! State management for `Stampkit`.
//!
//! This crate provides:
//!
//! - **PassportStore**: The user's Stamps, updated through [`PatchApplier`]
//! - **SettingsStore**: User settings with persistence and env overrides
//! - **Persistence**: File I/O helpers for JSON data
//!
//! ## Usage
//!
//! ```ignore
//! use stampkit_store::{PassportStore, PatchApplier, SettingsStore};
//!
//! let settings = SettingsStore::load_default().await?;
//! let passport = PassportStore::open(default_passport_path()).await?;
//!
//! passport.apply_patches(&patches).await?;
//!
//! let mut rx = passport.subscribe();
//! while rx.changed().await.is_ok() {
//!     println!("Passport updated!");
//! }
//! ```

pub mod error;
pub mod passport_store;
pub mod persistence;
pub mod settings;

pub use error::StoreError;
pub use passport_store::{PassportStore, PatchApplier};
pub use persistence::{
    default_config_dir, default_passport_path, default_settings_path, ensure_dir, load_json,
    load_json_or_default, save_json,
};
pub use settings::{ENV_ADDRESS, ENV_IAM_TOKEN, ENV_IAM_URL, LogLevel, Settings, SettingsStore};
