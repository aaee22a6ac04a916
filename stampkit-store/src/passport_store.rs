//! Passport store.
//!
//! Holds the user's Stamps and applies [`StampPatch`]es to them. A patch
//! with a credential replaces the stamp for its provider; a provider-only
//! patch removes it. Applying the same patches twice leaves the passport
//! unchanged.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use stampkit_core::{Passport, ProviderId, Stamp, StampPatch};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{RwLock, watch};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::persistence::{load_json, save_json};

// ============================================================================
// Patch Applier
// ============================================================================

/// Commits stamp patches to durable credential storage.
#[async_trait]
pub trait PatchApplier: Send + Sync {
    /// Applies `patches` in order.
    async fn apply_patches(&self, patches: &[StampPatch]) -> Result<(), StoreError>;
}

// ============================================================================
// Passport Store
// ============================================================================

/// In-memory passport with optional JSON persistence.
///
/// Observable via a watch channel that ticks once per applied batch.
pub struct PassportStore {
    passport: Arc<RwLock<Passport>>,
    path: Option<PathBuf>,
    notify: watch::Sender<u64>,
    version: Arc<RwLock<u64>>,
}

impl Default for PassportStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PassportStore {
    /// Creates an empty in-memory store.
    pub fn new() -> Self {
        Self::from_passport(Passport::new(Utc::now()), None)
    }

    fn from_passport(passport: Passport, path: Option<PathBuf>) -> Self {
        let (notify, _) = watch::channel(0);
        Self {
            passport: Arc::new(RwLock::new(passport)),
            path,
            notify,
            version: Arc::new(RwLock::new(0)),
        }
    }

    /// Loads the passport from `path`, or starts empty if the file is missing.
    ///
    /// Every applied batch is written back to `path`.
    pub async fn open(path: PathBuf) -> Result<Self, StoreError> {
        let passport = if path.exists() {
            info!(path = %path.display(), "Loading passport");
            load_json(&path).await?
        } else {
            debug!(path = %path.display(), "No passport file, starting empty");
            Passport::new(Utc::now())
        };
        Ok(Self::from_passport(passport, Some(path)))
    }

    /// Gets a copy of the passport.
    pub async fn get(&self) -> Passport {
        self.passport.read().await.clone()
    }

    /// Gets the stamp for a provider.
    pub async fn stamp(&self, provider: &ProviderId) -> Option<Stamp> {
        self.passport.read().await.stamp(provider).cloned()
    }

    /// Providers holding an unexpired stamp at `now`.
    pub async fn valid_providers(&self, now: DateTime<Utc>) -> HashSet<ProviderId> {
        self.passport.read().await.valid_providers(now)
    }

    /// Number of stamps.
    pub async fn len(&self) -> usize {
        self.passport.read().await.stamps.len()
    }

    /// Returns true if there are no stamps.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Subscribes to passport changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.notify.subscribe()
    }

    async fn notify_change(&self) {
        let mut version = self.version.write().await;
        *version += 1;
        let _ = self.notify.send(*version);
    }
}

fn apply_patch(passport: &mut Passport, patch: &StampPatch) {
    match &patch.credential {
        Some(credential) => {
            let stamp = Stamp {
                provider: patch.provider.clone(),
                credential: credential.clone(),
            };
            match passport.stamps.iter_mut().find(|s| s.provider == patch.provider) {
                Some(existing) => *existing = stamp,
                None => passport.stamps.push(stamp),
            }
        }
        None => passport.stamps.retain(|s| s.provider != patch.provider),
    }
}

#[async_trait]
impl PatchApplier for PassportStore {
    async fn apply_patches(&self, patches: &[StampPatch]) -> Result<(), StoreError> {
        if let Some(bad) = patches.iter().find(|p| p.provider.as_str().is_empty()) {
            return Err(StoreError::PatchRejected {
                provider: bad.provider.to_string(),
                reason: "empty provider id".to_string(),
            });
        }

        // The write lock is held until the batch is persisted, so a failed
        // save leaves the in-memory passport untouched.
        let mut passport = self.passport.write().await;
        let mut next = passport.clone();
        for patch in patches {
            apply_patch(&mut next, patch);
        }
        next.refresh_expiry();

        if let Some(path) = &self.path {
            save_json(path, &next).await?;
        }

        let upserts = patches.iter().filter(|p| p.has_credential()).count();
        info!(
            upserts,
            clears = patches.len() - upserts,
            stamps = next.stamps.len(),
            "Applied stamp patches"
        );
        *passport = next;
        drop(passport);

        self.notify_change().await;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
