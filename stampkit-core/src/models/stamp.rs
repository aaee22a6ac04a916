//! Stamps, passports, patches and claim batches.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::credential::VerifiableCredential;
use super::platform::{ClaimTarget, ProviderId};

// ============================================================================
// Stamp & Passport
// ============================================================================

/// A verified credential bound to one provider id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stamp {
    /// Provider id.
    pub provider: ProviderId,
    /// The credential.
    pub credential: VerifiableCredential,
}

/// A user's full Stamp set plus metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Passport {
    /// When the passport was first written.
    pub issuance_date: DateTime<Utc>,
    /// Latest expiry across stamps, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<DateTime<Utc>>,
    /// Stamps, at most one per provider.
    #[serde(default)]
    pub stamps: Vec<Stamp>,
}

impl Passport {
    /// Creates an empty passport issued at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            issuance_date: now,
            expiry_date: None,
            stamps: Vec::new(),
        }
    }

    /// Gets the stamp for a provider.
    pub fn stamp(&self, provider: &ProviderId) -> Option<&Stamp> {
        self.stamps.iter().find(|s| &s.provider == provider)
    }

    /// Providers holding an unexpired stamp at `now`.
    pub fn valid_providers(&self, now: DateTime<Utc>) -> HashSet<ProviderId> {
        self.stamps
            .iter()
            .filter(|s| !s.credential.is_expired(now))
            .map(|s| s.provider.clone())
            .collect()
    }

    /// Recomputes `expiry_date` from the stamps.
    pub fn refresh_expiry(&mut self) {
        self.expiry_date = self
            .stamps
            .iter()
            .filter_map(|s| s.credential.expires_at())
            .max();
    }
}

// ============================================================================
// Stamp Patch
// ============================================================================

/// One commit or clear instruction for the credential store.
///
/// A patch with a credential upserts the stamp; a provider-only patch clears
/// any existing stamp for that provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StampPatch {
    /// Provider id.
    pub provider: ProviderId,
    /// Credential to store, or `None` to clear.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<VerifiableCredential>,
}

impl StampPatch {
    /// Patch that stores `credential` for `provider`.
    pub fn upsert(provider: ProviderId, credential: VerifiableCredential) -> Self {
        Self {
            provider,
            credential: Some(credential),
        }
    }

    /// Patch that clears `provider`.
    pub fn clear(provider: ProviderId) -> Self {
        Self {
            provider,
            credential: None,
        }
    }

    /// Returns true if this patch carries a credential.
    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }
}

// ============================================================================
// Claim Batch
// ============================================================================

/// One platform entry in a claim batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StampClaimForPlatform {
    /// Platform or `EVMBulkVerify`.
    pub platform_id: ClaimTarget,
    /// Providers to claim for this platform.
    pub selected_providers: Vec<ProviderId>,
}

impl StampClaimForPlatform {
    /// Creates a claim entry.
    pub fn new(platform_id: impl Into<ClaimTarget>, selected_providers: Vec<ProviderId>) -> Self {
        Self {
            platform_id: platform_id.into(),
            selected_providers,
        }
    }
}

/// Ordered platform-claim list, consumed linearly.
pub type ClaimBatch = Vec<StampClaimForPlatform>;
