//! Multi-platform claim orchestration.
//!
//! [`ClaimOrchestrator::claim_credentials`] walks a [`ClaimBatch`] strictly in
//! order, one platform at a time, so at most one OAuth popup is ever open.
//! For every non-empty entry it:
//!
//! 1. reports the next compact step number to the [`ClaimHandler`],
//! 2. acquires the platform's proof (`EVMBulkVerify` uses empty proofs),
//! 3. ends the whole batch if the proof is a BrightID sponsorship,
//! 4. verifies all selected providers in one request,
//! 5. reports an error for the platform if nothing verified,
//! 6. commits one patch per selected provider.
//!
//! A failure in steps 2, 4 or 6 is logged and marks only that platform as
//! failed; the loop moves on to the next entry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stampkit_core::{
    ClaimTarget, PlatformId, ProviderId, ProviderPayload, RequestPayload, SignatureType,
    StampClaimForPlatform,
};
use stampkit_fetch::VerificationClient;
use stampkit_providers::{PlatformDescriptor, PlatformRegistry, ProofError};
use stampkit_store::PatchApplier;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::error::ClaimError;
use crate::reduce::{build_stamp_patches, dedup_providers, verified_count};

// ============================================================================
// Status
// ============================================================================

/// Batch-wide orchestrator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    /// No batch running.
    #[default]
    Idle,
    /// A batch is running.
    InProgress,
}

/// Progress of one platform within the current batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformStatus {
    /// Waiting its turn.
    Pending,
    /// Acquiring proof or verifying.
    InProgress,
    /// At least one credential committed.
    Verified,
    /// Nothing verified, or processing failed.
    Failed,
    /// Not processed: no providers selected, or the batch ended early.
    Skipped,
}

// ============================================================================
// Collaborators
// ============================================================================

/// Caller-side hooks driven by the orchestrator.
#[async_trait]
pub trait ClaimHandler: Send + Sync {
    /// Called before each non-empty platform, with steps `0, 1, 2, ...`.
    async fn on_claim_step(&self, step: usize);

    /// Called for each platform that produced no valid credential.
    fn indicate_error(&self, _target: &ClaimTarget) {}

    /// Called when a BrightID sponsorship ends the batch.
    async fn on_sponsorship(&self, _platform: PlatformId, _success: bool) {}

    /// Called once after the last platform, unless the batch ended early.
    async fn on_batch_complete(&self) {}
}

/// Acquires a platform's proof bundle.
#[async_trait]
pub trait ProofSource: Send + Sync {
    /// Acquires the proof for `platform` covering `selected` providers.
    async fn acquire(
        &self,
        platform: &'static PlatformDescriptor,
        selected: &[ProviderId],
    ) -> Result<ProviderPayload, ProofError>;
}

// ============================================================================
// Outcomes
// ============================================================================

/// Record of one processed platform.
#[derive(Debug, Clone)]
pub struct PlatformOutcome {
    /// Platform or `EVMBulkVerify`.
    pub target: ClaimTarget,
    /// Step number reported for it.
    pub step: usize,
    /// Final status.
    pub status: PlatformStatus,
    /// Patches committed.
    pub patches: usize,
    /// Patches carrying a credential.
    pub verified: usize,
    /// Error, if processing failed.
    pub error: Option<String>,
}

/// Outcome of a whole batch.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// Processed platforms, in order.
    pub platforms: Vec<PlatformOutcome>,
    /// Number of steps reported.
    pub steps: usize,
    /// True if a sponsorship ended the batch early.
    pub short_circuited: bool,
}

impl BatchOutcome {
    /// Total credentials committed.
    pub fn verified(&self) -> usize {
        self.platforms.iter().map(|p| p.verified).sum()
    }

    /// Platforms that failed.
    pub fn failed(&self) -> impl Iterator<Item = &PlatformOutcome> {
        self.platforms
            .iter()
            .filter(|p| p.status == PlatformStatus::Failed)
    }
}

enum PlatformResult {
    Committed { patches: usize, verified: usize },
    Sponsorship { platform: PlatformId, success: bool },
}

// ============================================================================
// Claim Config
// ============================================================================

/// Request fields shared by every platform in a batch.
#[derive(Debug, Clone)]
pub struct ClaimConfig {
    /// Subject address.
    pub address: String,
    /// Verification API version.
    pub version: String,
    /// Credential signature scheme.
    pub signature_type: SignatureType,
}

// ============================================================================
// Claim Orchestrator
// ============================================================================

/// Resets the batch status when a run ends, however it ends.
struct RunGuard<'a>(&'a watch::Sender<ClaimStatus>);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.send_replace(ClaimStatus::Idle);
    }
}

/// Sequences a claim batch across platforms.
pub struct ClaimOrchestrator {
    verifier: Arc<dyn VerificationClient>,
    patches: Arc<dyn PatchApplier>,
    proofs: Arc<dyn ProofSource>,
    config: ClaimConfig,
    status: watch::Sender<ClaimStatus>,
    platforms: Mutex<HashMap<ClaimTarget, PlatformStatus>>,
}

impl ClaimOrchestrator {
    /// Creates an orchestrator.
    pub fn new(
        verifier: Arc<dyn VerificationClient>,
        patches: Arc<dyn PatchApplier>,
        proofs: Arc<dyn ProofSource>,
        config: ClaimConfig,
    ) -> Self {
        let (status, _) = watch::channel(ClaimStatus::Idle);
        Self {
            verifier,
            patches,
            proofs,
            config,
            status,
            platforms: Mutex::new(HashMap::new()),
        }
    }

    /// Current batch status.
    pub fn status(&self) -> ClaimStatus {
        *self.status.borrow()
    }

    /// Subscribes to batch status changes.
    pub fn subscribe(&self) -> watch::Receiver<ClaimStatus> {
        self.status.subscribe()
    }

    /// Status of one platform in the current or last batch.
    pub fn platform_status(&self, target: &ClaimTarget) -> Option<PlatformStatus> {
        self.platforms
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(target)
            .copied()
    }

    fn set_platform_status(&self, target: ClaimTarget, status: PlatformStatus) {
        self.platforms
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(target, status);
    }

    /// Runs a claim batch.
    ///
    /// Returns [`ClaimError::Busy`] if a batch is already running. Errors
    /// inside a platform never abort the batch; they are recorded in the
    /// returned [`BatchOutcome`].
    #[instrument(skip(self, handler, batch), fields(entries = batch.len()))]
    pub async fn claim_credentials(
        &self,
        handler: &dyn ClaimHandler,
        batch: &[StampClaimForPlatform],
    ) -> Result<BatchOutcome, ClaimError> {
        let started = self.status.send_if_modified(|status| {
            if *status == ClaimStatus::Idle {
                *status = ClaimStatus::InProgress;
                true
            } else {
                false
            }
        });
        if !started {
            return Err(ClaimError::Busy);
        }
        let _guard = RunGuard(&self.status);

        {
            let mut platforms = self.platforms.lock().unwrap_or_else(PoisonError::into_inner);
            platforms.clear();
            for entry in batch {
                let status = if entry.selected_providers.is_empty() {
                    PlatformStatus::Skipped
                } else {
                    PlatformStatus::Pending
                };
                platforms.insert(entry.platform_id, status);
            }
        }

        info!("Claim batch started");
        let mut outcome = BatchOutcome::default();

        for (index, entry) in batch.iter().enumerate() {
            if entry.selected_providers.is_empty() {
                debug!(platform = %entry.platform_id, "No providers selected, skipping");
                continue;
            }

            let step = outcome.steps;
            handler.on_claim_step(step).await;
            outcome.steps += 1;

            let target = entry.platform_id;
            self.set_platform_status(target, PlatformStatus::InProgress);

            let mut record = PlatformOutcome {
                target,
                step,
                status: PlatformStatus::Failed,
                patches: 0,
                verified: 0,
                error: None,
            };

            match self.claim_platform(entry).await {
                Ok(PlatformResult::Committed { patches, verified }) => {
                    record.patches = patches;
                    record.verified = verified;
                    if verified == 0 {
                        warn!(platform = %target, "No valid credentials");
                        handler.indicate_error(&target);
                    } else {
                        record.status = PlatformStatus::Verified;
                        info!(platform = %target, verified, "Platform verified");
                    }
                }
                Ok(PlatformResult::Sponsorship { platform, success }) => {
                    info!(%platform, success, "BrightID sponsorship, ending batch");
                    record.status = PlatformStatus::Skipped;
                    self.set_platform_status(target, PlatformStatus::Skipped);
                    for rest in &batch[index + 1..] {
                        self.set_platform_status(rest.platform_id, PlatformStatus::Skipped);
                    }
                    outcome.platforms.push(record);
                    outcome.short_circuited = true;
                    handler.on_sponsorship(platform, success).await;
                    return Ok(outcome);
                }
                Err(e) => {
                    warn!(platform = %target, error = %e, "Platform claim failed");
                    record.error = Some(e.to_string());
                }
            }

            self.set_platform_status(target, record.status);
            outcome.platforms.push(record);
        }

        handler.on_batch_complete().await;
        info!(
            steps = outcome.steps,
            verified = outcome.verified(),
            "Claim batch finished"
        );
        Ok(outcome)
    }

    #[instrument(skip(self, entry), fields(platform = %entry.platform_id))]
    async fn claim_platform(
        &self,
        entry: &StampClaimForPlatform,
    ) -> Result<PlatformResult, ClaimError> {
        let selected = dedup_providers(&entry.selected_providers);

        let proofs = match entry.platform_id {
            ClaimTarget::EvmBulkVerify => ProviderPayload::new(),
            ClaimTarget::Platform(id) => {
                let desc = PlatformRegistry::get(id)
                    .ok_or(ClaimError::UnknownPlatform(entry.platform_id))?;
                let payload = self.proofs.acquire(desc, &selected).await?;
                if payload.is_sponsorship() {
                    return Ok(PlatformResult::Sponsorship {
                        platform: id,
                        success: payload.code() == Some("success"),
                    });
                }
                payload
            }
        };

        let request = RequestPayload::new(
            entry.platform_id.as_str(),
            self.config.address.as_str(),
            self.config.version.as_str(),
        )
        .with_types(selected.clone())
        .with_proofs(proofs)
        .with_signature_type(self.config.signature_type);

        let bodies = self.verifier.verify(&request).await?;
        let patches = build_stamp_patches(&selected, &bodies);
        let verified = verified_count(&patches);

        self.patches.apply_patches(&patches).await?;
        debug!(patches = patches.len(), verified, "Patches committed");

        Ok(PlatformResult::Committed {
            patches: patches.len(),
            verified,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
