//! One-click verification of address-derived providers.
//!
//! No popup and no per-platform loop: discovery picks the providers the
//! address qualifies for and does not already hold, and a single
//! `EVMBulkVerify` request covers all of them.

use std::collections::HashSet;
use std::sync::Arc;

use stampkit_core::{
    EVM_BULK_VERIFY, PlatformId, ProviderId, ProviderPayload, RequestPayload, StampPatch,
};
use stampkit_fetch::VerificationClient;
use stampkit_providers::{PlatformRegistry, ProviderDiscovery, ValidatedPlatform};
use stampkit_store::PatchApplier;
use tracing::{debug, error, info, instrument};

use crate::error::BulkVerifyError;
use crate::orchestrator::ClaimConfig;
use crate::reduce::{build_stamp_patches, dedup_providers, verified_count};

/// Result of a bulk verification.
#[derive(Debug, Clone, Default)]
pub struct BulkOutcome {
    /// Platforms discovery found candidates on.
    pub platforms: Vec<ValidatedPlatform>,
    /// Providers sent for verification.
    pub requested: Vec<ProviderId>,
    /// Patches committed.
    pub patches: Vec<StampPatch>,
}

impl BulkOutcome {
    /// Patches carrying a credential.
    pub fn verified(&self) -> usize {
        verified_count(&self.patches)
    }

    /// True if discovery found nothing to verify.
    pub fn is_empty(&self) -> bool {
        self.requested.is_empty()
    }
}

/// Single-shot verifier for EVM platforms.
pub struct BulkEvmVerifier {
    verifier: Arc<dyn VerificationClient>,
    patches: Arc<dyn PatchApplier>,
    discovery: Arc<dyn ProviderDiscovery>,
    config: ClaimConfig,
}

impl BulkEvmVerifier {
    /// Creates a bulk verifier.
    pub fn new(
        verifier: Arc<dyn VerificationClient>,
        patches: Arc<dyn PatchApplier>,
        discovery: Arc<dyn ProviderDiscovery>,
        config: ClaimConfig,
    ) -> Self {
        Self {
            verifier,
            patches,
            discovery,
            config,
        }
    }

    /// Discovers, verifies and commits eligible providers.
    ///
    /// `existing` holds providers with a valid, unexpired stamp; they are
    /// skipped unless `reissue` is set. With no candidates this returns
    /// immediately without contacting the verification service.
    #[instrument(skip(self, existing), fields(address = %self.config.address))]
    pub async fn verify(
        &self,
        existing: &HashSet<ProviderId>,
        reissue: bool,
    ) -> Result<BulkOutcome, BulkVerifyError> {
        let evm: Vec<PlatformId> = PlatformRegistry::evm_platforms()
            .iter()
            .map(|d| d.id)
            .collect();

        let platforms = self
            .discovery
            .discover(&self.config.address, &evm, existing, reissue)
            .await;
        let candidates: Vec<ProviderId> = platforms
            .iter()
            .flat_map(ValidatedPlatform::candidate_ids)
            .cloned()
            .collect();
        let requested = dedup_providers(&candidates);

        if requested.is_empty() {
            info!("No eligible providers, nothing to verify");
            return Ok(BulkOutcome {
                platforms,
                ..BulkOutcome::default()
            });
        }
        debug!(candidates = requested.len(), "Verifying eligible providers");

        let request = RequestPayload::new(
            EVM_BULK_VERIFY,
            self.config.address.as_str(),
            self.config.version.as_str(),
        )
        .with_types(requested.clone())
        .with_proofs(ProviderPayload::new())
        .with_signature_type(self.config.signature_type);

        let bodies = self.verifier.verify(&request).await.inspect_err(|e| {
            error!(error = %e, "Bulk verification failed");
        })?;
        let patches = build_stamp_patches(&requested, &bodies);

        self.patches.apply_patches(&patches).await.inspect_err(|e| {
            error!(error = %e, "Bulk patch commit failed");
        })?;

        info!(
            requested = requested.len(),
            verified = verified_count(&patches),
            "Bulk verification committed"
        );
        Ok(BulkOutcome {
            platforms,
            requested,
            patches,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::tests::{MockStore, MockVerifier};
    use async_trait::async_trait;
    use stampkit_core::SignatureType;
    use stampkit_providers::{ValidatedGroup, ValidatedProvider};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockDiscovery {
        found: Vec<ValidatedPlatform>,
        seen: Mutex<Vec<Vec<PlatformId>>>,
    }

    #[async_trait]
    impl ProviderDiscovery for MockDiscovery {
        async fn discover(
            &self,
            _address: &str,
            platforms: &[PlatformId],
            _existing: &HashSet<ProviderId>,
            _reissue: bool,
        ) -> Vec<ValidatedPlatform> {
            self.seen.lock().unwrap().push(platforms.to_vec());
            self.found.clone()
        }
    }

    fn validated(platform: PlatformId, providers: &[&str]) -> ValidatedPlatform {
        ValidatedPlatform {
            platform,
            groups: vec![ValidatedGroup {
                name: "Group".into(),
                providers: providers
                    .iter()
                    .map(|p| ValidatedProvider {
                        name: (*p).into(),
                        title: String::new(),
                    })
                    .collect(),
            }],
        }
    }

    fn verifier_with(
        verifier: &Arc<MockVerifier>,
        store: &Arc<MockStore>,
        discovery: MockDiscovery,
    ) -> BulkEvmVerifier {
        BulkEvmVerifier::new(
            verifier.clone(),
            store.clone(),
            Arc::new(discovery),
            ClaimConfig {
                address: "0xabc".into(),
                version: "0.0.0".into(),
                signature_type: SignatureType::Eip712,
            },
        )
    }

    #[tokio::test]
    async fn test_no_candidates_makes_no_request() {
        let verifier = Arc::new(MockVerifier::default());
        let store = Arc::new(MockStore::default());
        let bulk = verifier_with(&verifier, &store, MockDiscovery::default());

        let outcome = bulk.verify(&HashSet::new(), false).await.unwrap();

        assert!(outcome.is_empty());
        assert_eq!(verifier.calls(), 0);
        assert!(store.commits.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_single_request_covers_all_platforms() {
        let verifier = Arc::new(MockVerifier {
            valid: ["Ens".to_string()].into_iter().collect(),
            ..Default::default()
        });
        let store = Arc::new(MockStore::default());
        let discovery = MockDiscovery {
            found: vec![
                validated(PlatformId::Eth, &["ethPossessionsGte#1", "EthGasProvider"]),
                validated(PlatformId::Ens, &["Ens"]),
            ],
            ..Default::default()
        };
        let bulk = verifier_with(&verifier, &store, discovery);

        let outcome = bulk.verify(&HashSet::new(), false).await.unwrap();

        assert_eq!(verifier.calls(), 1);
        let request = verifier.requests.lock().unwrap()[0].clone();
        assert_eq!(request.kind, "EVMBulkVerify");
        assert!(request.proofs.is_empty());
        assert_eq!(request.types.len(), 3);

        assert_eq!(outcome.patches.len(), 3);
        assert_eq!(outcome.verified(), 1);
        assert_eq!(store.commits.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_discovery_sees_only_evm_platforms() {
        let verifier = Arc::new(MockVerifier::default());
        let store = Arc::new(MockStore::default());
        let discovery = Arc::new(MockDiscovery::default());
        let bulk = BulkEvmVerifier::new(
            verifier,
            store,
            discovery.clone(),
            ClaimConfig {
                address: "0xabc".into(),
                version: "0.0.0".into(),
                signature_type: SignatureType::Eip712,
            },
        );

        bulk.verify(&HashSet::new(), false).await.unwrap();

        let seen = discovery.seen.lock().unwrap();
        assert!(seen[0].contains(&PlatformId::Eth));
        assert!(!seen[0].contains(&PlatformId::Google));
    }

    #[tokio::test]
    async fn test_rejected_request_fails_the_batch() {
        let verifier = Arc::new(MockVerifier {
            fail_kinds: ["EVMBulkVerify".to_string()].into_iter().collect(),
            ..Default::default()
        });
        let store = Arc::new(MockStore::default());
        let discovery = MockDiscovery {
            found: vec![validated(PlatformId::Ens, &["Ens"])],
            ..Default::default()
        };
        let bulk = verifier_with(&verifier, &store, discovery);

        let err = bulk.verify(&HashSet::new(), false).await;
        assert!(matches!(err, Err(BulkVerifyError::Verify(_))));
        assert!(store.commits.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_patch_failure_propagates() {
        let verifier = Arc::new(MockVerifier::default());
        let store = Arc::new(MockStore {
            reject: true,
            ..Default::default()
        });
        let discovery = MockDiscovery {
            found: vec![validated(PlatformId::Ens, &["Ens"])],
            ..Default::default()
        };
        let bulk = verifier_with(&verifier, &store, discovery);

        let err = bulk.verify(&HashSet::new(), false).await;
        assert!(matches!(err, Err(BulkVerifyError::Patch(_))));
    }
}
