//! Eligible-provider discovery for address-derived platforms.
//!
//! Discovery narrows the EVM platforms down to the providers the address
//! does not already hold and currently qualifies for, regrouped under their
//! platform and provider groups for display and bulk verification.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stampkit_core::{PlatformId, ProviderId};
use stampkit_fetch::IamClient;
use tracing::{debug, instrument, warn};

use crate::descriptor::PlatformDescriptor;
use crate::error::DiscoveryError;
use crate::registry::PlatformRegistry;

// ============================================================================
// Validated Results
// ============================================================================

/// One provider the address qualifies for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedProvider {
    /// Provider id.
    pub name: ProviderId,
    /// Short description of the claim.
    pub title: String,
}

/// A provider group with at least one qualifying provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedGroup {
    /// Group name.
    pub name: String,
    /// Qualifying providers, in descriptor order.
    pub providers: Vec<ValidatedProvider>,
}

/// A platform with at least one qualifying provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedPlatform {
    /// Platform id.
    pub platform: PlatformId,
    /// Groups with qualifying providers.
    pub groups: Vec<ValidatedGroup>,
}

impl ValidatedPlatform {
    /// All qualifying provider ids on this platform.
    pub fn candidate_ids(&self) -> impl Iterator<Item = &ProviderId> {
        self.groups
            .iter()
            .flat_map(|g| g.providers.iter().map(|p| &p.name))
    }
}

// ============================================================================
// Discovery Trait
// ============================================================================

/// Finds providers an address is eligible for.
#[async_trait]
pub trait ProviderDiscovery: Send + Sync {
    /// Returns the EVM platforms among `platforms` with qualifying providers.
    ///
    /// Providers in `existing` are skipped unless `reissue` is set.
    async fn discover(
        &self,
        address: &str,
        platforms: &[PlatformId],
        existing: &HashSet<ProviderId>,
        reissue: bool,
    ) -> Vec<ValidatedPlatform>;
}

/// Candidate providers: EVM platforms only, minus already-held stamps.
fn candidates(
    platforms: &[PlatformId],
    existing: &HashSet<ProviderId>,
    reissue: bool,
) -> Vec<(&'static PlatformDescriptor, Vec<ProviderId>)> {
    platforms
        .iter()
        .filter_map(|id| PlatformRegistry::get(*id))
        .filter(|desc| desc.is_evm())
        .map(|desc| {
            let ids: Vec<ProviderId> = desc
                .provider_ids()
                .into_iter()
                .filter(|p| reissue || !existing.contains(p))
                .collect();
            (desc, ids)
        })
        .filter(|(_, ids)| !ids.is_empty())
        .collect()
}

/// Regroups qualifying providers under their descriptor's groups.
fn regroup(
    desc: &PlatformDescriptor,
    qualifies: impl Fn(&ProviderId) -> bool,
) -> Option<ValidatedPlatform> {
    let groups: Vec<ValidatedGroup> = desc
        .groups
        .iter()
        .filter_map(|group| {
            let providers: Vec<ValidatedProvider> = group
                .providers
                .iter()
                .filter(|p| qualifies(&p.id))
                .map(|p| ValidatedProvider {
                    name: p.id.clone(),
                    title: p.title.to_string(),
                })
                .collect();
            (!providers.is_empty()).then(|| ValidatedGroup {
                name: group.name.to_string(),
                providers,
            })
        })
        .collect();

    (!groups.is_empty()).then_some(ValidatedPlatform {
        platform: desc.id,
        groups,
    })
}

// ============================================================================
// IAM Discovery
// ============================================================================

/// Discovery backed by the verification service's `/check` endpoint.
pub struct IamDiscovery {
    iam: Arc<IamClient>,
    version: String,
}

impl IamDiscovery {
    /// Creates a discovery client for IAM API `version`.
    pub fn new(iam: Arc<IamClient>, version: impl Into<String>) -> Self {
        Self {
            iam,
            version: version.into(),
        }
    }

    /// Like [`ProviderDiscovery::discover`], but surfaces check failures.
    #[instrument(skip(self, platforms, existing))]
    pub async fn try_discover(
        &self,
        address: &str,
        platforms: &[PlatformId],
        existing: &HashSet<ProviderId>,
        reissue: bool,
    ) -> Result<Vec<ValidatedPlatform>, DiscoveryError> {
        let candidates = candidates(platforms, existing, reissue);
        if candidates.is_empty() {
            debug!("No candidate providers");
            return Ok(Vec::new());
        }

        let types: Vec<ProviderId> = candidates
            .iter()
            .flat_map(|(_, ids)| ids.iter().cloned())
            .collect();
        let results = self.iam.check(address, &types, &self.version).await?;

        let valid: HashSet<&str> = results
            .iter()
            .filter(|r| r.valid)
            .map(|r| r.kind.as_str())
            .collect();

        let platforms: Vec<ValidatedPlatform> = candidates
            .iter()
            .filter_map(|(desc, ids)| {
                regroup(desc, |p| ids.contains(p) && valid.contains(p.check_type()))
            })
            .collect();

        debug!(platforms = platforms.len(), "Discovery completed");
        Ok(platforms)
    }
}

#[async_trait]
impl ProviderDiscovery for IamDiscovery {
    async fn discover(
        &self,
        address: &str,
        platforms: &[PlatformId],
        existing: &HashSet<ProviderId>,
        reissue: bool,
    ) -> Vec<ValidatedPlatform> {
        match self.try_discover(address, platforms, existing, reissue).await {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, "Eligibility check failed, no candidates");
                Vec::new()
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{Value, json};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockCheck {
        valid: Vec<&'static str>,
        fail: bool,
        seen: Mutex<Vec<Vec<String>>>,
    }

    async fn check_handler(
        State(state): State<Arc<MockCheck>>,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        let types: Vec<String> = body["payload"]["types"]
            .as_array()
            .cloned()
            .unwrap_or_default()
            .iter()
            .filter_map(|t| t.as_str().map(str::to_string))
            .collect();
        state.seen.lock().unwrap().push(types.clone());

        if state.fail {
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "down"})));
        }

        let results: Vec<Value> = types
            .iter()
            .map(|t| json!({"type": t, "valid": state.valid.contains(&t.as_str())}))
            .collect();
        (StatusCode::OK, Json(Value::Array(results)))
    }

    async fn spawn(state: Arc<MockCheck>) -> IamDiscovery {
        let app = Router::new()
            .route("/v0.0.0/check", post(check_handler))
            .with_state(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let iam = IamClient::builder(format!("http://{addr}")).build();
        IamDiscovery::new(Arc::new(iam), "0.0.0")
    }

    #[tokio::test]
    async fn test_valid_types_regroup_under_platforms() {
        let state = Arc::new(MockCheck {
            valid: vec!["ethPossessionsGte#1", "EthGasProvider", "Ens"],
            ..Default::default()
        });
        let discovery = spawn(state.clone()).await;

        let found = discovery
            .discover(
                "0xabc",
                &[PlatformId::Eth, PlatformId::Ens, PlatformId::Github],
                &HashSet::new(),
                false,
            )
            .await;

        let platforms: Vec<PlatformId> = found.iter().map(|p| p.platform).collect();
        assert_eq!(platforms, vec![PlatformId::Eth, PlatformId::Ens]);

        let eth: Vec<&str> = found[0].candidate_ids().map(ProviderId::as_str).collect();
        assert_eq!(eth, vec!["ethPossessionsGte#1", "EthGasProvider"]);

        // GitHub is not address-derived and never reaches the check.
        let seen = state.seen.lock().unwrap();
        assert!(!seen[0].iter().any(|t| t == "Github"));
    }

    #[tokio::test]
    async fn test_existing_stamps_are_skipped_unless_reissue() {
        let state = Arc::new(MockCheck {
            valid: vec!["Ens"],
            ..Default::default()
        });
        let discovery = spawn(state.clone()).await;
        let existing: HashSet<ProviderId> = [ProviderId::from("Ens")].into_iter().collect();

        let found = discovery
            .discover("0xabc", &[PlatformId::Ens], &existing, false)
            .await;
        assert!(found.is_empty());
        assert!(state.seen.lock().unwrap().is_empty(), "no candidates, no request");

        let found = discovery
            .discover("0xabc", &[PlatformId::Ens], &existing, true)
            .await;
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_check_yields_no_candidates() {
        let state = Arc::new(MockCheck {
            fail: true,
            ..Default::default()
        });
        let discovery = spawn(state).await;

        let found = discovery
            .discover("0xabc", &[PlatformId::Eth], &HashSet::new(), false)
            .await;
        assert!(found.is_empty());

        let err = discovery
            .try_discover("0xabc", &[PlatformId::Eth], &HashSet::new(), false)
            .await;
        assert!(matches!(err, Err(DiscoveryError::Check(_))));
    }

    #[test]
    fn test_regroup_drops_empty_groups() {
        let desc = PlatformRegistry::get(PlatformId::Eth).unwrap();
        let only_gas = regroup(desc, |p| p.as_str() == "EthGasProvider").unwrap();
        assert_eq!(only_gas.groups.len(), 1);
        assert!(regroup(desc, |_| false).is_none());
    }
}
