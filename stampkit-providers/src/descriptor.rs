//! Platform descriptor system.
//!
//! A descriptor contains all the static configuration for a platform:
//! - Metadata (display name, description, EVM capability)
//! - Provider groups (the Stamps it can issue)
//! - OAuth configuration, if proofs come from a popup
//! - Proof plan (how to acquire a proof)

use stampkit_core::{PlatformId, ProviderId};
use url::Url;

use crate::proof::{ProofKind, ProofProvider};

// ============================================================================
// Platform Descriptor
// ============================================================================

/// Complete descriptor for a platform.
pub struct PlatformDescriptor {
    /// Platform identifier.
    pub id: PlatformId,
    /// Display metadata.
    pub metadata: PlatformMetadata,
    /// Provider groups, in display order.
    pub groups: Vec<ProviderGroup>,
    /// OAuth configuration for popup platforms.
    pub oauth: Option<OAuthConfig>,
    /// How to acquire a proof.
    pub proof_plan: ProofPlan,
}

impl PlatformDescriptor {
    /// Returns the display name.
    pub fn display_name(&self) -> &str {
        &self.metadata.display_name
    }

    /// Returns the wire path.
    pub fn path(&self) -> &'static str {
        self.id.path()
    }

    /// Returns true if proofs derive from the address alone.
    pub fn is_evm(&self) -> bool {
        self.metadata.is_evm
    }

    /// All provider ids across groups, in order.
    pub fn provider_ids(&self) -> Vec<ProviderId> {
        self.groups
            .iter()
            .flat_map(|g| g.providers.iter().map(|p| p.id.clone()))
            .collect()
    }

    /// Returns true if this platform issues `provider`.
    pub fn has_provider(&self, provider: &ProviderId) -> bool {
        self.groups
            .iter()
            .any(|g| g.providers.iter().any(|p| &p.id == provider))
    }

    /// Builds the proof provider for this platform.
    pub fn build_proof(&self) -> Box<dyn ProofProvider> {
        (self.proof_plan.build_proof)()
    }
}

impl std::fmt::Debug for PlatformDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformDescriptor")
            .field("id", &self.id)
            .field("groups", &self.groups.len())
            .field("proof", &self.proof_plan.kind)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Metadata
// ============================================================================

/// Display metadata for a platform.
#[derive(Debug, Clone)]
pub struct PlatformMetadata {
    /// Human-readable name.
    pub display_name: String,
    /// One-line description.
    pub description: String,
    /// Where users connect their account.
    pub connect_url: Option<String>,
    /// Whether providers are verifiable from the address alone.
    pub is_evm: bool,
}

impl PlatformMetadata {
    /// Creates metadata with the platform's default display name.
    pub fn for_platform(id: PlatformId, description: &str) -> Self {
        Self {
            display_name: id.display_name().to_string(),
            description: description.to_string(),
            connect_url: None,
            is_evm: false,
        }
    }
}

// ============================================================================
// Provider Groups
// ============================================================================

/// A named group of providers within a platform.
#[derive(Debug, Clone)]
pub struct ProviderGroup {
    /// Group name.
    pub name: &'static str,
    /// Providers in this group.
    pub providers: Vec<ProviderSpec>,
}

impl ProviderGroup {
    /// Creates a group from `(id, title)` pairs.
    pub fn new(name: &'static str, providers: &[(&str, &'static str)]) -> Self {
        Self {
            name,
            providers: providers
                .iter()
                .map(|(id, title)| ProviderSpec {
                    id: ProviderId::from(*id),
                    title: *title,
                })
                .collect(),
        }
    }
}

/// One provider a platform can issue.
#[derive(Debug, Clone)]
pub struct ProviderSpec {
    /// Provider id.
    pub id: ProviderId,
    /// Short description of the claim.
    pub title: &'static str,
}

// ============================================================================
// OAuth Config
// ============================================================================

/// OAuth 2.0 popup configuration.
#[derive(Debug, Clone, Copy)]
pub struct OAuthConfig {
    /// Authorization endpoint.
    pub authorize_url: &'static str,
    /// Environment variable holding the client id.
    pub client_id_env: &'static str,
    /// Requested scope.
    pub scope: &'static str,
}

impl OAuthConfig {
    /// Reads the client id from the environment.
    pub fn client_id(&self) -> String {
        std::env::var(self.client_id_env).unwrap_or_default()
    }

    /// Builds the authorization URL for a popup.
    pub fn authorize_url(
        &self,
        client_id: &str,
        callback_url: &str,
        state: &str,
    ) -> Result<Url, url::ParseError> {
        Url::parse_with_params(
            self.authorize_url,
            &[
                ("response_type", "code"),
                ("client_id", client_id),
                ("redirect_uri", callback_url),
                ("scope", self.scope),
                ("state", state),
            ],
        )
    }
}

// ============================================================================
// Proof Plan
// ============================================================================

/// Configuration for how to acquire a proof.
pub struct ProofPlan {
    /// Kind of proof acquisition.
    pub kind: ProofKind,
    /// Function to build the proof provider.
    pub build_proof: fn() -> Box<dyn ProofProvider>,
}

impl ProofPlan {
    /// Plan for OAuth popup platforms.
    pub fn oauth() -> Self {
        Self {
            kind: ProofKind::OAuthPopup,
            build_proof: || -> Box<dyn ProofProvider> { Box::new(crate::proof::OAuthProof) },
        }
    }

    /// Plan for address-derived platforms.
    pub fn address() -> Self {
        Self {
            kind: ProofKind::AddressDerived,
            build_proof: || -> Box<dyn ProofProvider> { Box::new(crate::proof::AddressProof) },
        }
    }
}

impl Default for ProofPlan {
    fn default() -> Self {
        Self::address()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize_url_params() {
        let cfg = OAuthConfig {
            authorize_url: "https://github.com/login/oauth/authorize",
            client_id_env: "UNUSED",
            scope: "read:user",
        };
        let url = cfg
            .authorize_url("cid", "http://localhost:3000/callback", "Github-abc")
            .unwrap();

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("client_id".into(), "cid".into())));
        assert!(pairs.contains(&("state".into(), "Github-abc".into())));
        assert!(pairs.contains(&("redirect_uri".into(), "http://localhost:3000/callback".into())));
    }

    #[test]
    fn test_group_builder() {
        let group = ProviderGroup::new("Followers", &[("TenOrMoreGithubFollowers", "Ten or more")]);
        assert_eq!(group.providers[0].id.as_str(), "TenOrMoreGithubFollowers");
    }
}
