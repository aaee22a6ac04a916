//! Discord platform descriptor.

use stampkit_core::PlatformId;

use crate::descriptor::{
    OAuthConfig, PlatformDescriptor, PlatformMetadata, ProofPlan, ProviderGroup,
};

pub fn discord_descriptor() -> PlatformDescriptor {
    PlatformDescriptor {
        id: PlatformId::Discord,
        metadata: PlatformMetadata::for_platform(
            PlatformId::Discord,
            "Connect your existing Discord account to verify.",
        ),
        groups: vec![ProviderGroup::new("Account Name", &[("Discord", "Encrypted")])],
        oauth: Some(OAuthConfig {
            authorize_url: "https://discord.com/api/oauth2/authorize",
            client_id_env: "STAMPKIT_DISCORD_CLIENT_ID",
            scope: "identify",
        }),
        proof_plan: ProofPlan::oauth(),
    }
}
