//! LinkedIn platform descriptor.

use stampkit_core::PlatformId;

use crate::descriptor::{
    OAuthConfig, PlatformDescriptor, PlatformMetadata, ProofPlan, ProviderGroup,
};

pub fn linkedin_descriptor() -> PlatformDescriptor {
    PlatformDescriptor {
        id: PlatformId::Linkedin,
        metadata: PlatformMetadata::for_platform(
            PlatformId::Linkedin,
            "Connect your existing LinkedIn account to verify.",
        ),
        groups: vec![ProviderGroup::new("Account Name", &[("Linkedin", "Encrypted")])],
        oauth: Some(OAuthConfig {
            authorize_url: "https://www.linkedin.com/oauth/v2/authorization",
            client_id_env: "STAMPKIT_LINKEDIN_CLIENT_ID",
            scope: "r_emailaddress r_liteprofile",
        }),
        proof_plan: ProofPlan::oauth(),
    }
}
