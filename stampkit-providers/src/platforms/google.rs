//! Google platform descriptor.

use stampkit_core::PlatformId;

use crate::descriptor::{
    OAuthConfig, PlatformDescriptor, PlatformMetadata, ProofPlan, ProviderGroup,
};

pub fn google_descriptor() -> PlatformDescriptor {
    PlatformDescriptor {
        id: PlatformId::Google,
        metadata: PlatformMetadata {
            connect_url: Some("https://accounts.google.com".to_string()),
            ..PlatformMetadata::for_platform(
                PlatformId::Google,
                "Connect to Google to verify your email address.",
            )
        },
        groups: vec![ProviderGroup::new("Account Name", &[("Google", "Encrypted")])],
        oauth: Some(OAuthConfig {
            authorize_url: "https://accounts.google.com/o/oauth2/v2/auth",
            client_id_env: "STAMPKIT_GOOGLE_CLIENT_ID",
            scope: "email profile",
        }),
        proof_plan: ProofPlan::oauth(),
    }
}
