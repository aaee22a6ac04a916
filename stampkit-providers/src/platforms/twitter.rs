//! X / Twitter platform descriptor.

use stampkit_core::PlatformId;

use crate::descriptor::{
    OAuthConfig, PlatformDescriptor, PlatformMetadata, ProofPlan, ProviderGroup,
};

pub fn twitter_descriptor() -> PlatformDescriptor {
    PlatformDescriptor {
        id: PlatformId::Twitter,
        metadata: PlatformMetadata::for_platform(
            PlatformId::Twitter,
            "Connect your existing X account to verify.",
        ),
        groups: vec![ProviderGroup::new(
            "Account Creation",
            &[
                ("twitterAccountAgeGte#180", "Created at least 180 days ago"),
                ("twitterAccountAgeGte#365", "Created at least 365 days ago"),
                ("twitterAccountAgeGte#730", "Created at least 730 days ago"),
            ],
        )],
        oauth: Some(OAuthConfig {
            authorize_url: "https://twitter.com/i/oauth2/authorize",
            client_id_env: "STAMPKIT_TWITTER_CLIENT_ID",
            scope: "tweet.read users.read",
        }),
        proof_plan: ProofPlan::oauth(),
    }
}
