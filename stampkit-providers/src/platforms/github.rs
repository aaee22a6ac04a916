//! GitHub platform descriptor.

use stampkit_core::PlatformId;

use crate::descriptor::{
    OAuthConfig, PlatformDescriptor, PlatformMetadata, ProofPlan, ProviderGroup,
};

pub fn github_descriptor() -> PlatformDescriptor {
    PlatformDescriptor {
        id: PlatformId::Github,
        metadata: PlatformMetadata {
            connect_url: Some("https://github.com".to_string()),
            ..PlatformMetadata::for_platform(
                PlatformId::Github,
                "Connect your existing GitHub account to verify.",
            )
        },
        groups: vec![
            ProviderGroup::new("Account Name", &[("Github", "Encrypted")]),
            ProviderGroup::new(
                "Followers",
                &[
                    ("TenOrMoreGithubFollowers", "Ten or more followers"),
                    ("FiftyOrMoreGithubFollowers", "Fifty or more followers"),
                ],
            ),
            ProviderGroup::new(
                "Repositories",
                &[("StarredGithubRepoProvider", "At least 1 star on an owned repository")],
            ),
        ],
        oauth: Some(OAuthConfig {
            authorize_url: "https://github.com/login/oauth/authorize",
            client_id_env: "STAMPKIT_GITHUB_CLIENT_ID",
            scope: "read:user",
        }),
        proof_plan: ProofPlan::oauth(),
    }
}
