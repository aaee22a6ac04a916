//! Gitcoin grants platform descriptor.

use stampkit_core::PlatformId;

use crate::descriptor::{PlatformDescriptor, PlatformMetadata, ProofPlan, ProviderGroup};

pub fn gitcoin_descriptor() -> PlatformDescriptor {
    PlatformDescriptor {
        id: PlatformId::Gitcoin,
        metadata: PlatformMetadata {
            is_evm: true,
            ..PlatformMetadata::for_platform(
                PlatformId::Gitcoin,
                "Verify your contributions to Gitcoin grants rounds.",
            )
        },
        groups: vec![ProviderGroup::new(
            "Contributions",
            &[
                (
                    "GitcoinContributorStatistics#totalContributionAmountGte#10",
                    "Contributed at least $10",
                ),
                (
                    "GitcoinContributorStatistics#totalContributionAmountGte#100",
                    "Contributed at least $100",
                ),
                (
                    "GitcoinContributorStatistics#numGrantsContributeToGte#10",
                    "Contributed to at least 10 grants",
                ),
            ],
        )],
        oauth: None,
        proof_plan: ProofPlan::address(),
    }
}
