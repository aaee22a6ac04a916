//! GTC staking platform descriptor.

use stampkit_core::PlatformId;

use crate::descriptor::{PlatformDescriptor, PlatformMetadata, ProofPlan, ProviderGroup};

pub fn gtc_staking_descriptor() -> PlatformDescriptor {
    PlatformDescriptor {
        id: PlatformId::GtcStaking,
        metadata: PlatformMetadata {
            is_evm: true,
            ..PlatformMetadata::for_platform(
                PlatformId::GtcStaking,
                "Verify GTC staked on yourself.",
            )
        },
        groups: vec![ProviderGroup::new(
            "Self Staking",
            &[
                ("SelfStakingBronze", "More than 1 GTC"),
                ("SelfStakingSilver", "More than 10 GTC"),
                ("SelfStakingGold", "More than 100 GTC"),
            ],
        )],
        oauth: None,
        proof_plan: ProofPlan::address(),
    }
}
