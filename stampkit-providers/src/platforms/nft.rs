//! NFT holder platform descriptor.

use stampkit_core::PlatformId;

use crate::descriptor::{PlatformDescriptor, PlatformMetadata, ProofPlan, ProviderGroup};

pub fn nft_descriptor() -> PlatformDescriptor {
    PlatformDescriptor {
        id: PlatformId::Nft,
        metadata: PlatformMetadata {
            is_evm: true,
            ..PlatformMetadata::for_platform(
                PlatformId::Nft,
                "Verify NFT ownership and collecting history.",
            )
        },
        groups: vec![
            ProviderGroup::new("NFT Ownership", &[("NFT", "Holds at least 1 NFT")]),
            ProviderGroup::new(
                "Collector's Journey",
                &[
                    ("NFTScore#50", "Digital Collector"),
                    ("NFTScore#75", "Art Aficionado"),
                    ("NFTScore#90", "NFT Visionary"),
                ],
            ),
        ],
        oauth: None,
        proof_plan: ProofPlan::address(),
    }
}
