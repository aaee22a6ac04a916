//! ENS platform descriptor.

use stampkit_core::PlatformId;

use crate::descriptor::{PlatformDescriptor, PlatformMetadata, ProofPlan, ProviderGroup};

pub fn ens_descriptor() -> PlatformDescriptor {
    PlatformDescriptor {
        id: PlatformId::Ens,
        metadata: PlatformMetadata {
            is_evm: true,
            connect_url: Some("https://app.ens.domains".to_string()),
            ..PlatformMetadata::for_platform(PlatformId::Ens, "Verify you own a primary ENS name.")
        },
        groups: vec![ProviderGroup::new("Account Name", &[("Ens", "Encrypted")])],
        oauth: None,
        proof_plan: ProofPlan::address(),
    }
}
