//! BrightID platform descriptor.
//!
//! BrightID has no popup: the DID is checked as a BrightID context id, and
//! unknown ids are sponsored instead of verified.

use stampkit_core::PlatformId;

use crate::descriptor::{PlatformDescriptor, PlatformMetadata, ProofPlan, ProviderGroup};
use crate::proof::{BrightIdProof, ProofKind, ProofProvider};

pub fn brightid_descriptor() -> PlatformDescriptor {
    PlatformDescriptor {
        id: PlatformId::Brightid,
        metadata: PlatformMetadata {
            connect_url: Some("https://www.brightid.org".to_string()),
            ..PlatformMetadata::for_platform(
                PlatformId::Brightid,
                "Connect BrightID to prove you are a unique human.",
            )
        },
        groups: vec![ProviderGroup::new(
            "Name of the Stamp platform",
            &[("Brightid", "Encrypted")],
        )],
        oauth: None,
        proof_plan: ProofPlan {
            kind: ProofKind::BrightIdSponsorship,
            build_proof: || -> Box<dyn ProofProvider> { Box::new(BrightIdProof) },
        },
    }
}
