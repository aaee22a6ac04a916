//! ETH platform descriptor.

use stampkit_core::PlatformId;

use crate::descriptor::{PlatformDescriptor, PlatformMetadata, ProofPlan, ProviderGroup};

pub fn eth_descriptor() -> PlatformDescriptor {
    PlatformDescriptor {
        id: PlatformId::Eth,
        metadata: PlatformMetadata {
            is_evm: true,
            ..PlatformMetadata::for_platform(PlatformId::Eth, "Verify ETH holdings and activity.")
        },
        groups: vec![
            ProviderGroup::new(
                "Possessions",
                &[
                    ("ethPossessionsGte#1", "At least 1 ETH"),
                    ("ethPossessionsGte#10", "At least 10 ETH"),
                    ("ethPossessionsGte#32", "At least 32 ETH"),
                ],
            ),
            ProviderGroup::new(
                "Transactions",
                &[
                    ("FirstEthTxnProvider", "First transaction at least 30 days ago"),
                    ("EthGTEOneTxnProvider", "At least 1 transaction"),
                ],
            ),
            ProviderGroup::new(
                "Gas fees spent",
                &[("EthGasProvider", "At least 0.5 ETH in gas fees")],
            ),
        ],
        oauth: None,
        proof_plan: ProofPlan::address(),
    }
}
