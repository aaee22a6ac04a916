// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `Stampkit` Providers
//!
//! Platform-specific configuration for the `Stampkit` claim pipeline.
//!
//! Each platform module contributes a [`PlatformDescriptor`]:
//!
//! - **Metadata**: display name, description, whether it is EVM-derivable
//! - **Provider groups**: the Stamps the platform can issue
//! - **Proof plan**: how a proof is acquired before verification
//!
//! ## Supported Platforms
//!
//! | Platform | Proof | EVM |
//! |----------|-------|-----|
//! | Google, GitHub, Discord, LinkedIn, X | OAuth popup | no |
//! | BrightID | Sponsorship / context id | no |
//! | Gitcoin, ENS, ETH, GTC Staking, NFT | Address-derived | yes |
//!
//! ## Verification side
//!
//! - [`verify::Provider`] - Verifies one Stamp type against a request
//! - [`verify::verify_types`] - Verifies a batch with one fresh
//!   [`ProviderContext`](stampkit_fetch::ProviderContext)
//! - [`discovery::ProviderDiscovery`] - Finds EVM providers an address
//!   qualifies for
//!
//! ## Usage
//!
//! ```ignore
//! use stampkit_core::PlatformId;
//! use stampkit_providers::PlatformRegistry;
//!
//! let desc = PlatformRegistry::get(PlatformId::Github).unwrap();
//! let proof = desc.build_proof();
//! let payload = proof.acquire_proof(&ctx).await?;
//! ```

pub mod descriptor;
pub mod discovery;
pub mod error;
pub mod platforms;
pub mod proof;
pub mod registry;
pub mod verify;

pub use descriptor::{
    OAuthConfig, PlatformDescriptor, PlatformMetadata, ProofPlan, ProviderGroup, ProviderSpec,
};
pub use discovery::{
    IamDiscovery, ProviderDiscovery, ValidatedGroup, ValidatedPlatform, ValidatedProvider,
};
pub use error::{DiscoveryError, ProofError, ProviderError};
pub use proof::{
    AddressProof, BrightIdProof, OAuthProof, PopupLauncher, ProofContext, ProofKind,
    ProofProvider, generate_state,
};
pub use registry::PlatformRegistry;
pub use verify::{
    BalanceSource, EthErc20PossessionProvider, PossessionOptions, Provider, ProviderSet,
    TypeVerification, VerifiedPayload, verify_types,
};
