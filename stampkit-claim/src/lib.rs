// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `Stampkit` Claim
//!
//! Turns proofs into committed Stamps.
//!
//! - [`ClaimOrchestrator`] - Claims a batch of platforms one at a time,
//!   isolating failures per platform
//! - [`BulkEvmVerifier`] - Verifies every eligible address-derived provider
//!   in one request
//! - [`build_stamp_patches`] - Reduces verification responses to patches
//! - [`AttestationIssuer`] - Anchors deduplicated credentials on-chain
//! - [`Session`] - Wires the above to one user's settings and store
//!
//! ## Usage
//!
//! ```ignore
//! use stampkit_claim::Session;
//! use stampkit_core::{PlatformId, StampClaimForPlatform};
//!
//! let session = Session::open(settings, store, popup)?;
//! let batch = vec![StampClaimForPlatform::new(PlatformId::Github, vec!["Github".into()])];
//! let outcome = session.orchestrator().claim_credentials(&handler, &batch).await?;
//! session.close();
//! ```

pub mod attestation;
pub mod bulk;
pub mod error;
pub mod orchestrator;
pub mod reduce;
pub mod session;

pub use attestation::{
    AttestationChain, AttestationIssuer, AttestationReceipt, BadgeInfo, BadgeMint,
    BadgeRegistry, CampaignCredential, dedup_highest_level, provider_hash,
};
pub use bulk::{BulkEvmVerifier, BulkOutcome};
pub use error::{
    AttestationError, BadgeCheckError, BadgeMintError, BulkVerifyError, ChainError, ClaimError,
};
pub use orchestrator::{
    BatchOutcome, ClaimConfig, ClaimHandler, ClaimOrchestrator, ClaimStatus, PlatformOutcome,
    PlatformStatus, ProofSource,
};
pub use reduce::{build_stamp_patches, dedup_providers, verified_count};
pub use session::{Session, did_for_address};
