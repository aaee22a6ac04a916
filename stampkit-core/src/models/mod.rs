//! Domain models for Stampkit.
//!
//! ## Submodules
//!
//! - [`platform`] - Platform and provider identifiers
//! - [`payload`] - Verification request payloads and proof bundles
//! - [`credential`] - Verifiable credentials and IAM response bodies
//! - [`stamp`] - Stamps, passports, patches and claim batches
//! - [`attestation`] - On-chain attestation wire types

mod attestation;
mod credential;
mod payload;
mod platform;
mod stamp;

pub use attestation::{AttestationData, AttestationRequest, AttestationResponse, EasSignature};
pub use credential::{CredentialResponseBody, CredentialSubject, ProofRecord, VerifiableCredential};
pub use payload::{
    AdditionalSigner, BRIGHTID_SESSION_KEY, ProviderPayload, RequestPayload, SignatureType,
};
pub use platform::{ClaimTarget, EVM_BULK_VERIFY, PlatformId, ProviderId};
pub use stamp::{ClaimBatch, Passport, Stamp, StampClaimForPlatform, StampPatch};
