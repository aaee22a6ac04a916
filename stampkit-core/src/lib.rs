// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `Stampkit` Core
//!
//! Core types and models shared by all `Stampkit` crates.
//!
//! This crate holds the wire formats spoken with the verification service
//! ("IAM") and the credential store, plus the platform identifiers used to
//! route claims:
//!
//! ### Platforms & Providers
//! - [`PlatformId`] - Enum of all supported platforms
//! - [`ClaimTarget`] - A platform or the `EVMBulkVerify` pseudo-platform
//! - [`ProviderId`] - Identifier of a single provider (one Stamp type)
//!
//! ### Requests
//! - [`RequestPayload`] - One verification attempt
//! - [`ProviderPayload`] - Proof bundle for one platform
//! - [`SignatureType`] - Credential signature scheme
//!
//! ### Credentials
//! - [`VerifiableCredential`] - A W3C credential issued by the IAM
//! - [`CredentialResponseBody`] - One provider's verification outcome
//!
//! ### Stamps
//! - [`Stamp`], [`Passport`] - The stored credential set
//! - [`StampPatch`] - One commit/clear instruction for the store
//! - [`StampClaimForPlatform`], [`ClaimBatch`] - Caller-supplied claim list
//!
//! ### Attestation
//! - [`AttestationRequest`], [`AttestationData`], [`EasSignature`]

pub mod error;
pub mod models;

pub use error::CoreError;

pub use models::{
    // Attestation
    AttestationData,
    AttestationRequest,
    AttestationResponse,
    EasSignature,
    // Credentials
    CredentialResponseBody,
    CredentialSubject,
    ProofRecord,
    VerifiableCredential,
    // Payloads
    AdditionalSigner,
    BRIGHTID_SESSION_KEY,
    ProviderPayload,
    RequestPayload,
    SignatureType,
    // Platforms
    ClaimTarget,
    EVM_BULK_VERIFY,
    PlatformId,
    ProviderId,
    // Stamps
    ClaimBatch,
    Passport,
    Stamp,
    StampClaimForPlatform,
    StampPatch,
};
