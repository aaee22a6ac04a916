//! Claim pipeline error types.

use stampkit_core::ClaimTarget;
use stampkit_fetch::FetchError;
use stampkit_providers::ProofError;
use stampkit_store::StoreError;
use thiserror::Error;

/// Errors from one platform of a claim batch, or from starting a batch.
#[derive(Debug, Error)]
pub enum ClaimError {
    /// Another batch is already running on this orchestrator.
    #[error("A claim batch is already in progress")]
    Busy,

    /// Target has no registered platform.
    #[error("Unknown platform: {0}")]
    UnknownPlatform(ClaimTarget),

    /// Proof acquisition failed.
    #[error("Proof acquisition failed: {0}")]
    Proof(#[from] ProofError),

    /// Verification request failed.
    #[error("Verification failed: {0}")]
    Verify(#[from] FetchError),

    /// Credential store rejected the patches.
    #[error("Patch commit failed: {0}")]
    Patch(#[from] StoreError),

    /// Session has no wallet address.
    #[error("No address configured")]
    NoAddress,

    /// Session setup failed.
    #[error("Session error: {0}")]
    Session(String),
}

/// Errors from a bulk EVM verification.
///
/// The bulk path makes a single request, so any failure fails the batch.
#[derive(Debug, Error)]
pub enum BulkVerifyError {
    /// Verification request failed.
    #[error("Bulk verification failed: {0}")]
    Verify(#[from] FetchError),

    /// Credential store rejected the patches.
    #[error("Patch commit failed: {0}")]
    Patch(#[from] StoreError),
}

/// Error reported by an [`AttestationChain`](crate::attestation::AttestationChain).
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ChainError(pub String);

/// Attestation failures, one per protocol step.
#[derive(Debug, Error)]
pub enum AttestationError {
    /// Reading the recipient nonce failed.
    #[error("Nonce unavailable: {0}")]
    NonceUnavailable(String),

    /// The attestation endpoint did not produce a signed payload.
    #[error("Attestation generation failed: {0}")]
    Generation(String),

    /// Submitting the attestation transaction failed.
    #[error("Attestation transaction failed: {0}")]
    Transaction(String),
}

impl AttestationError {
    /// Fixed message shown to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::NonceUnavailable(_) => {
                "An unexpected error occurred while trying to get the nonce."
            }
            Self::Generation(_) => "An unexpected error occurred while generating attestations.",
            Self::Transaction(_) => {
                "An unexpected error occurred while trying to bring the data onchain."
            }
        }
    }
}

/// Reading a badge contract's burned-hash state failed.
#[derive(Debug, Error)]
#[error("Badge check failed: {0}")]
pub struct BadgeCheckError(pub String);

impl BadgeCheckError {
    /// Fixed message shown to the user.
    pub fn user_message(&self) -> &'static str {
        "An unexpected error occurred while checking for existing onchain badges."
    }
}

/// Errors from minting campaign badges out of a passport.
#[derive(Debug, Error)]
pub enum BadgeMintError {
    /// The burned-hash check failed before anything was attested.
    #[error(transparent)]
    Check(#[from] BadgeCheckError),

    /// Attesting the deduplicated credentials failed.
    #[error(transparent)]
    Attestation(#[from] AttestationError),
}

impl BadgeMintError {
    /// Fixed message shown to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Check(e) => e.user_message(),
            Self::Attestation(e) => e.user_message(),
        }
    }
}
