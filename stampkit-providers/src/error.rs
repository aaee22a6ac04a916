//! Provider error types.

use thiserror::Error;

use stampkit_core::PlatformId;
use stampkit_fetch::{FetchError, RedirectError};

// ============================================================================
// Proof Error
// ============================================================================

/// Error acquiring a proof for a platform.
#[derive(Debug, Error)]
pub enum ProofError {
    /// The OAuth redirect handshake failed.
    #[error("Redirect failed: {0}")]
    Redirect(#[from] RedirectError),

    /// The popup could not be opened.
    #[error("Failed to open popup: {0}")]
    Popup(String),

    /// The platform has no OAuth configuration.
    #[error("{0} is not an OAuth platform")]
    NotOAuth(PlatformId),

    /// The redirect carried a state other than the one issued.
    #[error("OAuth state mismatch: expected {expected}, got {actual}")]
    StateMismatch {
        /// State issued with the popup.
        expected: String,
        /// State received on the redirect.
        actual: String,
    },

    /// A verification service call made while acquiring the proof failed.
    #[error("Verification service error: {0}")]
    Fetch(#[from] FetchError),
}

// ============================================================================
// Provider Error
// ============================================================================

/// Error raised by a provider while verifying.
///
/// Unlike an invalid result (`valid == false`), this means the provider
/// could not decide.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Balance or data source failed.
    #[error("Data source error: {0}")]
    Source(String),

    /// Provider options are invalid.
    #[error("Invalid provider options: {0}")]
    InvalidOptions(String),

    /// No provider is registered for a type.
    #[error("Missing provider: {0}")]
    Missing(String),
}

// ============================================================================
// Discovery Error
// ============================================================================

/// Error discovering eligible providers.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Eligibility check failed.
    #[error("Eligibility check failed: {0}")]
    Check(#[from] FetchError),
}
