//! Fetch error types.

use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Main Fetch Error
// ============================================================================

/// Error type for verification service calls.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    /// The bearer token was rejected (HTTP 401).
    ///
    /// This is the only error that triggers the challenge-mode fallback.
    #[error("Unauthorized: bearer token rejected")]
    Unauthorized,

    /// Non-success status other than 401.
    #[error("Verification service returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// The challenge endpoint reported an error.
    #[error("Challenge request failed: {0}")]
    Challenge(String),

    /// The challenge response carried no challenge message.
    #[error("Challenge response did not contain a challenge message")]
    MissingChallenge,

    /// The signer produced no signature.
    #[error("Unable to sign message")]
    MissingSignature,

    /// Challenge mode needs a signer but none is configured.
    #[error("No message signer configured")]
    NoSigner,

    /// Signing failed.
    #[error("Signer error: {0}")]
    Signer(#[from] SignerError),

    /// Invalid response from the verification service.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Core error.
    #[error("Core error: {0}")]
    Core(#[from] stampkit_core::CoreError),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(HttpError::from(err))
    }
}

// ============================================================================
// HTTP Error
// ============================================================================

/// HTTP-specific error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Request error.
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Domain not allowed.
    #[error("Domain not allowed: {0}")]
    DomainNotAllowed(String),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

// ============================================================================
// Redirect Error
// ============================================================================

/// Error type for OAuth redirect waits.
#[derive(Debug, Error)]
pub enum RedirectError {
    /// No matching redirect arrived in time.
    #[error("No redirect received on {channel} within {timeout:?}")]
    Timeout {
        /// Channel name.
        channel: String,
        /// Timeout that elapsed.
        timeout: Duration,
    },

    /// The wait was cancelled.
    #[error("Redirect wait on {0} was cancelled")]
    Cancelled(String),

    /// The bus was shut down while waiting.
    #[error("Redirect channel {0} closed")]
    Closed(String),

    /// The redirect carried an error instead of a code.
    #[error("Redirect reported an error: {0}")]
    Denied(String),
}

// ============================================================================
// Signer Error
// ============================================================================

/// Error type for message signing.
#[derive(Debug, Error)]
pub enum SignerError {
    /// Signer process failed.
    #[error("Signer process failed: {0}")]
    Process(#[from] ProcessError),

    /// Signer command is empty or malformed.
    #[error("Invalid signer command: {0}")]
    InvalidCommand(String),

    /// Signer refused to sign.
    #[error("Signer rejected the request: {0}")]
    Rejected(String),
}

// ============================================================================
// Process Error
// ============================================================================

/// Error type for process operations.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Command not found.
    #[error("Command not found: {0}")]
    NotFound(String),

    /// Command timed out.
    #[error("Command timed out after {0:?}")]
    Timeout(Duration),

    /// Non-zero exit code.
    #[error("Command exited with code {code}: {stderr}")]
    NonZeroExit {
        /// Exit code from the process.
        code: i32,
        /// Standard error output.
        stderr: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
