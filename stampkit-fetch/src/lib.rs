// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `Stampkit` Fetch
//!
//! Network-facing building blocks of the claim pipeline.
//!
//! ## Host APIs
//!
//! The [`host`] module provides abstractions for system interactions:
//!
//! - [`host::http`] - HTTP client with tracing and domain allowlist
//! - [`host::process`] - Subprocess execution for external signers
//!
//! ## Verification
//!
//! - [`iam::VerificationClient`] - Exchanges proofs for credentials
//! - [`iam::IamClient`] - JWT mode, challenge mode and the resilient fallback
//! - [`signer::MessageSigner`] - Signs challenge messages
//!
//! ## Coordination
//!
//! - [`redirect::RedirectBus`] - Typed channel carrying OAuth redirects
//!   from a detached popup back to the waiting claim
//! - [`context::ProviderContext`] - Single-flight cache shared by all
//!   providers verified in one batch
//!
//! ## Example
//!
//! ```ignore
//! use stampkit_fetch::{IamClient, VerificationClient};
//!
//! let client = IamClient::builder("https://iam.example.org")
//!     .token(jwt)
//!     .signer(signer)
//!     .build();
//!
//! // JWT first, challenge mode on a 401.
//! let bodies = client.verify(&payload).await?;
//! ```

pub mod context;
pub mod error;
pub mod host;
pub mod iam;
pub mod redirect;
pub mod signer;

// Errors
pub use error::{FetchError, HttpError, ProcessError, RedirectError, SignerError};

// Host APIs
pub use host::{
    http::HttpClient,
    process::{ProcessOutput, ProcessRunner},
};

// Verification
pub use iam::{CheckResult, IamClient, IamClientBuilder, VerificationClient};
pub use signer::{CommandSigner, MessageSigner};

// Coordination
pub use context::ProviderContext;
pub use redirect::{
    RedirectBus, RedirectData, RedirectListener, RedirectMessage, RedirectSender, channel_name,
};
