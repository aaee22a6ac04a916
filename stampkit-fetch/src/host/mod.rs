//! Host APIs used by the verification client and signers.
//!
//! - [`http`] - HTTP client with tracing and domain allowlist
//! - [`process`] - Subprocess execution for external signers

pub mod http;
pub mod process;

pub use http::HttpClient;
pub use process::{ProcessOutput, ProcessRunner};
