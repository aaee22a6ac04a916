//! Message signers for challenge-mode verification.
//!
//! The verification service hands out a single-use challenge string which
//! the subject address must sign. Wallet integration is external, so the
//! signer is a trait; [`CommandSigner`] shells out to a configured command.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::error::SignerError;
use crate::host::process::ProcessRunner;

/// Default signer timeout; signing may wait on a hardware wallet prompt.
const SIGNER_TIMEOUT_SECS: u64 = 120;

// ============================================================================
// Message Signer Trait
// ============================================================================

/// Signs challenge messages on behalf of the subject address.
#[async_trait]
pub trait MessageSigner: Send + Sync {
    /// Signs `message`, returning the signature as a string.
    ///
    /// An empty string means the signer produced no signature.
    async fn sign_message(&self, message: &str) -> Result<String, SignerError>;
}

// ============================================================================
// Command Signer
// ============================================================================

/// Signer that runs an external command with the message as last argument
/// and reads the signature from stdout.
#[derive(Debug, Clone)]
pub struct CommandSigner {
    program: String,
    args: Vec<String>,
    runner: ProcessRunner,
    timeout: Duration,
}

impl CommandSigner {
    /// Parses a whitespace-separated command line such as `"cast wallet sign"`.
    pub fn from_command_line(command: &str) -> Result<Self, SignerError> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| SignerError::InvalidCommand(command.to_string()))?;

        Ok(Self {
            program,
            args: parts.collect(),
            runner: ProcessRunner::new(),
            timeout: Duration::from_secs(SIGNER_TIMEOUT_SECS),
        })
    }

    /// Sets the signing timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Program being run.
    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl MessageSigner for CommandSigner {
    #[instrument(skip(self, message), fields(program = %self.program))]
    async fn sign_message(&self, message: &str) -> Result<String, SignerError> {
        let mut args: Vec<&str> = self.args.iter().map(String::as_str).collect();
        args.push(message);

        let output = self
            .runner
            .run_with_timeout(&self.program, &args, self.timeout)
            .await?;

        if !output.success() {
            return Err(SignerError::Rejected(output.stderr.trim().to_string()));
        }

        let signature = output.stdout.trim().to_string();
        debug!(signature_len = signature.len(), "Message signed");
        Ok(signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_line() {
        let signer = CommandSigner::from_command_line("cast wallet sign --interactive").unwrap();
        assert_eq!(signer.program(), "cast");
        assert_eq!(signer.args, vec!["wallet", "sign", "--interactive"]);
    }

    #[test]
    fn test_empty_command_line() {
        assert!(matches!(
            CommandSigner::from_command_line("   "),
            Err(SignerError::InvalidCommand(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_echo_signer_returns_last_arg() {
        let signer = CommandSigner::from_command_line("echo").unwrap();
        let sig = signer.sign_message("challenge-123").await.unwrap();
        assert_eq!(sig, "challenge-123");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_signer_is_rejected() {
        let signer = CommandSigner::from_command_line("false").unwrap();
        assert!(matches!(
            signer.sign_message("m").await,
            Err(SignerError::Rejected(_))
        ));
    }
}
