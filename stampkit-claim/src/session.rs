//! Claim session.
//!
//! A [`Session`] owns everything one user's claims share: address and DID,
//! settings, the HTTP and verification clients, the redirect bus and the
//! passport store. It is opened explicitly and closed explicitly; closing
//! cancels any redirect wait still in flight.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use stampkit_core::{ProviderId, ProviderPayload};
use stampkit_fetch::{CommandSigner, HttpClient, IamClient, MessageSigner, RedirectBus};
use stampkit_providers::{
    IamDiscovery, PlatformDescriptor, PopupLauncher, ProofContext, ProofError, generate_state,
};
use stampkit_store::{PassportStore, Settings};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::attestation::{AttestationChain, AttestationIssuer};
use crate::bulk::BulkEvmVerifier;
use crate::error::ClaimError;
use crate::orchestrator::{ClaimConfig, ClaimOrchestrator, ProofSource};

/// Returns the `did:pkh` DID for an Ethereum mainnet address.
pub fn did_for_address(address: &str) -> String {
    format!("did:pkh:eip155:1:{}", address.to_lowercase())
}

// ============================================================================
// Session Proofs
// ============================================================================

/// [`ProofSource`] that resolves proofs through the platform registry.
struct SessionProofs {
    address: String,
    did: String,
    callback_url: String,
    redirect_timeout: Duration,
    iam: Arc<IamClient>,
    redirects: RedirectBus,
    popup: Arc<dyn PopupLauncher>,
    cancel: CancellationToken,
}

#[async_trait]
impl ProofSource for SessionProofs {
    #[instrument(skip(self, platform, selected), fields(platform = %platform.id))]
    async fn acquire(
        &self,
        platform: &'static PlatformDescriptor,
        selected: &[ProviderId],
    ) -> Result<ProviderPayload, ProofError> {
        let proof = platform.build_proof();
        debug!(kind = ?proof.kind(), "Acquiring proof");

        let ctx = ProofContext {
            platform,
            address: &self.address,
            did: &self.did,
            state: generate_state(platform.path()),
            callback_url: &self.callback_url,
            selected_providers: selected,
            redirects: &self.redirects,
            redirect_timeout: self.redirect_timeout,
            cancel: &self.cancel,
            popup: self.popup.as_ref(),
            iam: &self.iam,
        };
        proof.acquire_proof(&ctx).await
    }
}

// ============================================================================
// Session
// ============================================================================

/// One user's claim session.
pub struct Session {
    settings: Settings,
    http: Arc<HttpClient>,
    iam: Arc<IamClient>,
    store: Arc<PassportStore>,
    proofs: Arc<SessionProofs>,
    closed: AtomicBool,
}

impl Session {
    /// Opens a session from resolved settings.
    ///
    /// Fails if no address is configured or the signer command is invalid.
    pub fn open(
        settings: Settings,
        store: Arc<PassportStore>,
        popup: Arc<dyn PopupLauncher>,
    ) -> Result<Self, ClaimError> {
        let address = settings
            .address
            .clone()
            .filter(|a| !a.trim().is_empty())
            .ok_or(ClaimError::NoAddress)?;

        let http = Arc::new(HttpClient::with_timeout(settings.request_timeout()));

        let signer = settings
            .signer_command
            .as_deref()
            .map(CommandSigner::from_command_line)
            .transpose()
            .map_err(|e| ClaimError::Session(e.to_string()))?
            .map(|s| Arc::new(s) as Arc<dyn MessageSigner>);

        let mut builder = IamClient::builder(settings.iam_url.clone())
            .http(http.clone())
            .maybe_token(settings.iam_token.clone());
        if let Some(signer) = signer {
            builder = builder.signer(signer);
        }
        let iam = Arc::new(builder.build());

        let proofs = Arc::new(SessionProofs {
            did: did_for_address(&address),
            address,
            callback_url: settings.callback_url.clone(),
            redirect_timeout: settings.redirect_timeout(),
            iam: iam.clone(),
            redirects: RedirectBus::new(),
            popup,
            cancel: CancellationToken::new(),
        });

        info!(address = %proofs.address, iam = %settings.iam_url, "Session opened");
        Ok(Self {
            settings,
            http,
            iam,
            store,
            proofs,
            closed: AtomicBool::new(false),
        })
    }

    /// Subject address.
    pub fn address(&self) -> &str {
        &self.proofs.address
    }

    /// Subject DID.
    pub fn did(&self) -> &str {
        &self.proofs.did
    }

    /// Resolved settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Verification service client.
    pub fn iam(&self) -> &Arc<IamClient> {
        &self.iam
    }

    /// Passport store.
    pub fn store(&self) -> &Arc<PassportStore> {
        &self.store
    }

    /// Bus OAuth redirects are posted on.
    pub fn redirects(&self) -> &RedirectBus {
        &self.proofs.redirects
    }

    /// Request fields for this session.
    pub fn claim_config(&self) -> ClaimConfig {
        ClaimConfig {
            address: self.proofs.address.clone(),
            version: self.settings.iam_version.clone(),
            signature_type: self.settings.signature_type,
        }
    }

    /// Builds a claim orchestrator bound to this session.
    pub fn orchestrator(&self) -> ClaimOrchestrator {
        ClaimOrchestrator::new(
            self.iam.clone(),
            self.store.clone(),
            self.proofs.clone(),
            self.claim_config(),
        )
    }

    /// Builds a bulk EVM verifier bound to this session.
    pub fn bulk_verifier(&self) -> BulkEvmVerifier {
        let discovery = IamDiscovery::new(self.iam.clone(), self.settings.iam_version.clone());
        BulkEvmVerifier::new(
            self.iam.clone(),
            self.store.clone(),
            Arc::new(discovery),
            self.claim_config(),
        )
    }

    /// Builds an attestation issuer for the configured endpoint.
    pub fn attestation_issuer(
        &self,
        chain: Arc<dyn AttestationChain>,
    ) -> Result<AttestationIssuer, ClaimError> {
        let endpoint = self
            .settings
            .attestation_url
            .clone()
            .ok_or_else(|| ClaimError::Session("no attestation URL configured".to_string()))?;
        Ok(AttestationIssuer::new(
            self.http.clone(),
            endpoint,
            self.settings.chain_id.clone(),
            chain,
        ))
    }

    /// Closes the session, cancelling outstanding redirect waits.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.proofs.cancel.cancel();
        self.proofs.redirects.shutdown();
        info!("Session closed");
    }

    /// Returns true once [`close`](Self::close) has run.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Tests
// ============================================================================
