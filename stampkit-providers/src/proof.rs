//! Proof acquisition.
//!
//! Before a platform's providers can be verified the user has to prove
//! control of the external account. Each platform resolves to one
//! [`ProofProvider`] variant through its descriptor:
//!
//! - [`OAuthProof`] - opens a popup and waits for the OAuth redirect
//! - [`AddressProof`] - nothing to acquire, the address is the proof
//! - [`BrightIdProof`] - checks the BrightID context id, sponsors if unknown

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use rand::distributions::Alphanumeric;
use stampkit_core::{BRIGHTID_SESSION_KEY, PlatformId, ProviderId, ProviderPayload};
use stampkit_fetch::{IamClient, RedirectBus};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::descriptor::PlatformDescriptor;
use crate::error::ProofError;

/// Length of the random part of an OAuth state.
const STATE_UID_LEN: usize = 10;

/// Returns a fresh OAuth state, `"{path}-{uid}"`.
pub fn generate_state(path: &str) -> String {
    let uid: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_UID_LEN)
        .map(char::from)
        .collect();
    format!("{path}-{uid}")
}

// ============================================================================
// Proof Kind
// ============================================================================

/// How a platform acquires its proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofKind {
    /// OAuth popup and redirect.
    OAuthPopup,
    /// Derived from the address, no user interaction.
    AddressDerived,
    /// BrightID context id check with sponsorship fallback.
    BrightIdSponsorship,
}

// ============================================================================
// Popup Launcher
// ============================================================================

/// Opens an OAuth popup somewhere the user can see it.
///
/// The popup reports back by posting on the [`RedirectBus`].
#[async_trait]
pub trait PopupLauncher: Send + Sync {
    /// Opens `url` for `platform`.
    async fn open(&self, platform: PlatformId, url: &str) -> Result<(), ProofError>;
}

// ============================================================================
// Proof Context
// ============================================================================

/// Everything a proof provider may need for one acquisition.
pub struct ProofContext<'a> {
    /// Platform being claimed.
    pub platform: &'a PlatformDescriptor,
    /// Subject address.
    pub address: &'a str,
    /// Subject DID.
    pub did: &'a str,
    /// OAuth state issued for this acquisition.
    pub state: String,
    /// OAuth redirect URI.
    pub callback_url: &'a str,
    /// Providers the user selected on this platform.
    pub selected_providers: &'a [ProviderId],
    /// Bus the popup posts its redirect on.
    pub redirects: &'a RedirectBus,
    /// How long to wait for the redirect.
    pub redirect_timeout: Duration,
    /// Cancels the redirect wait.
    pub cancel: &'a CancellationToken,
    /// Opens the popup.
    pub popup: &'a dyn PopupLauncher,
    /// Verification service client, for sponsorship calls.
    pub iam: &'a IamClient,
}

// ============================================================================
// Proof Provider Trait
// ============================================================================

/// Acquires the proof bundle for one platform.
#[async_trait]
pub trait ProofProvider: Send + Sync {
    /// Kind of this provider.
    fn kind(&self) -> ProofKind;

    /// Acquires the proof.
    async fn acquire_proof(&self, ctx: &ProofContext<'_>) -> Result<ProviderPayload, ProofError>;
}

// ============================================================================
// OAuth Popup
// ============================================================================

/// Opens the platform's OAuth popup and waits for its redirect.
#[derive(Debug, Clone, Copy, Default)]
pub struct OAuthProof;

#[async_trait]
impl ProofProvider for OAuthProof {
    fn kind(&self) -> ProofKind {
        ProofKind::OAuthPopup
    }

    #[instrument(skip(self, ctx), fields(platform = %ctx.platform.id))]
    async fn acquire_proof(&self, ctx: &ProofContext<'_>) -> Result<ProviderPayload, ProofError> {
        let oauth = ctx
            .platform
            .oauth
            .ok_or(ProofError::NotOAuth(ctx.platform.id))?;

        let url = oauth
            .authorize_url(&oauth.client_id(), ctx.callback_url, &ctx.state)
            .map_err(|e| ProofError::Popup(e.to_string()))?;

        // Listen before opening so an immediate redirect is not lost.
        let listener = ctx.redirects.listen(ctx.platform.path());
        ctx.popup.open(ctx.platform.id, url.as_str()).await?;
        debug!("Popup opened, waiting for redirect");

        let payload = listener.wait(ctx.redirect_timeout, ctx.cancel).await?;

        let actual = payload.state().unwrap_or_default();
        if actual != ctx.state {
            warn!("OAuth state mismatch");
            return Err(ProofError::StateMismatch {
                expected: ctx.state.clone(),
                actual: actual.to_string(),
            });
        }

        Ok(payload)
    }
}

// ============================================================================
// Address Derived
// ============================================================================

/// Address-derived proof: the verification service reads on-chain data.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddressProof;

#[async_trait]
impl ProofProvider for AddressProof {
    fn kind(&self) -> ProofKind {
        ProofKind::AddressDerived
    }

    async fn acquire_proof(&self, _ctx: &ProofContext<'_>) -> Result<ProviderPayload, ProofError> {
        Ok(ProviderPayload::new())
    }
}

// ============================================================================
// BrightID
// ============================================================================

/// BrightID proof.
///
/// If the DID is already a verified BrightID context id the claim proceeds
/// normally. Otherwise sponsorship is requested and the returned payload
/// carries `sessionKey = "brightid"` with `code` set to `success` or
/// `failure`, which ends the claim batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrightIdProof;

#[async_trait]
impl ProofProvider for BrightIdProof {
    fn kind(&self) -> ProofKind {
        ProofKind::BrightIdSponsorship
    }

    #[instrument(skip(self, ctx))]
    async fn acquire_proof(&self, ctx: &ProofContext<'_>) -> Result<ProviderPayload, ProofError> {
        if ctx.iam.verify_context_id(ctx.did).await? {
            debug!("BrightID context id already verified");
            return Ok(ProviderPayload::new().with("did", ctx.did));
        }

        let sponsored = ctx.iam.sponsor(ctx.did).await?;
        info!(sponsored, "BrightID sponsorship requested");

        Ok(ProviderPayload::new()
            .with("sessionKey", BRIGHTID_SESSION_KEY)
            .with("code", if sponsored { "success" } else { "failure" }))
    }
}

// ============================================================================
// Tests
// ============================================================================
