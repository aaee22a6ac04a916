//! Verification request payloads and proof bundles.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::credential::VerifiableCredential;
use super::platform::ProviderId;

/// Session key value that marks a BrightID sponsorship payload.
pub const BRIGHTID_SESSION_KEY: &str = "brightid";

// ============================================================================
// Signature Type
// ============================================================================

/// Signature scheme requested for issued credentials.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureType {
    /// EIP-712 typed data signature
    #[default]
    #[serde(rename = "EIP712")]
    Eip712,
    /// Ed25519 signature
    Ed25519,
}

impl SignatureType {
    /// Returns the wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eip712 => "EIP712",
            Self::Ed25519 => "Ed25519",
        }
    }
}

impl std::str::FromStr for SignatureType {
    type Err = crate::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EIP712" | "eip712" => Ok(Self::Eip712),
            "Ed25519" | "ed25519" => Ok(Self::Ed25519),
            other => Err(crate::CoreError::InvalidData(format!(
                "unknown signature type: {other}"
            ))),
        }
    }
}

// ============================================================================
// Provider Payload
// ============================================================================

/// Opaque proof bundle for one platform (`code`, `state`, `sessionKey`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderPayload(BTreeMap<String, String>);

impl ProviderPayload {
    /// Creates an empty payload (used for address-derived proofs).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a payload carrying an OAuth `code` and `state`.
    pub fn oauth(code: impl Into<String>, state: impl Into<String>) -> Self {
        Self::new().with("code", code).with("state", state)
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts a value, replacing any previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Gets a value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// OAuth authorization code.
    pub fn code(&self) -> Option<&str> {
        self.get("code")
    }

    /// OAuth state.
    pub fn state(&self) -> Option<&str> {
        self.get("state")
    }

    /// Session key, set by sponsorship flows.
    pub fn session_key(&self) -> Option<&str> {
        self.get("sessionKey")
    }

    /// Returns true if this payload reports a BrightID sponsorship.
    pub fn is_sponsorship(&self) -> bool {
        self.session_key() == Some(BRIGHTID_SESSION_KEY)
    }

    /// Returns true if the payload carries no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ProviderPayload {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

// ============================================================================
// Request Payload
// ============================================================================

/// A second signer attached to a challenge request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdditionalSigner {
    /// Challenge credential issued to the additional signer.
    pub challenge: VerifiableCredential,
    /// Signature over the challenge.
    pub signature: String,
    /// Address of the additional signer.
    pub address: String,
}

/// One verification attempt sent to the verification service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPayload {
    /// Platform or pseudo-platform name (e.g. `"Google"`, `"EVMBulkVerify"`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Provider ids to verify.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<ProviderId>,
    /// Subject address.
    pub address: String,
    /// Verification service API version.
    pub version: String,
    /// Proof bundle.
    #[serde(default)]
    pub proofs: ProviderPayload,
    /// Requested credential signature scheme.
    #[serde(default)]
    pub signature_type: SignatureType,
    /// Optional additional signer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer: Option<AdditionalSigner>,
}

impl RequestPayload {
    /// Creates a payload for `kind` and `address` with no providers.
    pub fn new(
        kind: impl Into<String>,
        address: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            types: Vec::new(),
            address: address.into(),
            version: version.into(),
            proofs: ProviderPayload::new(),
            signature_type: SignatureType::default(),
            signer: None,
        }
    }

    /// Sets the provider ids.
    #[must_use]
    pub fn with_types(mut self, types: Vec<ProviderId>) -> Self {
        self.types = types;
        self
    }

    /// Sets the proof bundle.
    #[must_use]
    pub fn with_proofs(mut self, proofs: ProviderPayload) -> Self {
        self.proofs = proofs;
        self
    }

    /// Sets the signature scheme.
    #[must_use]
    pub fn with_signature_type(mut self, signature_type: SignatureType) -> Self {
        self.signature_type = signature_type;
        self
    }

    /// Attaches an additional signer.
    #[must_use]
    pub fn with_signer(mut self, signer: AdditionalSigner) -> Self {
        self.signer = Some(signer);
        self
    }
}
