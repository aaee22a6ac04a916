//! On-chain attestation wire types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::credential::VerifiableCredential;

/// Body posted to the attestation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationRequest {
    /// Attestation recipient address.
    pub recipient: String,
    /// Credentials to anchor.
    pub credentials: Vec<VerifiableCredential>,
    /// Target chain id.
    pub chain_id: String,
    /// Recipient nonce read from the attester contract.
    pub nonce: u64,
}

/// EAS signature split into its components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EasSignature {
    /// Recovery id.
    pub v: u8,
    /// `r` component, hex.
    pub r: String,
    /// `s` component, hex.
    pub s: String,
}

/// Payload returned by the attestation endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttestationData {
    /// Signature over the multi-attestation request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<EasSignature>,
    /// Opaque attestation payload, submitted with the signature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passport: Option<Value>,
    /// Server-side error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Attestation endpoint response, either wrapped in `data` or bare.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttestationResponse {
    /// `{ "data": { ... } }`
    Wrapped {
        /// Inner payload.
        data: AttestationData,
    },
    /// `{ "signature": ..., "passport": ... }`
    Bare(AttestationData),
}

impl AttestationResponse {
    /// Unwraps the inner payload.
    pub fn into_data(self) -> AttestationData {
        match self {
            Self::Wrapped { data } | Self::Bare(data) => data,
        }
    }
}
