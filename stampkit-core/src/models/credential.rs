//! Verifiable credentials and verification service response bodies.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::platform::ProviderId;

// ============================================================================
// Verifiable Credential
// ============================================================================

/// Subject of a verifiable credential.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CredentialSubject {
    /// Subject DID.
    #[serde(default)]
    pub id: String,
    /// Provider that issued this credential.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Hash of the verified record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// Subject address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Single-use challenge (challenge credentials only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,
    /// Remaining fields (`@context`, metadata, ...).
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A W3C verifiable credential as issued by the verification service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiableCredential {
    /// JSON-LD context.
    #[serde(rename = "@context", default)]
    pub context: Vec<Value>,
    /// Credential types.
    #[serde(rename = "type", default)]
    pub types: Vec<String>,
    /// Subject.
    pub credential_subject: CredentialSubject,
    /// Issuer DID.
    #[serde(default)]
    pub issuer: String,
    /// Issuance timestamp (RFC 3339).
    #[serde(default)]
    pub issuance_date: String,
    /// Expiration timestamp (RFC 3339).
    #[serde(default)]
    pub expiration_date: String,
    /// Proof block, kept opaque.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<Value>,
}

impl VerifiableCredential {
    /// Provider named in the credential subject.
    pub fn provider(&self) -> Option<&str> {
        self.credential_subject.provider.as_deref()
    }

    /// Parsed expiration date.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.expiration_date)
            .ok()
            .map(|d| d.with_timezone(&Utc))
    }

    /// Returns true if the credential is expired at `now`.
    ///
    /// A missing or unparseable expiration date counts as expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_none_or(|exp| exp <= now)
    }
}

// ============================================================================
// Proof Record
// ============================================================================

/// Record of what was verified, as returned alongside a credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofRecord {
    /// Provider id the record belongs to.
    #[serde(rename = "type")]
    pub kind: String,
    /// Remaining record fields.
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

// ============================================================================
// Credential Response Body
// ============================================================================

/// One provider's verification outcome.
///
/// The service returns either `{record, credential}` or `{error, code}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CredentialResponseBody {
    /// Verified record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<ProofRecord>,
    /// Issued credential.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<VerifiableCredential>,
    /// Error message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// HTTP-like error code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
}

impl CredentialResponseBody {
    /// Creates a successful body.
    pub fn issued(record: ProofRecord, credential: VerifiableCredential) -> Self {
        Self {
            record: Some(record),
            credential: Some(credential),
            error: None,
            code: None,
        }
    }

    /// Creates an error body.
    pub fn failed(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: Some(error.into()),
            code: Some(code),
            ..Self::default()
        }
    }

    /// Returns true if this body carries a credential and no error.
    pub fn is_valid(&self) -> bool {
        self.error.is_none() && self.credential.is_some()
    }

    /// Provider this body belongs to.
    ///
    /// Prefers `record.type`, falling back to `credentialSubject.provider`.
    pub fn provider(&self) -> Option<ProviderId> {
        self.record
            .as_ref()
            .map(|r| ProviderId::new(r.kind.clone()))
            .or_else(|| {
                self.credential
                    .as_ref()
                    .and_then(VerifiableCredential::provider)
                    .map(ProviderId::from)
            })
    }
}
