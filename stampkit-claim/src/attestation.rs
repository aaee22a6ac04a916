//! On-chain attestation of campaign credentials.
//!
//! Badge stamps are picked out of the passport through a [`BadgeRegistry`],
//! dropped if their hash was already burned on the badge contract by another
//! user, then reduced to one per badge contract, keeping the highest level.
//! Issuing then runs three steps, each with its own error:
//!
//! 1. read the recipient nonce from the verifier contract,
//! 2. post `{recipient, credentials, chainId, nonce}` to the attestation
//!    endpoint and receive a signed payload,
//! 3. submit the signature and payload as a transaction.
//!
//! Nothing is retried.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use base64::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use stampkit_core::{
    AttestationRequest, AttestationResponse, EasSignature, Passport, ProviderId,
    VerifiableCredential,
};
use stampkit_fetch::HttpClient;
use tracing::{debug, info, instrument, warn};

use crate::error::{AttestationError, BadgeCheckError, BadgeMintError, ChainError};

// ============================================================================
// Badge Registry
// ============================================================================

/// Badge contract and level a provider's stamp mints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeInfo {
    /// Badge contract address.
    pub contract_address: String,
    /// Badge level.
    pub level: u32,
}

/// Campaign badge providers, keyed by provider id.
///
/// Serializes as `{ "<provider>": { "contractAddress": ..., "level": ... } }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BadgeRegistry {
    badges: BTreeMap<ProviderId, BadgeInfo>,
}

impl BadgeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a badge provider.
    #[must_use]
    pub fn with(
        mut self,
        provider: impl Into<ProviderId>,
        contract_address: impl Into<String>,
        level: u32,
    ) -> Self {
        self.badges.insert(
            provider.into(),
            BadgeInfo {
                contract_address: contract_address.into(),
                level,
            },
        );
        self
    }

    /// Badge info for a provider.
    pub fn get(&self, provider: &ProviderId) -> Option<&BadgeInfo> {
        self.badges.get(provider)
    }

    /// Number of badge providers.
    pub fn len(&self) -> usize {
        self.badges.len()
    }

    /// Returns true if no badge providers are registered.
    pub fn is_empty(&self) -> bool {
        self.badges.is_empty()
    }

    /// Badge credentials held in `passport`, in stamp order.
    pub fn campaign_credentials(&self, passport: &Passport) -> Vec<CampaignCredential> {
        passport
            .stamps
            .iter()
            .filter_map(|stamp| {
                self.get(&stamp.provider).map(|info| CampaignCredential {
                    contract_address: info.contract_address.clone(),
                    level: info.level,
                    credential: stamp.credential.clone(),
                })
            })
            .collect()
    }
}

/// Provider hash of a credential as stored on badge contracts.
///
/// The subject hash has the form `<version>:<base64>`; the result is the
/// decoded bytes as `0x`-prefixed hex.
pub fn provider_hash(credential: &VerifiableCredential) -> Option<String> {
    let hash = credential.credential_subject.hash.as_deref()?;
    let (_, encoded) = hash.split_once(':')?;
    let bytes = BASE64_STANDARD.decode(encoded).ok()?;
    Some(format!("0x{}", hex::encode(bytes)))
}

// ============================================================================
// Dedup
// ============================================================================

/// A credential bound to a badge contract at some level.
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignCredential {
    /// Badge contract address.
    pub contract_address: String,
    /// Badge level.
    pub level: u32,
    /// The credential.
    pub credential: VerifiableCredential,
}

/// Keeps the highest-level credential per contract address.
///
/// An entry only replaces the kept one if its level is strictly greater,
/// so ties keep the first seen. Contracts appear in first-seen order.
pub fn dedup_highest_level(
    credentials: impl IntoIterator<Item = CampaignCredential>,
) -> Vec<CampaignCredential> {
    let mut kept: Vec<CampaignCredential> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for candidate in credentials {
        match index.get(&candidate.contract_address) {
            Some(&i) => {
                if candidate.level > kept[i].level {
                    kept[i] = candidate;
                }
            }
            None => {
                index.insert(candidate.contract_address.clone(), kept.len());
                kept.push(candidate);
            }
        }
    }
    kept
}

// ============================================================================
// Chain
// ============================================================================

/// The attester and badge contracts.
#[async_trait]
pub trait AttestationChain: Send + Sync {
    /// Reads the recipient's current nonce.
    async fn recipient_nonce(&self, recipient: &str) -> Result<u64, ChainError>;

    /// Returns true if `hash` was burned on the badge `contract`.
    async fn is_hash_burned(&self, contract: &str, hash: &str) -> Result<bool, ChainError>;

    /// Reads the `index`th hash burned by `user` on the badge `contract`.
    ///
    /// Returns `None` past the last entry.
    async fn user_provider_hash(
        &self,
        contract: &str,
        user: &str,
        index: usize,
    ) -> Result<Option<String>, ChainError>;

    /// Submits a signed attestation payload. Returns the transaction hash.
    async fn verify_and_attest(
        &self,
        passport: &Value,
        signature: &EasSignature,
    ) -> Result<String, ChainError>;
}

// ============================================================================
// Issuer
// ============================================================================

/// Successful attestation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationReceipt {
    /// Nonce the attestation was generated for.
    pub nonce: u64,
    /// Transaction hash.
    pub transaction: String,
}

/// Result of minting campaign badges from a passport.
#[derive(Debug, Clone, PartialEq)]
pub struct BadgeMint {
    /// Badge stamps found in the passport.
    pub eligible: usize,
    /// Badge stamps left after dropping hashes burned by another user.
    pub unburned: usize,
    /// Highest-level credential per contract, as attested.
    pub minted: Vec<CampaignCredential>,
    /// Attestation receipt, absent if nothing was left to mint.
    pub receipt: Option<AttestationReceipt>,
}

impl BadgeMint {
    /// True if some badge stamps were dropped as already burned elsewhere.
    pub fn has_deduplicated(&self) -> bool {
        self.unburned < self.eligible
    }
}

/// Hashes burned by the recipient on one contract, read lazily.
#[derive(Default)]
struct UserHashes {
    hashes: Vec<String>,
    complete: bool,
}

/// Issues attestations through an endpoint and a chain.
pub struct AttestationIssuer {
    http: Arc<HttpClient>,
    endpoint: String,
    chain_id: String,
    chain: Arc<dyn AttestationChain>,
}

impl AttestationIssuer {
    /// Creates an issuer posting to `endpoint` for `chain_id`.
    pub fn new(
        http: Arc<HttpClient>,
        endpoint: impl Into<String>,
        chain_id: impl Into<String>,
        chain: Arc<dyn AttestationChain>,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            chain_id: chain_id.into(),
            chain,
        }
    }

    /// Attests `credentials` for `recipient`.
    #[instrument(
        skip(self, credentials),
        fields(count = credentials.len(), chain = %self.chain_id)
    )]
    pub async fn issue(
        &self,
        recipient: &str,
        credentials: Vec<VerifiableCredential>,
    ) -> Result<AttestationReceipt, AttestationError> {
        let nonce = self
            .chain
            .recipient_nonce(recipient)
            .await
            .map_err(|e| AttestationError::NonceUnavailable(e.to_string()))?;
        debug!(nonce, "Nonce read");

        let request = AttestationRequest {
            recipient: recipient.to_string(),
            credentials,
            chain_id: self.chain_id.clone(),
            nonce,
        };
        let (passport, signature) = self.generate(&request).await?;

        let transaction = self
            .chain
            .verify_and_attest(&passport, &signature)
            .await
            .map_err(|e| AttestationError::Transaction(e.to_string()))?;

        info!(nonce, tx = %transaction, "Attestation submitted");
        Ok(AttestationReceipt { nonce, transaction })
    }

    /// Drops credentials whose hash was burned on its contract by someone
    /// other than `recipient`.
    ///
    /// Hashes burned by the recipient are read once per contract and
    /// reused. Credentials without a decodable hash are skipped.
    #[instrument(skip(self, credentials), fields(count = credentials.len()))]
    pub async fn unburned_badges(
        &self,
        recipient: &str,
        credentials: Vec<CampaignCredential>,
    ) -> Result<Vec<CampaignCredential>, BadgeCheckError> {
        let mut users: HashMap<String, UserHashes> = HashMap::new();
        let mut kept = Vec::with_capacity(credentials.len());

        for candidate in credentials {
            let Some(hash) = provider_hash(&candidate.credential) else {
                warn!(
                    provider = candidate.credential.provider().unwrap_or_default(),
                    "Badge stamp has no provider hash, skipping"
                );
                continue;
            };

            let burned = self
                .chain
                .is_hash_burned(&candidate.contract_address, &hash)
                .await
                .map_err(|e| BadgeCheckError(e.to_string()))?;

            if !burned {
                kept.push(candidate);
                continue;
            }

            let user = users.entry(candidate.contract_address.clone()).or_default();
            if self
                .burned_by(&candidate.contract_address, recipient, &hash, user)
                .await
            {
                kept.push(candidate);
            } else {
                debug!(%hash, "Badge hash burned by another user");
            }
        }
        Ok(kept)
    }

    async fn burned_by(
        &self,
        contract: &str,
        recipient: &str,
        hash: &str,
        user: &mut UserHashes,
    ) -> bool {
        if user.hashes.iter().any(|h| h.eq_ignore_ascii_case(hash)) {
            return true;
        }
        while !user.complete {
            let next = self
                .chain
                .user_provider_hash(contract, recipient, user.hashes.len())
                .await;
            match next {
                Ok(Some(found)) => {
                    let matched = found.eq_ignore_ascii_case(hash);
                    user.hashes.push(found);
                    if matched {
                        return true;
                    }
                }
                Ok(None) => user.complete = true,
                Err(e) => {
                    debug!(error = %e, "User hash read failed, treating as end of list");
                    user.complete = true;
                }
            }
        }
        false
    }

    /// Mints the recipient's campaign badges from `passport`.
    ///
    /// Picks badge stamps through `registry`, drops hashes burned by other
    /// users, keeps the highest level per contract and attests the rest.
    /// Nothing is attested, and no nonce is read, if no badge is left.
    #[instrument(skip(self, passport, registry))]
    pub async fn mint_badges(
        &self,
        recipient: &str,
        passport: &Passport,
        registry: &BadgeRegistry,
    ) -> Result<BadgeMint, BadgeMintError> {
        let eligible = registry.campaign_credentials(passport);
        let eligible_count = eligible.len();

        let unburned = self.unburned_badges(recipient, eligible).await.inspect_err(|e| {
            warn!(error = %e, "Badge check failed");
        })?;
        let unburned_count = unburned.len();

        let minted = dedup_highest_level(unburned);
        if minted.is_empty() {
            info!(eligible = eligible_count, "No badges to mint");
            return Ok(BadgeMint {
                eligible: eligible_count,
                unburned: unburned_count,
                minted,
                receipt: None,
            });
        }

        let credentials = minted.iter().map(|c| c.credential.clone()).collect();
        let receipt = self.issue(recipient, credentials).await?;

        Ok(BadgeMint {
            eligible: eligible_count,
            unburned: unburned_count,
            minted,
            receipt: Some(receipt),
        })
    }

    async fn generate(
        &self,
        request: &AttestationRequest,
    ) -> Result<(Value, EasSignature), AttestationError> {
        let generation = |msg: String| {
            warn!(error = %msg, "Attestation generation failed");
            AttestationError::Generation(msg)
        };

        let response = self
            .http
            .post_json(&self.endpoint, request)
            .await
            .map_err(|e| generation(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(generation(format!("HTTP {status}: {body}")));
        }

        let data = response
            .json::<AttestationResponse>()
            .await
            .map_err(|e| generation(e.to_string()))?
            .into_data();

        if let Some(error) = data.error {
            return Err(generation(error));
        }
        match (data.passport, data.signature) {
            (Some(passport), Some(signature)) => Ok((passport, signature)),
            _ => Err(generation("response lacks signature or payload".to_string())),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use chrono::Utc;
    use serde_json::json;
    use stampkit_core::{CredentialSubject, Stamp};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn credential(provider: &str) -> VerifiableCredential {
        VerifiableCredential {
            context: vec![],
            types: vec!["VerifiableCredential".into()],
            credential_subject: CredentialSubject {
                provider: Some(provider.into()),
                ..CredentialSubject::default()
            },
            issuer: "did:key:iam".into(),
            issuance_date: "2024-01-01T00:00:00Z".into(),
            expiration_date: "2099-01-01T00:00:00Z".into(),
            proof: None,
        }
    }

    fn campaign(contract: &str, level: u32, provider: &str) -> CampaignCredential {
        CampaignCredential {
            contract_address: contract.into(),
            level,
            credential: credential(provider),
        }
    }

    #[test]
    fn test_dedup_keeps_highest_level() {
        let kept = dedup_highest_level(vec![
            campaign("0xA", 1, "A1"),
            campaign("0xB", 2, "B2"),
            campaign("0xA", 3, "A3"),
            campaign("0xA", 2, "A2"),
        ]);
        let providers: Vec<&str> = kept.iter().filter_map(|c| c.credential.provider()).collect();
        assert_eq!(providers, vec!["A3", "B2"]);
    }

    /// Credential whose subject hash encodes `raw`.
    fn hashed(provider: &str, raw: &[u8]) -> VerifiableCredential {
        let mut credential = credential(provider);
        credential.credential_subject.hash =
            Some(format!("v0.0.0:{}", BASE64_STANDARD.encode(raw)));
        credential
    }

    fn hex_of(raw: &[u8]) -> String {
        format!("0x{}", hex::encode(raw))
    }

    #[test]
    fn test_dedup_ties_keep_first_seen() {
        let kept = dedup_highest_level(vec![
            campaign("0xA", 2, "first"),
            campaign("0xA", 2, "second"),
        ]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].credential.provider(), Some("first"));
    }

    #[test]
    fn test_provider_hash_decodes_base64() {
        let mut credential = credential("provider1");
        credential.credential_subject.hash = Some("base64:MTIzNDU2Nzg5MA==".into());
        assert_eq!(
            provider_hash(&credential).as_deref(),
            Some("0x31323334353637383930")
        );

        credential.credential_subject.hash = Some("no-separator".into());
        assert_eq!(provider_hash(&credential), None);
        credential.credential_subject.hash = Some("v0.0.0:***".into());
        assert_eq!(provider_hash(&credential), None);
        credential.credential_subject.hash = None;
        assert_eq!(provider_hash(&credential), None);
    }

    #[test]
    fn test_registry_picks_badge_stamps() {
        let registry = BadgeRegistry::new()
            .with("provider1", "0xContract1", 1)
            .with("provider2", "0xContract2", 2);

        let mut passport = Passport::new(Utc::now());
        for provider in ["Github", "provider2", "provider1"] {
            passport.stamps.push(Stamp {
                provider: provider.into(),
                credential: credential(provider),
            });
        }

        let badges = registry.campaign_credentials(&passport);
        let found: Vec<(&str, u32)> = badges
            .iter()
            .map(|c| (c.contract_address.as_str(), c.level))
            .collect();
        assert_eq!(found, vec![("0xContract2", 2), ("0xContract1", 1)]);
    }

    #[test]
    fn test_registry_wire_shape() {
        let registry: BadgeRegistry = serde_json::from_value(json!({
            "provider1": {"contractAddress": "0xContract1", "level": 1}
        }))
        .unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get(&"provider1".into()),
            Some(&BadgeInfo {
                contract_address: "0xContract1".into(),
                level: 1
            })
        );
    }

    // ------------------------------------------------------------------------
    // Issuer
    // ------------------------------------------------------------------------

    #[derive(Default)]
    struct MockChain {
        nonce: Option<u64>,
        reject_tx: bool,
        submitted: Mutex<Vec<EasSignature>>,
        /// Hashes burned per contract.
        burned: HashMap<String, Vec<String>>,
        /// Hashes burned by the recipient per contract, in index order.
        user_hashes: HashMap<String, Vec<String>>,
        fail_burn_check: bool,
        nonce_reads: AtomicUsize,
        user_reads: AtomicUsize,
    }

    impl MockChain {
        fn new(nonce: Option<u64>, reject_tx: bool) -> Arc<Self> {
            Arc::new(Self {
                nonce,
                reject_tx,
                ..Self::default()
            })
        }

        fn with_badges(
            nonce: Option<u64>,
            burned: &[(&str, String)],
            user_hashes: &[(&str, String)],
        ) -> Arc<Self> {
            let mut chain = Self {
                nonce,
                ..Self::default()
            };
            for (contract, hash) in burned {
                chain.burned.entry(contract.to_string()).or_default().push(hash.clone());
            }
            for (contract, hash) in user_hashes {
                chain
                    .user_hashes
                    .entry(contract.to_string())
                    .or_default()
                    .push(hash.clone());
            }
            Arc::new(chain)
        }
    }

    #[async_trait]
    impl AttestationChain for MockChain {
        async fn recipient_nonce(&self, _recipient: &str) -> Result<u64, ChainError> {
            self.nonce_reads.fetch_add(1, Ordering::SeqCst);
            self.nonce.ok_or_else(|| ChainError("execution reverted".into()))
        }

        async fn is_hash_burned(&self, contract: &str, hash: &str) -> Result<bool, ChainError> {
            if self.fail_burn_check {
                return Err(ChainError("rpc unavailable".into()));
            }
            Ok(self
                .burned
                .get(contract)
                .is_some_and(|hashes| hashes.iter().any(|h| h == hash)))
        }

        async fn user_provider_hash(
            &self,
            contract: &str,
            _user: &str,
            index: usize,
        ) -> Result<Option<String>, ChainError> {
            self.user_reads.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .user_hashes
                .get(contract)
                .and_then(|hashes| hashes.get(index))
                .cloned())
        }

        async fn verify_and_attest(
            &self,
            _passport: &Value,
            signature: &EasSignature,
        ) -> Result<String, ChainError> {
            if self.reject_tx {
                return Err(ChainError("user rejected".into()));
            }
            self.submitted.lock().unwrap().push(signature.clone());
            Ok("0xtx".into())
        }
    }

    async fn spawn_endpoint(status: StatusCode, body: Value) -> String {
        spawn_recording_endpoint(status, body).await.0
    }

    /// Attestation endpoint that keeps every request it receives.
    async fn spawn_recording_endpoint(
        status: StatusCode,
        body: Value,
    ) -> (String, Arc<Mutex<Vec<Value>>>) {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = requests.clone();
        let app = Router::new().route(
            "/attest",
            post(move |Json(req): Json<Value>| {
                let body = body.clone();
                let seen = seen.clone();
                async move {
                    assert!(req["nonce"].is_u64());
                    assert_eq!(req["chainId"], "0xa");
                    seen.lock().unwrap().push(req);
                    (status, Json(body))
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/attest"), requests)
    }

    fn signed() -> Value {
        json!({
            "data": {
                "signature": {"v": 27, "r": "0x01", "s": "0x02"},
                "passport": {"fee": "1"}
            }
        })
    }

    fn issuer(endpoint: String, chain: Arc<MockChain>) -> AttestationIssuer {
        AttestationIssuer::new(Arc::new(HttpClient::new()), endpoint, "0xa", chain)
    }

    #[tokio::test]
    async fn test_issue_success() {
        let endpoint = spawn_endpoint(StatusCode::OK, signed()).await;
        let chain = MockChain::new(Some(7), false);

        let receipt = issuer(endpoint, chain.clone())
            .issue("0xabc", vec![credential("A3")])
            .await
            .unwrap();

        assert_eq!(receipt.nonce, 7);
        assert_eq!(receipt.transaction, "0xtx");
        assert_eq!(chain.submitted.lock().unwrap()[0].v, 27);
    }

    #[tokio::test]
    async fn test_nonce_failure() {
        let endpoint = spawn_endpoint(StatusCode::OK, signed()).await;
        let err = issuer(endpoint, MockChain::new(None, false))
            .issue("0xabc", vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, AttestationError::NonceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_server_error_is_generation_failure() {
        let endpoint = spawn_endpoint(
            StatusCode::OK,
            json!({"data": {"error": "invalid credentials"}}),
        )
        .await;
        let err = issuer(endpoint, MockChain::new(Some(1), false))
            .issue("0xabc", vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, AttestationError::Generation(ref m) if m == "invalid credentials"));

        let endpoint = spawn_endpoint(StatusCode::INTERNAL_SERVER_ERROR, json!({})).await;
        let err = issuer(endpoint, MockChain::new(Some(1), false))
            .issue("0xabc", vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, AttestationError::Generation(_)));
    }

    #[tokio::test]
    async fn test_transaction_failure() {
        let endpoint = spawn_endpoint(StatusCode::OK, signed()).await;
        let err = issuer(endpoint, MockChain::new(Some(1), true))
            .issue("0xabc", vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, AttestationError::Transaction(_)));
        assert_eq!(
            err.user_message(),
            "An unexpected error occurred while trying to bring the data onchain."
        );
    }

    // ------------------------------------------------------------------------
    // Badges
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_unburned_keeps_own_and_fresh_hashes() {
        let chain = MockChain::with_badges(
            Some(1),
            &[("0xA", hex_of(b"mine")), ("0xA", hex_of(b"theirs"))],
            &[("0xA", hex_of(b"other")), ("0xA", hex_of(b"mine"))],
        );
        let issuer = issuer("http://127.0.0.1:9/attest".into(), chain.clone());

        let candidates = vec![
            CampaignCredential {
                contract_address: "0xA".into(),
                level: 1,
                credential: hashed("fresh", b"fresh"),
            },
            CampaignCredential {
                contract_address: "0xA".into(),
                level: 2,
                credential: hashed("mine", b"mine"),
            },
            CampaignCredential {
                contract_address: "0xA".into(),
                level: 3,
                credential: hashed("theirs", b"theirs"),
            },
            campaign("0xA", 4, "unhashed"),
        ];

        let kept = issuer.unburned_badges("0xabc", candidates).await.unwrap();
        let providers: Vec<&str> = kept.iter().filter_map(|c| c.credential.provider()).collect();
        assert_eq!(providers, vec!["fresh", "mine"]);
        // "mine" found at index 1, "theirs" reads index 2 and hits the end.
        assert_eq!(chain.user_reads.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_mint_badges_dedups_before_issue() {
        let (endpoint, requests) = spawn_recording_endpoint(StatusCode::OK, signed()).await;
        let chain = MockChain::with_badges(Some(5), &[("0xB", hex_of(b"B2"))], &[]);
        let registry = BadgeRegistry::new()
            .with("A1", "0xA", 1)
            .with("A3", "0xA", 3)
            .with("B2", "0xB", 2)
            .with("C1", "0xC", 1);

        let mut passport = Passport::new(Utc::now());
        for provider in ["A1", "Github", "B2", "A3", "C1"] {
            passport.stamps.push(Stamp {
                provider: provider.into(),
                credential: hashed(provider, provider.as_bytes()),
            });
        }

        let mint = issuer(endpoint, chain.clone())
            .mint_badges("0xabc", &passport, &registry)
            .await
            .unwrap();

        assert_eq!(mint.eligible, 4);
        assert_eq!(mint.unburned, 3);
        assert!(mint.has_deduplicated());
        let minted: Vec<&str> = mint
            .minted
            .iter()
            .filter_map(|c| c.credential.provider())
            .collect();
        assert_eq!(minted, vec!["A3", "C1"]);
        assert_eq!(mint.receipt.map(|r| r.nonce), Some(5));

        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let sent: Vec<&str> = requests[0]["credentials"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|c| c["credentialSubject"]["provider"].as_str())
            .collect();
        assert_eq!(sent, vec!["A3", "C1"]);
    }

    #[tokio::test]
    async fn test_mint_badges_without_badges_skips_issue() {
        let chain = MockChain::new(None, false);
        let registry = BadgeRegistry::new().with("A1", "0xA", 1);
        let mut passport = Passport::new(Utc::now());
        passport.stamps.push(Stamp {
            provider: "Github".into(),
            credential: hashed("Github", b"gh"),
        });

        let mint = issuer("http://127.0.0.1:9/attest".into(), chain.clone())
            .mint_badges("0xabc", &passport, &registry)
            .await
            .unwrap();

        assert_eq!(mint.eligible, 0);
        assert!(mint.minted.is_empty());
        assert!(mint.receipt.is_none());
        assert!(!mint.has_deduplicated());
        assert_eq!(chain.nonce_reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_mint_badges_check_failure() {
        let chain = Arc::new(MockChain {
            nonce: Some(1),
            fail_burn_check: true,
            ..MockChain::default()
        });
        let registry = BadgeRegistry::new().with("A1", "0xA", 1);
        let mut passport = Passport::new(Utc::now());
        passport.stamps.push(Stamp {
            provider: "A1".into(),
            credential: hashed("A1", b"A1"),
        });

        let err = issuer("http://127.0.0.1:9/attest".into(), chain.clone())
            .mint_badges("0xabc", &passport, &registry)
            .await
            .unwrap_err();

        assert!(matches!(err, BadgeMintError::Check(_)));
        assert_eq!(
            err.user_message(),
            "An unexpected error occurred while checking for existing onchain badges."
        );
        assert_eq!(chain.nonce_reads.load(Ordering::SeqCst), 0);
    }
}
