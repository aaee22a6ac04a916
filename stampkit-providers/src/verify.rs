//! Verification-side provider contract.
//!
//! A [`Provider`] decides whether the subject of a [`RequestPayload`]
//! qualifies for one Stamp type. All providers verified in one request share
//! a single [`ProviderContext`], so the first provider that needs a balance
//! or token fetches it and the rest read it from the context.
//!
//! [`verify_types`] runs one request: a fresh context, platform groups in
//! parallel, providers within a group one after another.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use stampkit_core::{PlatformId, ProviderId, RequestPayload};
use stampkit_fetch::ProviderContext;
use tracing::{debug, instrument, warn};

use crate::error::ProviderError;
use crate::registry::PlatformRegistry;

/// Context namespace for cached balances.
pub const BALANCES_NAMESPACE: &str = "balances";

/// Code reported for a provider that ran and said no.
pub const CODE_INVALID: u16 = 403;

/// Code reported for a provider that could not run.
pub const CODE_PROVIDER_ERROR: u16 = 400;

// ============================================================================
// Verified Payload
// ============================================================================

/// Outcome of one provider's verification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedPayload {
    /// Whether the subject qualifies.
    pub valid: bool,
    /// Reasons, when not valid.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub error: Vec<String>,
    /// Fields stored in the proof record, when valid.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub record: BTreeMap<String, String>,
}

impl VerifiedPayload {
    /// A valid outcome with `record`.
    pub fn valid(record: BTreeMap<String, String>) -> Self {
        Self {
            valid: true,
            error: Vec::new(),
            record,
        }
    }

    /// An invalid outcome with reasons.
    pub fn invalid(error: Vec<String>) -> Self {
        Self {
            valid: false,
            error,
            record: BTreeMap::new(),
        }
    }
}

// ============================================================================
// Provider Trait
// ============================================================================

/// Verifies one Stamp type.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Stamp type this provider issues.
    fn provider_type(&self) -> &ProviderId;

    /// Verifies `payload`, sharing lookups through `context`.
    async fn verify(
        &self,
        payload: &RequestPayload,
        context: &ProviderContext,
    ) -> Result<VerifiedPayload, ProviderError>;
}

/// Providers available to [`verify_types`], keyed by type.
#[derive(Default, Clone)]
pub struct ProviderSet {
    providers: HashMap<ProviderId, Arc<dyn Provider>>,
}

impl ProviderSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a provider under its type.
    pub fn register(&mut self, provider: Arc<dyn Provider>) {
        self.providers.insert(provider.provider_type().clone(), provider);
    }

    /// Builder-style register.
    #[must_use]
    pub fn with(mut self, provider: Arc<dyn Provider>) -> Self {
        self.register(provider);
        self
    }

    /// Gets the provider for a type.
    pub fn get(&self, kind: &ProviderId) -> Option<&Arc<dyn Provider>> {
        self.providers.get(kind)
    }

    /// Number of registered providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns true if empty.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl std::fmt::Debug for ProviderSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<&str> = self.providers.keys().map(ProviderId::as_str).collect();
        kinds.sort_unstable();
        f.debug_struct("ProviderSet").field("providers", &kinds).finish()
    }
}

// ============================================================================
// Batch Verification
// ============================================================================

/// Result for one requested type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeVerification {
    /// Requested type.
    #[serde(rename = "type")]
    pub kind: ProviderId,
    /// Provider outcome.
    pub payload: VerifiedPayload,
    /// `403` for invalid, `400` for provider errors, absent when valid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
}

impl TypeVerification {
    /// Returns true if the type verified.
    pub fn is_valid(&self) -> bool {
        self.payload.valid
    }
}

/// Verifies `types` for one request.
///
/// A fresh [`ProviderContext`] is created for the call and dropped with it.
/// Results are returned in the order of `types`.
#[instrument(
    skip(providers, types, payload),
    fields(address = %payload.address, count = types.len())
)]
pub async fn verify_types(
    providers: &ProviderSet,
    types: &[ProviderId],
    payload: &RequestPayload,
) -> Vec<TypeVerification> {
    let context = ProviderContext::new();

    let mut groups: BTreeMap<Option<PlatformId>, Vec<(usize, &ProviderId)>> = BTreeMap::new();
    for (index, kind) in types.iter().enumerate() {
        groups
            .entry(PlatformRegistry::platform_for_provider(kind))
            .or_default()
            .push((index, kind));
    }

    let context = &context;
    let runs = groups.into_values().map(|group| async move {
        let mut out = Vec::with_capacity(group.len());
        for (index, kind) in group {
            out.push((index, verify_one(providers, kind, payload, context).await));
        }
        out
    });

    let mut results: Vec<(usize, TypeVerification)> =
        join_all(runs).await.into_iter().flatten().collect();
    results.sort_by_key(|(index, _)| *index);

    debug!(cached = context.len(), "Verification batch finished");
    results.into_iter().map(|(_, r)| r).collect()
}

async fn verify_one(
    providers: &ProviderSet,
    kind: &ProviderId,
    payload: &RequestPayload,
    context: &ProviderContext,
) -> TypeVerification {
    let Some(provider) = providers.get(kind) else {
        warn!(provider = %kind, "No provider registered");
        return TypeVerification {
            kind: kind.clone(),
            payload: VerifiedPayload::invalid(vec![format!("Missing provider: {kind}")]),
            code: Some(CODE_PROVIDER_ERROR),
        };
    };

    match provider.verify(payload, context).await {
        Ok(result) if result.valid => TypeVerification {
            kind: kind.clone(),
            payload: result,
            code: None,
        },
        Ok(result) => TypeVerification {
            kind: kind.clone(),
            payload: result,
            code: Some(CODE_INVALID),
        },
        Err(e) => {
            warn!(provider = %kind, error = %e, "Provider failed");
            TypeVerification {
                kind: kind.clone(),
                payload: VerifiedPayload::invalid(vec![e.to_string()]),
                code: Some(CODE_PROVIDER_ERROR),
            }
        }
    }
}

// ============================================================================
// Balance Source
// ============================================================================

/// Reads on-chain balances in base units.
#[async_trait]
pub trait BalanceSource: Send + Sync {
    /// Native ETH balance in wei.
    async fn eth_balance(&self, address: &str) -> Result<u128, ProviderError>;

    /// ERC-20 balance in the token's base units.
    async fn token_balance(&self, address: &str, contract: &str) -> Result<u128, ProviderError>;
}

// ============================================================================
// ETH / ERC-20 Possession
// ============================================================================

/// Options for [`EthErc20PossessionProvider`].
#[derive(Debug, Clone)]
pub struct PossessionOptions {
    /// Minimum holding, in whole tokens (decimal string).
    pub threshold: String,
    /// Record attribute, also the type prefix (e.g. `ethPossessionsGte`).
    pub record_attribute: String,
    /// ERC-20 contract, or `None` for native ETH.
    pub contract_address: Option<String>,
    /// Token decimals.
    pub decimals: u32,
    /// Error reported when the balance cannot be read.
    pub error: String,
}

impl PossessionOptions {
    /// Native ETH possession of at least `threshold`.
    pub fn eth(threshold: &str) -> Self {
        Self {
            threshold: threshold.to_string(),
            record_attribute: "ethPossessionsGte".to_string(),
            contract_address: None,
            decimals: 18,
            error: "ETH Possessions Provider Error".to_string(),
        }
    }
}

/// Holds at least `threshold` of ETH or an ERC-20 token.
///
/// The type is `"{record_attribute}#{threshold}"`, e.g. `ethPossessionsGte#1`.
pub struct EthErc20PossessionProvider {
    kind: ProviderId,
    threshold: u128,
    options: PossessionOptions,
    source: Arc<dyn BalanceSource>,
}

impl EthErc20PossessionProvider {
    /// Creates the provider, validating the threshold.
    pub fn new(
        options: PossessionOptions,
        source: Arc<dyn BalanceSource>,
    ) -> Result<Self, ProviderError> {
        let threshold = parse_units(&options.threshold, options.decimals)?;
        Ok(Self {
            kind: ProviderId::new(format!("{}#{}", options.record_attribute, options.threshold)),
            threshold,
            options,
            source,
        })
    }

    async fn balance(
        &self,
        address: &str,
        context: &ProviderContext,
    ) -> Result<u128, ProviderError> {
        let asset = self.options.contract_address.as_deref().unwrap_or("eth");
        let key = format!("{}:{asset}", address.to_lowercase());

        let value = context
            .get_or_fetch(BALANCES_NAMESPACE, &key, || async {
                let amount = match &self.options.contract_address {
                    Some(contract) => self.source.token_balance(address, contract).await?,
                    None => self.source.eth_balance(address).await?,
                };
                Ok::<_, ProviderError>(Value::String(amount.to_string()))
            })
            .await?;

        value
            .as_str()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| ProviderError::Source(format!("unreadable cached balance: {value}")))
    }
}

#[async_trait]
impl Provider for EthErc20PossessionProvider {
    fn provider_type(&self) -> &ProviderId {
        &self.kind
    }

    #[instrument(skip(self, payload, context), fields(provider = %self.kind))]
    async fn verify(
        &self,
        payload: &RequestPayload,
        context: &ProviderContext,
    ) -> Result<VerifiedPayload, ProviderError> {
        let amount = match self.balance(&payload.address, context).await {
            Ok(amount) => amount,
            Err(e) => {
                warn!(error = %e, "Balance lookup failed");
                return Ok(VerifiedPayload::invalid(vec![self.options.error.clone()]));
            }
        };

        if amount < self.threshold {
            return Ok(VerifiedPayload::invalid(vec![format!(
                "Balance below {}",
                self.options.threshold
            )]));
        }

        let mut record = BTreeMap::new();
        record.insert("address".to_string(), payload.address.clone());
        record.insert(
            self.options.record_attribute.clone(),
            self.options.threshold.clone(),
        );
        Ok(VerifiedPayload::valid(record))
    }
}

/// Parses a decimal amount like `"1.5"` into base units.
fn parse_units(amount: &str, decimals: u32) -> Result<u128, ProviderError> {
    let invalid = || ProviderError::InvalidOptions(format!("invalid amount: {amount}"));

    let (whole, frac) = amount.split_once('.').unwrap_or((amount, ""));
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    let decimals = usize::try_from(decimals).map_err(|_| invalid())?;
    if frac.len() > decimals || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let digits = format!("{whole}{frac:0<decimals$}");
    digits.parse::<u128>().map_err(|_| invalid())
}

// ============================================================================
// Tests
// ============================================================================
