//! JSON output formatting.

use anyhow::Result;
use serde::Serialize;
use stampkit_claim::{BatchOutcome, BulkOutcome, PlatformStatus};
use stampkit_core::{ClaimTarget, ProviderId};
use stampkit_providers::PlatformDescriptor;

// ============================================================================
// Output Types
// ============================================================================

/// Platform info output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformInfoOutput {
    pub id: String,
    pub display_name: String,
    pub description: String,
    pub is_evm: bool,
    pub oauth: bool,
    pub groups: Vec<GroupOutput>,
}

/// Provider group output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupOutput {
    pub name: String,
    pub providers: Vec<String>,
}

/// Claim batch output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutput {
    pub steps: usize,
    pub verified: usize,
    pub short_circuited: bool,
    pub platforms: Vec<PlatformOutput>,
}

/// One platform of a claim batch.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformOutput {
    pub platform: ClaimTarget,
    pub step: usize,
    pub status: PlatformStatus,
    pub patches: usize,
    pub verified: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Bulk verification output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOutput {
    pub requested: Vec<ProviderId>,
    pub verified: Vec<ProviderId>,
    pub cleared: Vec<ProviderId>,
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }

    /// Formats the platform list.
    pub fn format_platforms(&self, platforms: &[PlatformDescriptor]) -> Result<String> {
        let outputs: Vec<PlatformInfoOutput> = platforms
            .iter()
            .map(|desc| PlatformInfoOutput {
                id: desc.path().to_string(),
                display_name: desc.display_name().to_string(),
                description: desc.metadata.description.clone(),
                is_evm: desc.is_evm(),
                oauth: desc.oauth.is_some(),
                groups: desc
                    .groups
                    .iter()
                    .map(|g| GroupOutput {
                        name: g.name.to_string(),
                        providers: g.providers.iter().map(|p| p.id.to_string()).collect(),
                    })
                    .collect(),
            })
            .collect();

        self.format(&outputs)
    }

    /// Formats a claim batch outcome.
    pub fn format_batch(&self, outcome: &BatchOutcome) -> Result<String> {
        self.format(&batch_to_output(outcome))
    }

    /// Formats a bulk verification outcome.
    pub fn format_bulk(&self, outcome: &BulkOutcome) -> Result<String> {
        self.format(&bulk_to_output(outcome))
    }
}

pub(crate) fn batch_to_output(outcome: &BatchOutcome) -> BatchOutput {
    BatchOutput {
        steps: outcome.steps,
        verified: outcome.verified(),
        short_circuited: outcome.short_circuited,
        platforms: outcome
            .platforms
            .iter()
            .map(|p| PlatformOutput {
                platform: p.target,
                step: p.step,
                status: p.status,
                patches: p.patches,
                verified: p.verified,
                error: p.error.clone(),
            })
            .collect(),
    }
}

pub(crate) fn bulk_to_output(outcome: &BulkOutcome) -> BulkOutput {
    let (verified, cleared): (Vec<_>, Vec<_>) =
        outcome.patches.iter().partition(|p| p.has_credential());
    BulkOutput {
        requested: outcome.requested.clone(),
        verified: verified.into_iter().map(|p| p.provider.clone()).collect(),
        cleared: cleared.into_iter().map(|p| p.provider.clone()).collect(),
    }
}
