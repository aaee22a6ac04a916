//! Platform registry for managing all platform descriptors.
//!
//! The registry provides static access to all platform configurations and
//! is the only place a [`PlatformId`] is resolved to its proof provider.

use stampkit_core::{PlatformId, ProviderId};
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::descriptor::PlatformDescriptor;
use crate::platforms::{
    brightid_descriptor, discord_descriptor, ens_descriptor, eth_descriptor, gitcoin_descriptor,
    github_descriptor, google_descriptor, gtc_staking_descriptor, linkedin_descriptor,
    nft_descriptor, twitter_descriptor,
};

// ============================================================================
// Static Registry
// ============================================================================

/// Static storage for all platform descriptors.
static DESCRIPTORS: OnceLock<Vec<PlatformDescriptor>> = OnceLock::new();

/// Static storage for provider id to platform mapping.
static PROVIDER_MAP: OnceLock<HashMap<ProviderId, PlatformId>> = OnceLock::new();

/// Initializes all platform descriptors.
///
/// OAuth platforms first, then BrightID, then address-derived platforms.
fn init_descriptors() -> Vec<PlatformDescriptor> {
    vec![
        // OAuth
        google_descriptor(),
        github_descriptor(),
        discord_descriptor(),
        linkedin_descriptor(),
        twitter_descriptor(),
        // Sponsorship
        brightid_descriptor(),
        // Address-derived
        gitcoin_descriptor(),
        ens_descriptor(),
        eth_descriptor(),
        gtc_staking_descriptor(),
        nft_descriptor(),
    ]
}

fn build_provider_map(descriptors: &[PlatformDescriptor]) -> HashMap<ProviderId, PlatformId> {
    let mut map = HashMap::new();
    for desc in descriptors {
        for provider in desc.provider_ids() {
            map.insert(provider, desc.id);
        }
    }
    map
}

// ============================================================================
// Platform Registry
// ============================================================================

/// Global registry of all platform descriptors.
pub struct PlatformRegistry;

impl PlatformRegistry {
    /// Returns all platform descriptors.
    pub fn all() -> &'static [PlatformDescriptor] {
        DESCRIPTORS.get_or_init(init_descriptors)
    }

    /// Gets a platform descriptor by id.
    pub fn get(id: PlatformId) -> Option<&'static PlatformDescriptor> {
        Self::all().iter().find(|d| d.id == id)
    }

    /// Looks up a platform by its path or CLI name.
    pub fn get_by_name(name: &str) -> Option<&'static PlatformDescriptor> {
        let id = name.parse::<PlatformId>().ok()?;
        Self::get(id)
    }

    /// Returns the platform that issues `provider`.
    pub fn platform_for_provider(provider: &ProviderId) -> Option<PlatformId> {
        PROVIDER_MAP
            .get_or_init(|| build_provider_map(Self::all()))
            .get(provider)
            .copied()
    }

    /// Returns all EVM-derivable platforms.
    pub fn evm_platforms() -> Vec<&'static PlatformDescriptor> {
        Self::all().iter().filter(|d| d.is_evm()).collect()
    }

    /// Returns the number of registered platforms.
    pub fn count() -> usize {
        Self::all().len()
    }

    /// Returns all platform ids.
    pub fn ids() -> Vec<PlatformId> {
        Self::all().iter().map(|d| d.id).collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
