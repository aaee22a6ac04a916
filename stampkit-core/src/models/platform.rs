//! Platform and provider identifiers.
//!
//! - [`PlatformId`] - Enum of supported platforms
//! - [`ClaimTarget`] - What a claim entry targets (a platform or bulk EVM)
//! - [`ProviderId`] - Identifier of one provider, i.e. one Stamp type

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Name of the pseudo-platform used for one-click EVM verification.
pub const EVM_BULK_VERIFY: &str = "EVMBulkVerify";

// ============================================================================
// Platform Id
// ============================================================================

/// Supported identity platforms.
///
/// The serialized form is the platform path used by the verification
/// service and by the OAuth redirect channel (`{path}_oauth_channel`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PlatformId {
    /// Google account
    Google,
    /// GitHub account
    Github,
    /// Discord account
    Discord,
    /// LinkedIn account
    Linkedin,
    /// X / Twitter account
    Twitter,
    /// BrightID sponsorship
    Brightid,
    /// Gitcoin grants contributions
    Gitcoin,
    /// Ethereum Name Service
    Ens,
    /// ETH and token holdings
    #[serde(rename = "ETH")]
    Eth,
    /// GTC staking
    GtcStaking,
    /// NFT holdings
    #[serde(rename = "NFT")]
    Nft,
}

impl PlatformId {
    /// Returns the path of this platform as used on the wire.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Google => "Google",
            Self::Github => "Github",
            Self::Discord => "Discord",
            Self::Linkedin => "Linkedin",
            Self::Twitter => "Twitter",
            Self::Brightid => "Brightid",
            Self::Gitcoin => "Gitcoin",
            Self::Ens => "Ens",
            Self::Eth => "ETH",
            Self::GtcStaking => "GtcStaking",
            Self::Nft => "NFT",
        }
    }

    /// Returns the display name for this platform.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Google => "Google",
            Self::Github => "GitHub",
            Self::Discord => "Discord",
            Self::Linkedin => "LinkedIn",
            Self::Twitter => "X",
            Self::Brightid => "BrightID",
            Self::Gitcoin => "Gitcoin",
            Self::Ens => "ENS",
            Self::Eth => "ETH",
            Self::GtcStaking => "GTC Staking",
            Self::Nft => "NFT Holder",
        }
    }

    /// Returns all available platforms.
    pub fn all() -> &'static [PlatformId] {
        &[
            Self::Google,
            Self::Github,
            Self::Discord,
            Self::Linkedin,
            Self::Twitter,
            Self::Brightid,
            Self::Gitcoin,
            Self::Ens,
            Self::Eth,
            Self::GtcStaking,
            Self::Nft,
        ]
    }

    /// Returns the lowercase CLI name for this platform.
    pub fn cli_name(&self) -> String {
        self.path().to_lowercase()
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for PlatformId {
    type Err = CoreError;

    /// Parses either the wire path or the lowercase CLI name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|p| p.path() == s || p.path().eq_ignore_ascii_case(s))
            .ok_or_else(|| CoreError::UnknownPlatform(s.to_string()))
    }
}

// ============================================================================
// Claim Target
// ============================================================================

/// The target of one claim entry.
///
/// Claims either go to a concrete platform (which acquires a proof first) or
/// to the address-derived `EVMBulkVerify` pseudo-platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ClaimTarget {
    /// One concrete platform.
    Platform(PlatformId),
    /// Address-derived bulk verification, no popup.
    EvmBulkVerify,
}

impl ClaimTarget {
    /// Returns the wire name of this target.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Platform(p) => p.path(),
            Self::EvmBulkVerify => EVM_BULK_VERIFY,
        }
    }

    /// Returns the platform, if this target is one.
    pub fn platform(&self) -> Option<PlatformId> {
        match self {
            Self::Platform(p) => Some(*p),
            Self::EvmBulkVerify => None,
        }
    }
}

impl From<PlatformId> for ClaimTarget {
    fn from(p: PlatformId) -> Self {
        Self::Platform(p)
    }
}

impl fmt::Display for ClaimTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClaimTarget {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == EVM_BULK_VERIFY {
            return Ok(Self::EvmBulkVerify);
        }
        s.parse::<PlatformId>().map(Self::Platform)
    }
}

impl TryFrom<String> for ClaimTarget {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClaimTarget> for String {
    fn from(t: ClaimTarget) -> Self {
        t.as_str().to_string()
    }
}

// ============================================================================
// Provider Id
// ============================================================================

/// Identifier of one provider (one Stamp type), e.g. `"ethPossessionsGte#1"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderId(String);

impl ProviderId {
    /// Creates a provider id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the type checked by the verification service.
    ///
    /// All `AllowList*` providers are checked as the bare `AllowList` type.
    pub fn check_type(&self) -> &str {
        if self.0.starts_with("AllowList") {
            "AllowList"
        } else {
            &self.0
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProviderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ProviderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for ProviderId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
