//! Text output formatting with colors.

use chrono::{DateTime, Utc};
use stampkit_claim::{BatchOutcome, BulkOutcome, PlatformStatus};
use stampkit_core::Passport;
use stampkit_providers::PlatformDescriptor;

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    // ------------------------------------------------------------------------
    // Platforms
    // ------------------------------------------------------------------------

    /// Header line for the platform table.
    pub fn format_platforms_header(&self) -> String {
        self.bold(&format!(
            "{:<14} {:<14} {:<9} {}",
            "PLATFORM", "NAME", "PROOF", "PROVIDERS"
        ))
    }

    /// One platform line, followed by its providers when `verbose`.
    pub fn format_platform(&self, desc: &PlatformDescriptor, verbose: bool) -> String {
        let proof = if desc.is_evm() {
            "address"
        } else if desc.oauth.is_some() {
            "oauth"
        } else {
            "custom"
        };
        let count = desc.groups.iter().map(|g| g.providers.len()).sum::<usize>();

        let mut lines = vec![format!(
            "{:<14} {:<14} {:<9} {}",
            desc.path(),
            desc.display_name(),
            self.color(CYAN, proof),
            count
        )];

        if verbose {
            for group in &desc.groups {
                lines.push(format!("  {}", self.dim(group.name)));
                for provider in &group.providers {
                    lines.push(format!("    {:<32} {}", provider.id, provider.title));
                }
            }
        }
        lines.join("\n")
    }

    // ------------------------------------------------------------------------
    // Claims
    // ------------------------------------------------------------------------

    /// Formats a claim batch outcome.
    pub fn format_batch(&self, outcome: &BatchOutcome) -> String {
        let mut lines = Vec::new();

        for platform in &outcome.platforms {
            let mut line = format!(
                "{} {:<14} {}/{} verified",
                self.status_badge(platform.status),
                platform.target.as_str(),
                platform.verified,
                platform.patches
            );
            if let Some(error) = &platform.error {
                line.push_str(&format!("  {}", self.color(RED, error)));
            }
            lines.push(line);
        }

        if outcome.short_circuited {
            lines.push(self.color(YELLOW, "Batch ended early for sponsorship"));
        }
        lines.push(String::new());
        lines.push(format!(
            "{} stamps verified across {} platforms",
            outcome.verified(),
            outcome.steps
        ));
        lines.join("\n")
    }

    /// Formats a bulk verification outcome.
    pub fn format_bulk(&self, outcome: &BulkOutcome) -> String {
        if outcome.is_empty() {
            return "No eligible providers to verify".to_string();
        }

        let mut lines = Vec::new();
        for patch in &outcome.patches {
            let badge = if patch.has_credential() {
                self.color(GREEN, "✓")
            } else {
                self.color(RED, "✗")
            };
            lines.push(format!("{badge} {}", patch.provider));
        }
        lines.push(String::new());
        lines.push(format!(
            "{} of {} providers verified",
            outcome.verified(),
            outcome.requested.len()
        ));
        lines.join("\n")
    }

    // ------------------------------------------------------------------------
    // Passport
    // ------------------------------------------------------------------------

    /// Formats the stored passport.
    pub fn format_passport(&self, passport: &Passport, now: DateTime<Utc>) -> String {
        if passport.stamps.is_empty() {
            return "No stamps yet".to_string();
        }

        let mut lines = vec![self.bold(&format!("{:<32} {}", "PROVIDER", "EXPIRES"))];
        for stamp in &passport.stamps {
            let expiry = match stamp.credential.expires_at() {
                Some(at) if at > now => at.format("%Y-%m-%d").to_string(),
                Some(at) => self.color(RED, &format!("{} (expired)", at.format("%Y-%m-%d"))),
                None => self.color(RED, "unknown"),
            };
            lines.push(format!("{:<32} {expiry}", stamp.provider.as_str()));
        }

        if let Some(expiry) = passport.expiry_date {
            lines.push(String::new());
            lines.push(format!("Passport expires {}", expiry.format("%Y-%m-%d")));
        }
        lines.join("\n")
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    pub(crate) fn status_badge(&self, status: PlatformStatus) -> String {
        match status {
            PlatformStatus::Verified => self.color(GREEN, "✓"),
            PlatformStatus::Failed => self.color(RED, "✗"),
            PlatformStatus::Skipped => self.color(YELLOW, "-"),
            PlatformStatus::Pending | PlatformStatus::InProgress => self.dim("…"),
        }
    }

    fn color(&self, code: &str, text: &str) -> String {
        if self.use_colors {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        self.color(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.color(DIM, text)
    }
}
