//! CLI output formatting tests.

#[cfg(test)]
mod text_formatter_tests {
    use super::super::text::TextFormatter;
    use chrono::{Duration, Utc};
    use stampkit_claim::{BatchOutcome, BulkOutcome, PlatformOutcome, PlatformStatus};
    use stampkit_core::{
        ClaimTarget, CredentialSubject, Passport, PlatformId, Stamp, StampPatch,
        VerifiableCredential,
    };
    use stampkit_providers::PlatformRegistry;

    fn credential(expires: chrono::DateTime<Utc>) -> VerifiableCredential {
        VerifiableCredential {
            context: vec![],
            types: vec!["VerifiableCredential".into()],
            credential_subject: CredentialSubject::default(),
            issuer: "did:key:iam".into(),
            issuance_date: Utc::now().to_rfc3339(),
            expiration_date: expires.to_rfc3339(),
            proof: None,
        }
    }

    #[test]
    fn test_status_badges_without_colors() {
        let formatter = TextFormatter::new(false);
        assert_eq!(formatter.status_badge(PlatformStatus::Verified), "✓");
        assert_eq!(formatter.status_badge(PlatformStatus::Failed), "✗");
        assert_eq!(formatter.status_badge(PlatformStatus::Skipped), "-");
    }

    #[test]
    fn test_status_badge_with_colors() {
        let formatter = TextFormatter::new(true);
        assert!(formatter.status_badge(PlatformStatus::Failed).contains("\x1b[31m"));
    }

    #[test]
    fn test_platform_line_verbose_lists_providers() {
        let formatter = TextFormatter::new(false);
        let desc = PlatformRegistry::get(PlatformId::Ens).unwrap();

        let short = formatter.format_platform(desc, false);
        assert!(short.starts_with("Ens"));
        assert!(short.contains("address"));
        assert_eq!(short.lines().count(), 1);

        let long = formatter.format_platform(desc, true);
        assert!(long.lines().count() > 1);
        assert!(long.contains("Ens"));
    }

    #[test]
    fn test_batch_summary() {
        let formatter = TextFormatter::new(false);
        let outcome = BatchOutcome {
            platforms: vec![
                PlatformOutcome {
                    target: ClaimTarget::Platform(PlatformId::Github),
                    step: 0,
                    status: PlatformStatus::Verified,
                    patches: 2,
                    verified: 1,
                    error: None,
                },
                PlatformOutcome {
                    target: ClaimTarget::Platform(PlatformId::Google),
                    step: 1,
                    status: PlatformStatus::Failed,
                    patches: 0,
                    verified: 0,
                    error: Some("boom".into()),
                },
            ],
            steps: 2,
            short_circuited: false,
        };

        let output = formatter.format_batch(&outcome);
        assert!(output.contains("✓ Github"));
        assert!(output.contains("1/2 verified"));
        assert!(output.contains("boom"));
        assert!(output.contains("1 stamps verified across 2 platforms"));
    }

    #[test]
    fn test_empty_bulk() {
        let formatter = TextFormatter::new(false);
        assert_eq!(
            formatter.format_bulk(&BulkOutcome::default()),
            "No eligible providers to verify"
        );
    }

    #[test]
    fn test_bulk_lists_patches() {
        let formatter = TextFormatter::new(false);
        let outcome = BulkOutcome {
            platforms: vec![],
            requested: vec!["Ens".into(), "EthGasProvider".into()],
            patches: vec![
                StampPatch::upsert("Ens".into(), credential(Utc::now() + Duration::days(90))),
                StampPatch::clear("EthGasProvider".into()),
            ],
        };

        let output = formatter.format_bulk(&outcome);
        assert!(output.contains("✓ Ens"));
        assert!(output.contains("✗ EthGasProvider"));
        assert!(output.contains("1 of 2 providers verified"));
    }

    #[test]
    fn test_passport_marks_expired() {
        let formatter = TextFormatter::new(false);
        let now = Utc::now();
        let mut passport = Passport::new(now);
        passport.stamps.push(Stamp {
            provider: "Ens".into(),
            credential: credential(now - Duration::days(1)),
        });
        passport.stamps.push(Stamp {
            provider: "Github".into(),
            credential: credential(now + Duration::days(30)),
        });

        let output = formatter.format_passport(&passport, now);
        assert!(output.contains("(expired)"));
        assert_eq!(output.matches("(expired)").count(), 1);
    }

    #[test]
    fn test_empty_passport() {
        let formatter = TextFormatter::new(false);
        assert_eq!(
            formatter.format_passport(&Passport::new(Utc::now()), Utc::now()),
            "No stamps yet"
        );
    }
}

#[cfg(test)]
mod json_formatter_tests {
    use super::super::json::{JsonFormatter, batch_to_output, bulk_to_output};
    use stampkit_claim::{BatchOutcome, BulkOutcome, PlatformOutcome, PlatformStatus};
    use stampkit_core::{ClaimTarget, StampPatch};
    use stampkit_providers::PlatformRegistry;

    #[test]
    fn test_format_pretty() {
        let formatter = JsonFormatter::new(true);
        let output = formatter.format(&serde_json::json!({"key": "value"})).unwrap();
        assert!(output.contains('\n'));
    }

    #[test]
    fn test_format_compact() {
        let formatter = JsonFormatter::new(false);
        let output = formatter.format(&serde_json::json!({"key": "value"})).unwrap();
        assert!(!output.contains('\n'));
    }

    #[test]
    fn test_platforms_json() {
        let formatter = JsonFormatter::new(false);
        let output = formatter.format_platforms(PlatformRegistry::all()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        let platforms = value.as_array().unwrap();
        assert_eq!(platforms.len(), PlatformRegistry::count());
        assert!(platforms.iter().any(|p| p["id"] == "ETH" && p["isEvm"] == true));
    }

    #[test]
    fn test_batch_json_uses_wire_names() {
        let outcome = BatchOutcome {
            platforms: vec![PlatformOutcome {
                target: ClaimTarget::EvmBulkVerify,
                step: 0,
                status: PlatformStatus::Failed,
                patches: 1,
                verified: 0,
                error: None,
            }],
            steps: 1,
            short_circuited: false,
        };
        let value = serde_json::to_value(batch_to_output(&outcome)).unwrap();
        assert_eq!(value["platforms"][0]["platform"], "EVMBulkVerify");
        assert_eq!(value["shortCircuited"], false);
        assert!(value["platforms"][0].get("error").is_none());
    }

    #[test]
    fn test_bulk_json_splits_verified_and_cleared() {
        let outcome = BulkOutcome {
            platforms: vec![],
            requested: vec!["Ens".into()],
            patches: vec![StampPatch::clear("Ens".into())],
        };
        let output = bulk_to_output(&outcome);
        assert!(output.verified.is_empty());
        assert_eq!(output.cleared.len(), 1);
    }
}
