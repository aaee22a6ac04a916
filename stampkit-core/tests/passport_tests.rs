//! Integration tests for passport and patch types.

use chrono::{Duration, Utc};
use stampkit_core::{
    CredentialSubject, Passport, ProviderId, Stamp, StampPatch, VerifiableCredential,
};

fn credential(provider: &str, expires_in_days: i64) -> VerifiableCredential {
    VerifiableCredential {
        context: vec![],
        types: vec!["VerifiableCredential".into()],
        credential_subject: CredentialSubject {
            provider: Some(provider.into()),
            ..CredentialSubject::default()
        },
        issuer: "did:key:iam".into(),
        issuance_date: Utc::now().to_rfc3339(),
        expiration_date: (Utc::now() + Duration::days(expires_in_days)).to_rfc3339(),
        proof: None,
    }
}

#[test]
fn test_valid_providers_skip_expired() {
    let mut passport = Passport::new(Utc::now());
    passport.stamps.push(Stamp {
        provider: "Google".into(),
        credential: credential("Google", 30),
    });
    passport.stamps.push(Stamp {
        provider: "Github".into(),
        credential: credential("Github", -1),
    });

    let valid = passport.valid_providers(Utc::now());
    assert!(valid.contains(&ProviderId::from("Google")));
    assert!(!valid.contains(&ProviderId::from("Github")));
}

#[test]
fn test_refresh_expiry_takes_latest() {
    let mut passport = Passport::new(Utc::now());
    let later = credential("Ens", 90);
    let expected = later.expires_at();
    passport.stamps.push(Stamp {
        provider: "Google".into(),
        credential: credential("Google", 10),
    });
    passport.stamps.push(Stamp {
        provider: "Ens".into(),
        credential: later,
    });

    passport.refresh_expiry();
    assert_eq!(passport.expiry_date, expected);
}

#[test]
fn test_patch_serialization_roundtrip() {
    let patch = StampPatch::upsert("Google".into(), credential("Google", 1));
    let json = serde_json::to_string(&patch).unwrap();
    let parsed: StampPatch = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, patch);
    assert!(parsed.has_credential());
}
