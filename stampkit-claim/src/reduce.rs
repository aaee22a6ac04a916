//! Reduction of verification responses into stamp patches.

use std::collections::HashSet;

use stampkit_core::{CredentialResponseBody, ProviderId, StampPatch};

/// Drops repeated provider ids, keeping the first occurrence.
pub fn dedup_providers(providers: &[ProviderId]) -> Vec<ProviderId> {
    let mut seen = HashSet::new();
    providers
        .iter()
        .filter(|p| seen.insert(*p))
        .cloned()
        .collect()
}

/// Builds one patch per requested provider.
///
/// A provider with a valid credential in `bodies` gets an upsert patch;
/// every other requested provider gets a clear patch, so a failed
/// re-verification still expires the old stamp. The result has exactly one
/// entry per distinct id in `requested`, in request order.
pub fn build_stamp_patches(
    requested: &[ProviderId],
    bodies: &[CredentialResponseBody],
) -> Vec<StampPatch> {
    dedup_providers(requested)
        .into_iter()
        .map(|provider| {
            let credential = bodies
                .iter()
                .filter(|b| b.is_valid())
                .find(|b| b.provider().as_ref() == Some(&provider))
                .and_then(|b| b.credential.clone());
            match credential {
                Some(credential) => StampPatch::upsert(provider, credential),
                None => StampPatch::clear(provider),
            }
        })
        .collect()
}

/// Number of patches carrying a credential.
pub fn verified_count(patches: &[StampPatch]) -> usize {
    patches.iter().filter(|p| p.has_credential()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use stampkit_core::{CredentialSubject, ProofRecord, VerifiableCredential};
    use std::collections::BTreeMap;

    fn issued(provider: &str) -> CredentialResponseBody {
        CredentialResponseBody::issued(
            ProofRecord {
                kind: provider.into(),
                fields: BTreeMap::new(),
            },
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
            },
        )
    }

    fn ids(names: &[&str]) -> Vec<ProviderId> {
        names.iter().map(|n| ProviderId::from(*n)).collect()
    }

    #[test]
    fn test_valid_and_errored_split() {
        let requested = ids(&["Ens", "Github", "Google"]);
        let bodies = vec![
            issued("Github"),
            CredentialResponseBody::failed("not eligible", 403),
            issued("Ens"),
        ];

        let patches = build_stamp_patches(&requested, &bodies);

        assert_eq!(patches.len(), 3);
        assert_eq!(verified_count(&patches), 2);
        let order: Vec<&str> = patches.iter().map(|p| p.provider.as_str()).collect();
        assert_eq!(order, vec!["Ens", "Github", "Google"]);
        assert!(!patches[2].has_credential());
    }

    #[test]
    fn test_empty_response_clears_everything() {
        let requested = ids(&["Google"]);
        let patches = build_stamp_patches(&requested, &[]);
        assert_eq!(patches, vec![StampPatch::clear("Google".into())]);
    }

    #[test]
    fn test_unrequested_credentials_are_ignored() {
        let patches = build_stamp_patches(&ids(&["Ens"]), &[issued("Github")]);
        assert_eq!(patches.len(), 1);
        assert_eq!(verified_count(&patches), 0);
    }

    #[test]
    fn test_duplicate_requests_collapse() {
        let patches = build_stamp_patches(&ids(&["Ens", "Ens"]), &[issued("Ens")]);
        assert_eq!(patches.len(), 1);
        assert!(patches[0].has_credential());
    }
}
