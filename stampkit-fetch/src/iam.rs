//! Verification service ("IAM") client.
//!
//! Credentials are issued by `POST {iam}/v{version}/verify`, authenticated in
//! one of two ways:
//!
//! - **JWT mode**: `Authorization: Bearer <token>`, body `{payload}`.
//! - **Challenge mode**: fetch a single-use challenge from
//!   `POST {iam}/v{version}/challenge`, sign it, then post
//!   `{payload, challenge, signedChallenge}`.
//!
//! [`IamClient::verify`] tries JWT first and falls back to challenge mode
//! exactly once, and only on a 401. Any other error propagates unchanged.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use stampkit_core::{CredentialResponseBody, ProviderId, RequestPayload, VerifiableCredential};
use tracing::{debug, info, instrument, warn};

use crate::error::FetchError;
use crate::host::http::HttpClient;
use crate::signer::MessageSigner;

// ============================================================================
// Verification Client Trait
// ============================================================================

/// Exchanges a proof bundle for verifiable credentials.
#[async_trait]
pub trait VerificationClient: Send + Sync {
    /// Verifies every provider named in `payload`.
    ///
    /// Always returns one body per provider outcome, regardless of whether
    /// the service answered with a bare object or an array.
    async fn verify(&self, payload: &RequestPayload)
    -> Result<Vec<CredentialResponseBody>, FetchError>;
}

// ============================================================================
// Check Result
// ============================================================================

/// One entry of a `/check` eligibility response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Provider type that was checked.
    #[serde(rename = "type")]
    pub kind: String,
    /// Whether the address currently qualifies.
    pub valid: bool,
    /// Reasons, when not valid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Vec<String>>,
}

// ============================================================================
// IAM Client
// ============================================================================

/// HTTP client for the verification service.
#[derive(Clone)]
pub struct IamClient {
    http: Arc<HttpClient>,
    iam_url: String,
    token: Option<String>,
    signer: Option<Arc<dyn MessageSigner>>,
}

impl IamClient {
    /// Creates a builder for `iam_url`.
    pub fn builder(iam_url: impl Into<String>) -> IamClientBuilder {
        IamClientBuilder::new(iam_url)
    }

    /// Base URL, without trailing slash.
    pub fn iam_url(&self) -> &str {
        &self.iam_url
    }

    /// Returns true if a bearer token is configured.
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn endpoint(&self, version: &str, path: &str) -> String {
        format!("{}/v{version}/{path}", self.iam_url)
    }

    /// Verifies in JWT mode.
    ///
    /// A 401 maps to [`FetchError::Unauthorized`].
    #[instrument(skip(self, payload, token), fields(kind = %payload.kind))]
    pub async fn verify_with_token(
        &self,
        payload: &RequestPayload,
        token: &str,
    ) -> Result<Vec<CredentialResponseBody>, FetchError> {
        let url = self.endpoint(&payload.version, "verify");
        let response = self
            .http
            .post_json_with_bearer(&url, token, &json!({ "payload": payload }))
            .await?;
        read_bodies(response).await
    }

    /// Requests a challenge credential for `payload`.
    ///
    /// Fails explicitly if the service reports an error or the credential
    /// carries no challenge message.
    #[instrument(skip(self, payload), fields(kind = %payload.kind))]
    pub async fn fetch_challenge(
        &self,
        payload: &RequestPayload,
    ) -> Result<VerifiableCredential, FetchError> {
        let url = self.endpoint(&payload.version, "challenge");

        let mut request = json!({
            "address": payload.address,
            "type": payload.kind,
            "signatureType": payload.signature_type,
        });
        if let Some(signer) = &payload.signer {
            request["signer"] = serde_json::to_value(signer)?;
        }

        let response = self.http.post_json(&url, &json!({ "payload": request })).await?;
        let response = check_status(response).await?;
        let body: CredentialResponseBody = response.json().await?;

        if let Some(error) = body.error {
            warn!(error = %error, "Challenge request rejected");
            return Err(FetchError::Challenge(error));
        }

        let credential = body.credential.ok_or(FetchError::MissingChallenge)?;
        if credential
            .credential_subject
            .challenge
            .as_deref()
            .is_none_or(str::is_empty)
        {
            return Err(FetchError::MissingChallenge);
        }

        debug!("Challenge received");
        Ok(credential)
    }

    /// Verifies in challenge mode: fetch, sign, submit.
    #[instrument(skip(self, payload), fields(kind = %payload.kind))]
    pub async fn verify_with_challenge(
        &self,
        payload: &RequestPayload,
    ) -> Result<Vec<CredentialResponseBody>, FetchError> {
        let signer = self.signer.as_ref().ok_or(FetchError::NoSigner)?;

        let challenge = self.fetch_challenge(payload).await?;
        let message = challenge
            .credential_subject
            .challenge
            .as_deref()
            .ok_or(FetchError::MissingChallenge)?;

        let signed_challenge = signer.sign_message(message).await?;
        if signed_challenge.is_empty() {
            return Err(FetchError::MissingSignature);
        }

        let url = self.endpoint(&payload.version, "verify");
        let response = self
            .http
            .post_json(
                &url,
                &json!({
                    "payload": payload,
                    "challenge": challenge,
                    "signedChallenge": signed_challenge,
                }),
            )
            .await?;
        read_bodies(response).await
    }

    /// Asks the service which of `types` the address currently qualifies for.
    #[instrument(skip(self, types), fields(count = types.len()))]
    pub async fn check(
        &self,
        address: &str,
        types: &[ProviderId],
        version: &str,
    ) -> Result<Vec<CheckResult>, FetchError> {
        let url = self.endpoint(version, "check");
        let check_types: Vec<&str> = types.iter().map(ProviderId::check_type).collect();
        let body = json!({
            "payload": {
                "type": "bulk",
                "types": check_types,
                "address": address,
                "version": version,
                "proofs": {},
            }
        });

        let response = check_status(self.http.post_json(&url, &body).await?).await?;
        let results: Vec<CheckResult> = response.json().await?;
        debug!(valid = results.iter().filter(|r| r.valid).count(), "Check completed");
        Ok(results)
    }

    /// Returns true if BrightID already verified `did` as a context id.
    #[instrument(skip(self))]
    pub async fn verify_context_id(&self, did: &str) -> Result<bool, FetchError> {
        let url = format!("{}/brightid/verifyContextId", self.iam_url);
        let response = self.http.post_json(&url, &json!({ "contextIdData": did })).await?;
        let body: Value = check_status(response).await?.json().await?;
        Ok(body["response"]["valid"].as_bool().unwrap_or(false))
    }

    /// Requests BrightID sponsorship for `did`. Returns true on success.
    #[instrument(skip(self))]
    pub async fn sponsor(&self, did: &str) -> Result<bool, FetchError> {
        let url = format!("{}/brightid/sponsor", self.iam_url);
        let response = self.http.post_json(&url, &json!({ "contextIdData": did })).await?;
        let body: Value = check_status(response).await?.json().await?;
        let success = body["response"]["result"]["status"].as_str() == Some("success");
        if !success {
            warn!(error = %body["response"]["error"], "Sponsorship rejected");
        }
        Ok(success)
    }
}

#[async_trait]
impl VerificationClient for IamClient {
    #[instrument(
        skip(self, payload),
        fields(kind = %payload.kind, providers = payload.types.len())
    )]
    async fn verify(
        &self,
        payload: &RequestPayload,
    ) -> Result<Vec<CredentialResponseBody>, FetchError> {
        let Some(token) = &self.token else {
            return self.verify_with_challenge(payload).await;
        };

        match self.verify_with_token(payload, token).await {
            Err(FetchError::Unauthorized) => {
                info!("Bearer token rejected, falling back to challenge mode");
                self.verify_with_challenge(payload).await
            }
            other => other,
        }
    }
}

impl std::fmt::Debug for IamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IamClient")
            .field("iam_url", &self.iam_url)
            .field("has_token", &self.token.is_some())
            .field("has_signer", &self.signer.is_some())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Response Handling
// ============================================================================

async fn check_status(response: Response) -> Result<Response, FetchError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(FetchError::Unauthorized);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!(status = %status, "Verification service error");
        return Err(FetchError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

async fn read_bodies(response: Response) -> Result<Vec<CredentialResponseBody>, FetchError> {
    let value: Value = check_status(response).await?.json().await?;
    normalize_bodies(value)
}

/// Normalizes a bare object or an array into a list of bodies.
pub(crate) fn normalize_bodies(value: Value) -> Result<Vec<CredentialResponseBody>, FetchError> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|v| serde_json::from_value(v).map_err(FetchError::from))
            .collect(),
        obj @ Value::Object(_) => Ok(vec![serde_json::from_value(obj)?]),
        other => Err(FetchError::InvalidResponse(format!(
            "expected object or array, got {other}"
        ))),
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for constructing an [`IamClient`].
pub struct IamClientBuilder {
    iam_url: String,
    http: Option<Arc<HttpClient>>,
    token: Option<String>,
    signer: Option<Arc<dyn MessageSigner>>,
}

impl IamClientBuilder {
    /// Creates a new builder.
    pub fn new(iam_url: impl Into<String>) -> Self {
        Self {
            iam_url: iam_url.into().trim_end_matches('/').to_string(),
            http: None,
            token: None,
            signer: None,
        }
    }

    /// Sets the HTTP client.
    #[must_use]
    pub fn http(mut self, http: Arc<HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    /// Sets the bearer token for JWT mode.
    #[must_use]
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the optional bearer token.
    #[must_use]
    pub fn maybe_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// Sets the challenge signer.
    #[must_use]
    pub fn signer(mut self, signer: Arc<dyn MessageSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Builds the client.
    pub fn build(self) -> IamClient {
        IamClient {
            http: self.http.unwrap_or_else(|| Arc::new(HttpClient::new())),
            iam_url: self.iam_url,
            token: self.token,
            signer: self.signer,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SignerError;
    use axum::extract::State;
    use axum::http::HeaderMap;
    use axum::routing::post;
    use axum::{Json, Router};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // ------------------------------------------------------------------------
    // Mock verification service
    // ------------------------------------------------------------------------

    struct MockIam {
        jwt_status: StatusCode,
        bare: bool,
        challenge: Value,
        jwt_calls: AtomicUsize,
        challenge_calls: AtomicUsize,
        signed_calls: AtomicUsize,
        last_signed: Mutex<Option<String>>,
    }

    impl MockIam {
        fn new(jwt_status: StatusCode) -> Self {
            Self {
                jwt_status,
                bare: false,
                challenge: json!({
                    "credential": {
                        "type": ["VerifiableCredential"],
                        "credentialSubject": {"id": "did:pkh:0xabc", "challenge": "sign me"}
                    }
                }),
                jwt_calls: AtomicUsize::new(0),
                challenge_calls: AtomicUsize::new(0),
                signed_calls: AtomicUsize::new(0),
                last_signed: Mutex::new(None),
            }
        }
    }

    fn issued(provider: &str) -> Value {
        json!({
            "record": {"type": provider, "version": "0.0.0"},
            "credential": {
                "type": ["VerifiableCredential"],
                "credentialSubject": {"id": "did:pkh:0xabc", "provider": provider},
                "expirationDate": "2099-01-01T00:00:00Z"
            }
        })
    }

    async fn verify_handler(
        State(state): State<Arc<MockIam>>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        if headers.contains_key("authorization") {
            state.jwt_calls.fetch_add(1, Ordering::SeqCst);
            if state.jwt_status != StatusCode::OK {
                return (state.jwt_status, Json(json!({"error": "nope"})));
            }
        } else {
            state.signed_calls.fetch_add(1, Ordering::SeqCst);
            *state.last_signed.lock().unwrap() =
                body["signedChallenge"].as_str().map(str::to_string);
        }

        let kind = body["payload"]["type"].as_str().unwrap_or_default().to_string();
        let item = issued(&kind);
        if state.bare {
            (StatusCode::OK, Json(item))
        } else {
            (StatusCode::OK, Json(json!([item])))
        }
    }

    async fn challenge_handler(State(state): State<Arc<MockIam>>) -> Json<Value> {
        state.challenge_calls.fetch_add(1, Ordering::SeqCst);
        Json(state.challenge.clone())
    }

    async fn check_handler(Json(body): Json<Value>) -> Json<Value> {
        let types = body["payload"]["types"].as_array().cloned().unwrap_or_default();
        let results: Vec<Value> = types
            .iter()
            .map(|t| json!({"type": t, "valid": t != "Github"}))
            .collect();
        Json(Value::Array(results))
    }

    async fn spawn(state: Arc<MockIam>) -> String {
        let app = Router::new()
            .route("/v0.0.0/verify", post(verify_handler))
            .route("/v0.0.0/challenge", post(challenge_handler))
            .route("/v0.0.0/check", post(check_handler))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    struct PrefixSigner(&'static str);

    #[async_trait]
    impl MessageSigner for PrefixSigner {
        async fn sign_message(&self, message: &str) -> Result<String, SignerError> {
            if self.0.is_empty() {
                return Ok(String::new());
            }
            Ok(format!("{}{message}", self.0))
        }
    }

    fn payload() -> RequestPayload {
        RequestPayload::new("Google", "0xabc", "0.0.0").with_types(vec!["Google".into()])
    }

    // ------------------------------------------------------------------------
    // Tests
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_jwt_mode_success() {
        let state = Arc::new(MockIam::new(StatusCode::OK));
        let url = spawn(state.clone()).await;
        let client = IamClient::builder(url).token("good").build();

        let bodies = client.verify(&payload()).await.unwrap();
        assert_eq!(bodies.len(), 1);
        assert!(bodies[0].is_valid());
        assert_eq!(state.jwt_calls.load(Ordering::SeqCst), 1);
        assert_eq!(state.challenge_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unauthorized_falls_back_exactly_once() {
        let state = Arc::new(MockIam::new(StatusCode::UNAUTHORIZED));
        let url = spawn(state.clone()).await;
        let client = IamClient::builder(url)
            .token("expired")
            .signer(Arc::new(PrefixSigner("sig:")))
            .build();

        let bodies = client.verify(&payload()).await.unwrap();
        assert!(bodies[0].is_valid());

        assert_eq!(state.jwt_calls.load(Ordering::SeqCst), 1);
        assert_eq!(state.challenge_calls.load(Ordering::SeqCst), 1);
        assert_eq!(state.signed_calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            state.last_signed.lock().unwrap().as_deref(),
            Some("sig:sign me")
        );
    }

    #[tokio::test]
    async fn test_other_errors_do_not_fall_back() {
        let state = Arc::new(MockIam::new(StatusCode::INTERNAL_SERVER_ERROR));
        let url = spawn(state.clone()).await;
        let client = IamClient::builder(url)
            .token("t")
            .signer(Arc::new(PrefixSigner("sig:")))
            .build();

        let err = client.verify(&payload()).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 500, .. }));
        assert_eq!(state.jwt_calls.load(Ordering::SeqCst), 1);
        assert_eq!(state.challenge_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_token_goes_straight_to_challenge() {
        let state = Arc::new(MockIam::new(StatusCode::OK));
        let url = spawn(state.clone()).await;
        let client = IamClient::builder(url)
            .signer(Arc::new(PrefixSigner("sig:")))
            .build();

        client.verify(&payload()).await.unwrap();
        assert_eq!(state.jwt_calls.load(Ordering::SeqCst), 0);
        assert_eq!(state.challenge_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_bare_object_and_array_normalize_identically() {
        let array_state = Arc::new(MockIam::new(StatusCode::OK));
        let mut bare = MockIam::new(StatusCode::OK);
        bare.bare = true;
        let bare_state = Arc::new(bare);

        let a = IamClient::builder(spawn(array_state).await).token("t").build();
        let b = IamClient::builder(spawn(bare_state).await).token("t").build();

        let from_array = a.verify(&payload()).await.unwrap();
        let from_bare = b.verify(&payload()).await.unwrap();
        assert_eq!(from_array, from_bare);
    }

    #[tokio::test]
    async fn test_missing_challenge_is_explicit() {
        let mut mock = MockIam::new(StatusCode::OK);
        mock.challenge = json!({"credential": {"credentialSubject": {"id": "did"}}});
        let url = spawn(Arc::new(mock)).await;
        let client = IamClient::builder(url)
            .signer(Arc::new(PrefixSigner("sig:")))
            .build();

        let err = client.verify(&payload()).await.unwrap_err();
        assert!(matches!(err, FetchError::MissingChallenge));
    }

    #[tokio::test]
    async fn test_challenge_error_is_explicit() {
        let mut mock = MockIam::new(StatusCode::OK);
        mock.challenge = json!({"error": "bad address", "code": 400});
        let url = spawn(Arc::new(mock)).await;
        let client = IamClient::builder(url)
            .signer(Arc::new(PrefixSigner("sig:")))
            .build();

        let err = client.verify(&payload()).await.unwrap_err();
        assert!(matches!(err, FetchError::Challenge(msg) if msg == "bad address"));
    }

    #[tokio::test]
    async fn test_missing_signature_is_explicit() {
        let state = Arc::new(MockIam::new(StatusCode::OK));
        let url = spawn(state.clone()).await;
        let client = IamClient::builder(url)
            .signer(Arc::new(PrefixSigner("")))
            .build();

        let err = client.verify(&payload()).await.unwrap_err();
        assert!(matches!(err, FetchError::MissingSignature));
        assert_eq!(state.signed_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_challenge_without_signer() {
        let url = spawn(Arc::new(MockIam::new(StatusCode::OK))).await;
        let client = IamClient::builder(url).build();
        assert!(matches!(
            client.verify(&payload()).await,
            Err(FetchError::NoSigner)
        ));
    }

    #[tokio::test]
    async fn test_check_normalizes_allowlist() {
        let url = spawn(Arc::new(MockIam::new(StatusCode::OK))).await;
        let client = IamClient::builder(url).build();

        let results = client
            .check(
                "0xabc",
                &["AllowList#Gold".into(), "Github".into()],
                "0.0.0",
            )
            .await
            .unwrap();

        assert_eq!(results[0].kind, "AllowList");
        assert!(results[0].valid);
        assert!(!results[1].valid);
    }

    #[test]
    fn test_normalize_rejects_scalars() {
        assert!(matches!(
            normalize_bodies(json!("nope")),
            Err(FetchError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = IamClient::builder("https://iam.example/api/").build();
        assert_eq!(
            client.endpoint("0.0.0", "verify"),
            "https://iam.example/api/v0.0.0/verify"
        );
    }
}
