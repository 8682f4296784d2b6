//! Secondary-factor verification boundary.
//!
//! The verifier is a pure accept/reject call to an external service. It never
//! blocks past its timeout and never returns an error: a timeout or transport
//! fault is a rejection with a reason, so the state machine only ever
//! branches on [`VerificationResult::accepted`].

use base64::Engine;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

/// Result of a secondary-factor check. Stateless; not persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationResult {
    pub accepted: bool,
    pub reason: Option<String>,
}

impl VerificationResult {
    #[must_use]
    pub fn accept() -> Self {
        Self {
            accepted: true,
            reason: None,
        }
    }

    #[must_use]
    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            accepted: false,
            reason: Some(reason.into()),
        }
    }
}

pub type VerifyFuture<'a> = Pin<Box<dyn Future<Output = VerificationResult> + Send + 'a>>;

/// Pluggable capability checking an out-of-band credential for a subject.
pub trait SecondaryVerifier: Send + Sync {
    fn verify<'a>(&'a self, principal_id: &'a str, assertion: &'a [u8]) -> VerifyFuture<'a>;
}

/// Verifier used when the secondary factor is disabled: every submission is
/// accepted.
#[derive(Clone, Debug)]
pub struct AllowAllVerifier;

impl SecondaryVerifier for AllowAllVerifier {
    fn verify<'a>(&'a self, _principal_id: &'a str, _assertion: &'a [u8]) -> VerifyFuture<'a> {
        Box::pin(async { VerificationResult::accept() })
    }
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    subject: &'a str,
    assertion: String,
}

#[derive(Deserialize)]
struct VerifyResponse {
    accepted: bool,
    #[serde(default)]
    reason: Option<String>,
}

/// Live verifier delegating to an external face-recognition provider over
/// HTTP. The whole exchange is bounded by `timeout`.
pub struct FaceServiceVerifier {
    client: reqwest::Client,
    endpoint: Url,
    timeout: Duration,
}

impl FaceServiceVerifier {
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(endpoint: Url, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    async fn call(&self, principal_id: &str, assertion: &[u8]) -> VerificationResult {
        let body = VerifyRequest {
            subject: principal_id,
            assertion: base64::engine::general_purpose::STANDARD.encode(assertion),
        };
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await;
        let response = match response {
            Ok(response) => response,
            Err(err) => {
                error!("Face verification request failed: {err}");
                return VerificationResult::reject("verification service unavailable");
            }
        };
        if !response.status().is_success() {
            error!("Face verification returned status {}", response.status());
            return VerificationResult::reject("verification service unavailable");
        }
        match response.json::<VerifyResponse>().await {
            Ok(verdict) if verdict.accepted => VerificationResult::accept(),
            Ok(verdict) => VerificationResult {
                accepted: false,
                reason: verdict.reason.or_else(|| Some("credential rejected".to_string())),
            },
            Err(err) => {
                error!("Face verification returned an unreadable body: {err}");
                VerificationResult::reject("verification service unavailable")
            }
        }
    }
}

impl SecondaryVerifier for FaceServiceVerifier {
    fn verify<'a>(&'a self, principal_id: &'a str, assertion: &'a [u8]) -> VerifyFuture<'a> {
        Box::pin(async move {
            match tokio::time::timeout(self.timeout, self.call(principal_id, assertion)).await {
                Ok(result) => {
                    debug!(subject = principal_id, accepted = result.accepted, "Face verification finished");
                    result
                }
                Err(_) => {
                    error!(subject = principal_id, "Face verification timed out");
                    VerificationResult::reject("verification timed out")
                }
            }
        })
    }
}
