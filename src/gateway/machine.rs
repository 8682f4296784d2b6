//! Per-request authentication state machine.
//!
//! Every request starts `Anonymous` and ends `Authenticated` or `Denied`.
//! The login endpoint's method check runs before the token fast path, so a
//! bare page fetch of the login URL is a protocol-shape denial even for an
//! already-authenticated caller.

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::config::GatewayConfig;
use super::identity::IdentityProvider;
use super::outcome::{DenyReason, Outcome};
use super::request::{AuthRequest, Credential};
use super::token_store::TokenStore;
use super::verifier::SecondaryVerifier;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FlowState {
    Anonymous,
    AwaitingSecondaryFactor,
    Authenticated,
    Denied,
}

impl FlowState {
    fn as_str(self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::AwaitingSecondaryFactor => "awaiting_secondary_factor",
            Self::Authenticated => "authenticated",
            Self::Denied => "denied",
        }
    }
}

fn transition(from: FlowState, to: FlowState) {
    debug!(from = from.as_str(), to = to.as_str(), "Authentication state transition");
}

pub(crate) struct StateMachine<'a> {
    pub(crate) store: &'a TokenStore,
    pub(crate) verifier: &'a dyn SecondaryVerifier,
    pub(crate) identity: &'a dyn IdentityProvider,
    pub(crate) config: &'a GatewayConfig,
}

impl StateMachine<'_> {
    pub(crate) async fn decide(&self, request: &AuthRequest) -> Outcome {
        if request.targets_login(self.config) {
            return self.login_endpoint(request).await;
        }
        if request.targets_logout(self.config) {
            return self.logout_endpoint(request).await;
        }
        self.protected_path(request).await
    }

    async fn login_endpoint(&self, request: &AuthRequest) -> Outcome {
        // Protocol shape first: a non-POST is never a submission, token or no
        // token.
        if !request.is_submission() {
            transition(FlowState::Anonymous, FlowState::Denied);
            return Outcome::Denied {
                reason: DenyReason::NotASubmission,
            };
        }

        // Token fast path: an established session short-circuits the login
        // endpoint without re-verification.
        if let Some(raw) = &request.presented_token {
            if let Some(outcome) = self.authenticate_token(raw).await {
                return outcome;
            }
        }

        let Some(credential) = &request.credential else {
            let challenge_id = Uuid::new_v4();
            transition(FlowState::Anonymous, FlowState::AwaitingSecondaryFactor);
            debug!(%challenge_id, "Login submission without secondary-factor evidence");
            return Outcome::RequiresSecondaryFactor { challenge_id };
        };

        transition(FlowState::Anonymous, FlowState::AwaitingSecondaryFactor);
        match credential {
            Credential::Face {
                principal_id,
                assertion,
            } => self.face_login(principal_id, assertion).await,
        }
    }

    async fn face_login(&self, principal_id: &str, assertion: &[u8]) -> Outcome {
        let verdict = self.verifier.verify(principal_id, assertion).await;
        if !verdict.accepted {
            transition(FlowState::AwaitingSecondaryFactor, FlowState::Denied);
            debug!(
                subject = principal_id,
                reason = verdict.reason.as_deref().unwrap_or("unspecified"),
                "Secondary factor rejected"
            );
            return Outcome::Denied {
                reason: DenyReason::InvalidCredential,
            };
        }

        let principal = match self.identity.lookup(principal_id).await {
            Ok(Some(principal)) => principal,
            Ok(None) => {
                // The verifier vouched for a subject the directory has never
                // heard of; treat it as a credential failure.
                warn!(subject = principal_id, "Accepted assertion for unknown subject");
                transition(FlowState::AwaitingSecondaryFactor, FlowState::Denied);
                return Outcome::Denied {
                    reason: DenyReason::InvalidCredential,
                };
            }
            Err(err) => {
                error!("Failed to resolve principal: {err:#}");
                transition(FlowState::AwaitingSecondaryFactor, FlowState::Denied);
                return Outcome::Denied {
                    reason: DenyReason::InternalError,
                };
            }
        };

        match self.store.issue(&principal.user_id).await {
            Ok(token) => {
                transition(FlowState::AwaitingSecondaryFactor, FlowState::Authenticated);
                info!(subject = %principal.user_id, "Session established");
                Outcome::Authenticated { principal, token }
            }
            Err(err) => {
                error!("Failed to issue session token: {err:#}");
                transition(FlowState::AwaitingSecondaryFactor, FlowState::Denied);
                Outcome::Denied {
                    reason: DenyReason::InternalError,
                }
            }
        }
    }

    async fn logout_endpoint(&self, request: &AuthRequest) -> Outcome {
        // Logout is POST-only by policy.
        if !request.is_submission() {
            transition(FlowState::Anonymous, FlowState::Denied);
            return Outcome::Denied {
                reason: DenyReason::NotASubmission,
            };
        }
        if let Some(raw) = &request.presented_token {
            self.store.revoke(raw).await;
            info!("Session revoked on logout");
        }
        // Clearing an absent session is still a clean end of session.
        transition(FlowState::Authenticated, FlowState::Denied);
        Outcome::Denied {
            reason: DenyReason::LoggedOut,
        }
    }

    async fn protected_path(&self, request: &AuthRequest) -> Outcome {
        if let Some(raw) = &request.presented_token {
            if let Some(outcome) = self.authenticate_token(raw).await {
                return outcome;
            }
        }
        transition(FlowState::Anonymous, FlowState::Denied);
        Outcome::Denied {
            reason: DenyReason::Unauthenticated,
        }
    }

    /// Token fast path. `None` means the token did not resolve and the
    /// request continues as anonymous.
    async fn authenticate_token(&self, raw: &str) -> Option<Outcome> {
        let token = self.store.resolve(raw).await?;
        match self.identity.lookup(token.principal_id()).await {
            Ok(Some(principal)) => {
                transition(FlowState::Anonymous, FlowState::Authenticated);
                Some(Outcome::Authenticated { principal, token })
            }
            Ok(None) => {
                // A trusted token pointing at a dead identity is a stale
                // session, not a server fault.
                warn!(subject = token.principal_id(), "Valid token for unknown principal");
                self.store.revoke(raw).await;
                transition(FlowState::Anonymous, FlowState::Denied);
                Some(Outcome::Denied {
                    reason: DenyReason::Unauthenticated,
                })
            }
            Err(err) => {
                error!("Failed to resolve principal: {err:#}");
                transition(FlowState::Anonymous, FlowState::Denied);
                Some(Outcome::Denied {
                    reason: DenyReason::InternalError,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::identity::{LookupFuture, Principal, StaticDirectory};
    use crate::gateway::verifier::{VerificationResult, VerifyFuture};
    use anyhow::Result;
    use axum::http::Method;
    use std::time::Duration;

    struct ScriptedVerifier {
        accept: bool,
    }

    impl SecondaryVerifier for ScriptedVerifier {
        fn verify<'a>(&'a self, _principal_id: &'a str, _assertion: &'a [u8]) -> VerifyFuture<'a> {
            let accept = self.accept;
            Box::pin(async move {
                if accept {
                    VerificationResult::accept()
                } else {
                    VerificationResult::reject("scripted rejection")
                }
            })
        }
    }

    struct FailingDirectory;

    impl IdentityProvider for FailingDirectory {
        fn lookup<'a>(&'a self, _principal_id: &'a str) -> LookupFuture<'a> {
            Box::pin(async { Err(anyhow::anyhow!("directory offline")) })
        }
    }

    fn alice() -> Principal {
        Principal {
            user_id: "u1".to_string(),
            user_key: "k1".to_string(),
            username: "alice".to_string(),
            roles: vec!["admin".to_string()],
            permissions: vec!["admin".to_string()],
        }
    }

    fn face_credential() -> Credential {
        Credential::Face {
            principal_id: "u1".to_string(),
            assertion: b"valid".to_vec(),
        }
    }

    struct Fixture {
        store: TokenStore,
        directory: StaticDirectory,
        config: GatewayConfig,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                store: TokenStore::new(Duration::from_secs(60)),
                directory: StaticDirectory::new(vec![alice()]),
                config: GatewayConfig::new("/login".to_string()),
            }
        }

        fn machine<'a>(&'a self, verifier: &'a dyn SecondaryVerifier) -> StateMachine<'a> {
            StateMachine {
                store: &self.store,
                verifier,
                identity: &self.directory,
                config: &self.config,
            }
        }
    }

    #[tokio::test]
    async fn accepted_submission_authenticates_and_issues_token() -> Result<()> {
        let fixture = Fixture::new();
        let verifier = ScriptedVerifier { accept: true };
        let machine = fixture.machine(&verifier);

        let request =
            AuthRequest::new(Method::POST, "/login").with_credential(face_credential());
        let outcome = machine.decide(&request).await;
        let Outcome::Authenticated { principal, token } = outcome else {
            panic!("expected authentication, got {outcome:?}");
        };
        assert_eq!(principal.username, "alice");
        assert!(fixture.store.resolve(token.value()).await.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn each_login_issues_a_distinct_token() -> Result<()> {
        let fixture = Fixture::new();
        let verifier = ScriptedVerifier { accept: true };
        let machine = fixture.machine(&verifier);

        let request =
            AuthRequest::new(Method::POST, "/login").with_credential(face_credential());
        let Outcome::Authenticated { token: first, .. } = machine.decide(&request).await else {
            panic!("expected authentication");
        };
        let Outcome::Authenticated { token: second, .. } = machine.decide(&request).await else {
            panic!("expected authentication");
        };
        assert_ne!(first.value(), second.value());
        Ok(())
    }

    #[tokio::test]
    async fn rejected_submission_is_invalid_credential_and_issues_nothing() {
        let fixture = Fixture::new();
        let verifier = ScriptedVerifier { accept: false };
        let machine = fixture.machine(&verifier);

        let request =
            AuthRequest::new(Method::POST, "/login").with_credential(face_credential());
        let outcome = machine.decide(&request).await;
        assert!(matches!(
            outcome,
            Outcome::Denied {
                reason: DenyReason::InvalidCredential
            }
        ));
        assert_eq!(fixture.store.active_sessions().await, 0);
    }

    #[tokio::test]
    async fn get_on_login_is_not_a_submission_even_with_a_valid_token() -> Result<()> {
        let fixture = Fixture::new();
        let verifier = ScriptedVerifier { accept: true };
        let machine = fixture.machine(&verifier);
        let token = fixture.store.issue("u1").await?;

        let request = AuthRequest::new(Method::GET, "/login").with_token(token.value());
        let outcome = machine.decide(&request).await;
        assert!(matches!(
            outcome,
            Outcome::Denied {
                reason: DenyReason::NotASubmission
            }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn login_submission_with_valid_token_short_circuits_verification() -> Result<()> {
        let fixture = Fixture::new();
        // A rejecting verifier proves the fast path never consults it.
        let verifier = ScriptedVerifier { accept: false };
        let machine = fixture.machine(&verifier);
        let token = fixture.store.issue("u1").await?;

        let request = AuthRequest::new(Method::POST, "/login").with_token(token.value());
        let outcome = machine.decide(&request).await;
        assert!(matches!(outcome, Outcome::Authenticated { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn login_submission_without_credential_requires_secondary_factor() {
        let fixture = Fixture::new();
        let verifier = ScriptedVerifier { accept: true };
        let machine = fixture.machine(&verifier);

        let request = AuthRequest::new(Method::POST, "/login");
        let outcome = machine.decide(&request).await;
        assert!(matches!(outcome, Outcome::RequiresSecondaryFactor { .. }));
    }

    #[tokio::test]
    async fn unknown_subject_is_a_credential_failure() {
        let fixture = Fixture::new();
        let verifier = ScriptedVerifier { accept: true };
        let machine = fixture.machine(&verifier);

        let request = AuthRequest::new(Method::POST, "/login").with_credential(Credential::Face {
            principal_id: "ghost".to_string(),
            assertion: b"valid".to_vec(),
        });
        let outcome = machine.decide(&request).await;
        assert!(matches!(
            outcome,
            Outcome::Denied {
                reason: DenyReason::InvalidCredential
            }
        ));
    }

    #[tokio::test]
    async fn protected_path_with_valid_token_authenticates() -> Result<()> {
        let fixture = Fixture::new();
        let verifier = ScriptedVerifier { accept: false };
        let machine = fixture.machine(&verifier);
        let token = fixture.store.issue("u1").await?;

        let request = AuthRequest::new(Method::GET, "/secure/data").with_token(token.value());
        let outcome = machine.decide(&request).await;
        assert!(matches!(outcome, Outcome::Authenticated { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn protected_path_without_token_is_unauthenticated() {
        let fixture = Fixture::new();
        let verifier = ScriptedVerifier { accept: true };
        let machine = fixture.machine(&verifier);

        let request = AuthRequest::new(Method::GET, "/secure/data");
        let outcome = machine.decide(&request).await;
        assert!(matches!(
            outcome,
            Outcome::Denied {
                reason: DenyReason::Unauthenticated
            }
        ));
    }

    #[tokio::test]
    async fn stale_token_falls_through_to_unauthenticated() -> Result<()> {
        let fixture = Fixture::new();
        let verifier = ScriptedVerifier { accept: true };
        let machine = fixture.machine(&verifier);
        let token = fixture.store.issue("u1").await?;
        fixture.store.revoke(token.value()).await;

        let request = AuthRequest::new(Method::GET, "/secure/data").with_token(token.value());
        let outcome = machine.decide(&request).await;
        assert!(matches!(
            outcome,
            Outcome::Denied {
                reason: DenyReason::Unauthenticated
            }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn logout_revokes_the_session() -> Result<()> {
        let fixture = Fixture::new();
        let verifier = ScriptedVerifier { accept: true };
        let machine = fixture.machine(&verifier);
        let token = fixture.store.issue("u1").await?;

        let request = AuthRequest::new(Method::POST, "/logout").with_token(token.value());
        let outcome = machine.decide(&request).await;
        assert!(matches!(
            outcome,
            Outcome::Denied {
                reason: DenyReason::LoggedOut
            }
        ));
        assert!(fixture.store.resolve(token.value()).await.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn logout_without_a_session_is_still_logged_out() {
        let fixture = Fixture::new();
        let verifier = ScriptedVerifier { accept: true };
        let machine = fixture.machine(&verifier);

        let request = AuthRequest::new(Method::POST, "/logout");
        let outcome = machine.decide(&request).await;
        assert!(matches!(
            outcome,
            Outcome::Denied {
                reason: DenyReason::LoggedOut
            }
        ));
    }

    #[tokio::test]
    async fn get_logout_is_a_protocol_violation() {
        let fixture = Fixture::new();
        let verifier = ScriptedVerifier { accept: true };
        let machine = fixture.machine(&verifier);

        let request = AuthRequest::new(Method::GET, "/logout");
        let outcome = machine.decide(&request).await;
        assert!(matches!(
            outcome,
            Outcome::Denied {
                reason: DenyReason::NotASubmission
            }
        ));
    }

    #[tokio::test]
    async fn directory_fault_maps_to_internal_error() -> Result<()> {
        let store = TokenStore::new(Duration::from_secs(60));
        let config = GatewayConfig::new("/login".to_string());
        let verifier = ScriptedVerifier { accept: true };
        let directory = FailingDirectory;
        let machine = StateMachine {
            store: &store,
            verifier: &verifier,
            identity: &directory,
            config: &config,
        };

        let login =
            AuthRequest::new(Method::POST, "/login").with_credential(face_credential());
        assert!(matches!(
            machine.decide(&login).await,
            Outcome::Denied {
                reason: DenyReason::InternalError
            }
        ));

        let token = store.issue("u1").await?;
        let fetch = AuthRequest::new(Method::GET, "/secure/data").with_token(token.value());
        assert!(matches!(
            machine.decide(&fetch).await,
            Outcome::Denied {
                reason: DenyReason::InternalError
            }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn token_for_vanished_principal_is_revoked() -> Result<()> {
        let store = TokenStore::new(Duration::from_secs(60));
        let config = GatewayConfig::new("/login".to_string());
        let verifier = ScriptedVerifier { accept: true };
        let directory = StaticDirectory::default();
        let machine = StateMachine {
            store: &store,
            verifier: &verifier,
            identity: &directory,
            config: &config,
        };

        let token = store.issue("gone").await?;
        let request = AuthRequest::new(Method::GET, "/secure/data").with_token(token.value());
        assert!(matches!(
            machine.decide(&request).await,
            Outcome::Denied {
                reason: DenyReason::Unauthenticated
            }
        ));
        assert!(store.resolve(token.value()).await.is_none());
        Ok(())
    }
}
