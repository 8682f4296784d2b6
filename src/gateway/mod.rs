//! Token-based authentication gateway core.
//!
//! [`Gateway`] composes the trust store, the secondary-factor verifier, the
//! identity provider, and the response dispatcher into a single per-request
//! entry point. Each collaborator is a capability the gateway is constructed
//! with; there are no global fallbacks.

pub mod config;
pub mod dispatcher;
pub mod identity;
mod machine;
pub mod outcome;
pub mod request;
pub mod token_store;
pub mod verifier;

use std::sync::Arc;
use tracing::debug;

pub use config::GatewayConfig;
pub use dispatcher::{DenialHandler, RenderedResponse, ResponseDispatcher, ResponseKind};
pub use identity::{IdentityProvider, Principal, StaticDirectory};
pub use outcome::{DenyReason, Outcome};
pub use request::{AuthRequest, Credential};
pub use token_store::{SessionToken, TokenStore};
pub use verifier::{
    AllowAllVerifier, FaceServiceVerifier, SecondaryVerifier, VerificationResult, VerifyFuture,
};

use machine::StateMachine;

/// Per-request authentication entry point.
pub struct Gateway {
    config: GatewayConfig,
    store: Arc<TokenStore>,
    verifier: Arc<dyn SecondaryVerifier>,
    identity: Arc<dyn IdentityProvider>,
    dispatcher: ResponseDispatcher,
}

impl Gateway {
    #[must_use]
    pub fn new(
        config: GatewayConfig,
        identity: Arc<dyn IdentityProvider>,
        verifier: Arc<dyn SecondaryVerifier>,
    ) -> Self {
        let store = Arc::new(TokenStore::new(config.session_ttl()));
        let dispatcher = ResponseDispatcher::new(config.clone());
        Self {
            config,
            store,
            verifier,
            identity,
            dispatcher,
        }
    }

    /// Install a hook consulted for credential rejections and logouts.
    #[must_use]
    pub fn with_denial_handler(mut self, handler: Arc<dyn DenialHandler>) -> Self {
        self.dispatcher = self.dispatcher.with_denial_handler(handler);
        self
    }

    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    #[must_use]
    pub fn token_store(&self) -> &TokenStore {
        &self.store
    }

    /// Handle one inbound request to completion: resolve the token, run the
    /// state machine, render the outcome. Never leaves a request half-handled
    /// and never propagates a collaborator fault.
    pub async fn handle(&self, request: &AuthRequest) -> RenderedResponse {
        let machine = StateMachine {
            store: &self.store,
            verifier: self.verifier.as_ref(),
            identity: self.identity.as_ref(),
            config: &self.config,
        };
        let outcome = machine.decide(request).await;
        debug!(
            method = %request.method,
            path = %request.path,
            outcome = outcome.label(),
            "Authentication decision"
        );
        self.dispatcher.dispatch(request, &outcome)
    }
}
