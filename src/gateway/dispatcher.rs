//! Rendering of authentication outcomes.
//!
//! Programmatic (AJAX-style) callers always get the fixed JSON envelope:
//! `{"success": false, "message": ...}` on denial and
//! `{"success": true, "data": ...}` on success. Interactive callers get a
//! redirect to the login page for any denial that means "please log in".

use axum::http::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;
use url::form_urlencoded;

use super::config::GatewayConfig;
use super::identity::Principal;
use super::outcome::{DenyReason, Outcome};
use super::request::AuthRequest;
use super::token_store::SessionToken;

/// A fully rendered response, ready for the transport adapter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedResponse {
    pub status: StatusCode,
    pub set_cookie: Option<String>,
    pub kind: ResponseKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResponseKind {
    Json(Value),
    Redirect { location: String },
}

impl RenderedResponse {
    #[must_use]
    pub fn json(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            set_cookie: None,
            kind: ResponseKind::Json(body),
        }
    }

    #[must_use]
    pub fn redirect(location: String) -> Self {
        Self {
            status: StatusCode::FOUND,
            set_cookie: None,
            kind: ResponseKind::Redirect { location },
        }
    }

    #[must_use]
    pub fn with_cookie(mut self, cookie: String) -> Self {
        self.set_cookie = Some(cookie);
        self
    }
}

/// Extension point consulted for credential rejections and logouts, mirroring
/// a handler-interceptor hook. Returning `None` falls back to the default
/// policy.
pub trait DenialHandler: Send + Sync {
    fn handle(&self, request: &AuthRequest, reason: DenyReason) -> Option<RenderedResponse>;
}

pub struct ResponseDispatcher {
    config: GatewayConfig,
    denial_handler: Option<Arc<dyn DenialHandler>>,
}

impl ResponseDispatcher {
    #[must_use]
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            denial_handler: None,
        }
    }

    #[must_use]
    pub fn with_denial_handler(mut self, handler: Arc<dyn DenialHandler>) -> Self {
        self.denial_handler = Some(handler);
        self
    }

    #[must_use]
    pub fn dispatch(&self, request: &AuthRequest, outcome: &Outcome) -> RenderedResponse {
        match outcome {
            Outcome::Authenticated { principal, token } => self.success(principal, token),
            Outcome::RequiresSecondaryFactor { .. } => RenderedResponse::json(
                StatusCode::UNAUTHORIZED,
                failure_envelope("Secondary factor verification required."),
            ),
            Outcome::Denied { reason } => self.denied(request, *reason),
        }
    }

    fn success(&self, principal: &Principal, token: &SessionToken) -> RenderedResponse {
        // `perms` mirrors the role list; the upstream success handler did the
        // same and downstream consumers depend on the shape.
        let data = json!({
            "userid": principal.user_id,
            "userkey": principal.user_key,
            "username": principal.username,
            "roles": principal.roles,
            "perms": principal.roles,
        });
        RenderedResponse::json(StatusCode::OK, json!({"success": true, "data": data}))
            .with_cookie(self.session_cookie(token.value()))
    }

    fn denied(&self, request: &AuthRequest, reason: DenyReason) -> RenderedResponse {
        match reason {
            DenyReason::NotASubmission => RenderedResponse::json(
                StatusCode::BAD_REQUEST,
                failure_envelope(&format!(
                    "Authentication url [{}] Not Http Post request.",
                    self.config.login_url()
                )),
            ),
            DenyReason::Unauthenticated => self.require_login(
                request,
                "Attempting to access a path which requires authentication.",
            ),
            DenyReason::InvalidCredential => {
                if let Some(handled) = self.consult_handler(request, reason) {
                    return handled;
                }
                self.require_login(request, "Secondary factor verification failed.")
            }
            DenyReason::LoggedOut => {
                if let Some(handled) = self.consult_handler(request, reason) {
                    return handled;
                }
                // End of session: always clear the cookie, whatever the caller.
                self.require_login(request, "Session terminated.")
                    .with_cookie(self.clear_session_cookie())
            }
            DenyReason::InternalError => RenderedResponse::json(
                StatusCode::INTERNAL_SERVER_ERROR,
                failure_envelope("Authentication service error."),
            ),
        }
    }

    fn consult_handler(&self, request: &AuthRequest, reason: DenyReason) -> Option<RenderedResponse> {
        self.denial_handler
            .as_ref()
            .and_then(|handler| handler.handle(request, reason))
    }

    /// JSON for AJAX callers, redirect-to-login for interactive callers. The
    /// originally requested URL rides along for post-login replay.
    fn require_login(&self, request: &AuthRequest, message: &str) -> RenderedResponse {
        if request.is_ajax {
            return RenderedResponse::json(StatusCode::UNAUTHORIZED, failure_envelope(message));
        }
        RenderedResponse::redirect(self.login_location(request))
    }

    fn login_location(&self, request: &AuthRequest) -> String {
        let login_url = self.config.login_url();
        // GETs to the login page itself never reach here, so no loop risk.
        let separator = if login_url.contains('?') { '&' } else { '?' };
        let encoded: String = form_urlencoded::byte_serialize(request.path.as_bytes()).collect();
        format!("{login_url}{separator}redirect_to={encoded}")
    }

    fn session_cookie(&self, token: &str) -> String {
        let name = self.config.session_cookie_name();
        let max_age = self.config.session_ttl_seconds();
        let mut cookie =
            format!("{name}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}");
        if self.config.session_cookie_secure() {
            cookie.push_str("; Secure");
        }
        cookie
    }

    fn clear_session_cookie(&self) -> String {
        let name = self.config.session_cookie_name();
        let mut cookie = format!("{name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
        if self.config.session_cookie_secure() {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

fn failure_envelope(message: &str) -> Value {
    json!({"success": false, "message": message})
}
