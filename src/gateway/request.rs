//! Inbound request shape, decoupled from any particular HTTP framework.

use axum::http::Method;

use super::config::GatewayConfig;

/// Credential kinds a login submission may carry.
///
/// Routing on the kind is exhaustive matching, so adding a kind forces every
/// consumer to handle it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credential {
    /// An out-of-band face-recognition assertion for the claimed subject.
    Face {
        principal_id: String,
        assertion: Vec<u8>,
    },
}

impl Credential {
    #[must_use]
    pub fn principal_id(&self) -> &str {
        match self {
            Self::Face { principal_id, .. } => principal_id,
        }
    }
}

/// One inbound call, as seen by the gateway. Transient; built per request.
#[derive(Clone, Debug)]
pub struct AuthRequest {
    pub method: Method,
    pub path: String,
    pub is_ajax: bool,
    pub presented_token: Option<String>,
    pub credential: Option<Credential>,
}

impl AuthRequest {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            is_ajax: false,
            presented_token: None,
            credential: None,
        }
    }

    #[must_use]
    pub fn with_ajax(mut self, is_ajax: bool) -> Self {
        self.is_ajax = is_ajax;
        self
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.presented_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    pub(crate) fn targets_login(&self, config: &GatewayConfig) -> bool {
        self.path == config.login_path()
    }

    pub(crate) fn targets_logout(&self, config: &GatewayConfig) -> bool {
        self.path == config.logout_path()
    }

    /// A submission is a POST; a bare page fetch of the same endpoint is not.
    pub(crate) fn is_submission(&self) -> bool {
        self.method == Method::POST
    }
}
