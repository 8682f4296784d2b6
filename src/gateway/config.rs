//! Gateway configuration: endpoints, cookie settings, and TTLs.

use std::time::Duration;

const DEFAULT_LOGIN_PATH: &str = "/login";
const DEFAULT_LOGOUT_PATH: &str = "/logout";
const DEFAULT_SESSION_COOKIE: &str = "tessera_session";
const DEFAULT_SESSION_TTL_SECONDS: i64 = 12 * 60 * 60;
const DEFAULT_VERIFIER_TIMEOUT_SECONDS: u64 = 5;

#[derive(Clone, Debug)]
pub struct GatewayConfig {
    login_url: String,
    login_path: String,
    logout_path: String,
    session_cookie_name: String,
    session_ttl_seconds: i64,
    verifier_timeout_seconds: u64,
}

impl GatewayConfig {
    /// Create a configuration redirecting interactive callers to `login_url`.
    ///
    /// The login endpoint path is derived from the URL so that a relative
    /// login URL (`/login`) and an absolute one
    /// (`https://sso.example.com/login`) both classify submissions correctly.
    #[must_use]
    pub fn new(login_url: String) -> Self {
        let login_path = url_path(&login_url);
        Self {
            login_url,
            login_path,
            logout_path: DEFAULT_LOGOUT_PATH.to_string(),
            session_cookie_name: DEFAULT_SESSION_COOKIE.to_string(),
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            verifier_timeout_seconds: DEFAULT_VERIFIER_TIMEOUT_SECONDS,
        }
    }

    #[must_use]
    pub fn with_logout_path(mut self, path: String) -> Self {
        self.logout_path = path;
        self
    }

    #[must_use]
    pub fn with_session_cookie_name(mut self, name: String) -> Self {
        self.session_cookie_name = name;
        self
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_verifier_timeout_seconds(mut self, seconds: u64) -> Self {
        self.verifier_timeout_seconds = seconds;
        self
    }

    #[must_use]
    pub fn login_url(&self) -> &str {
        &self.login_url
    }

    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    #[must_use]
    pub fn logout_path(&self) -> &str {
        &self.logout_path
    }

    #[must_use]
    pub fn session_cookie_name(&self) -> &str {
        &self.session_cookie_name
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    #[must_use]
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_seconds.max(0).unsigned_abs())
    }

    #[must_use]
    pub fn verifier_timeout(&self) -> Duration {
        Duration::from_secs(self.verifier_timeout_seconds)
    }

    /// Only mark cookies secure when the login page is served over HTTPS.
    pub(crate) fn session_cookie_secure(&self) -> bool {
        self.login_url.starts_with("https://")
    }
}

/// Extract the path component of a login URL that may be relative.
fn url_path(login_url: &str) -> String {
    if login_url.starts_with('/') {
        let end = login_url
            .find(['?', '#'])
            .unwrap_or(login_url.len());
        return login_url[..end].to_string();
    }
    url::Url::parse(login_url)
        .map(|parsed| parsed.path().to_string())
        .unwrap_or_else(|_| DEFAULT_LOGIN_PATH.to_string())
}
