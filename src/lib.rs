//! # Tessera (Token-Based Authentication Gateway)
//!
//! `tessera` fronts an application with opaque-token authentication backed by
//! a secondary verification factor (face recognition).
//!
//! ## Sessions
//!
//! A successful login issues an opaque random token. The gateway keeps only a
//! SHA-256 digest of each issued token; the raw value travels to the client in
//! a session cookie (or may be replayed as a bearer token) and is hashed again
//! on every lookup. Tokens expire after a configurable TTL and are revoked on
//! logout.
//!
//! ## Login (face verification)
//!
//! Credential submissions carry a principal id and a face assertion. The
//! assertion is checked against a pluggable [`gateway::SecondaryVerifier`]: a
//! remote face-recognition service in production, an allow-all stand-in for
//! development. A request that already carries a live token skips verification.
//!
//! ## Responses
//!
//! Every decision renders to a fixed JSON envelope (`success`/`message` or
//! `success`/`data`). Browser traffic is told apart from AJAX callers: the
//! former is redirected to the login page with a `redirect_to` parameter, the
//! latter receives `401` JSON.

pub mod api;
pub mod cli;
pub mod gateway;

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
