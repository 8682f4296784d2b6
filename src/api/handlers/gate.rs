//! HTTP adaptation for the gateway: cookie/bearer extraction, AJAX
//! detection, and the login/logout/session/guard handlers.

use axum::{
    extract::Extension,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
        HeaderMap, HeaderValue, Method, StatusCode, Uri,
    },
    response::{IntoResponse, Json, Response},
    Json as JsonBody,
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use crate::gateway::{AuthRequest, Credential, Gateway, RenderedResponse, ResponseKind};

/// Login submission body: the claimed subject and a base64 assertion from
/// the face-capture client.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub userid: String,
    pub assertion: String,
}

impl IntoResponse for RenderedResponse {
    fn into_response(self) -> Response {
        let mut response = match self.kind {
            ResponseKind::Json(body) => {
                let mut response = (self.status, Json(body)).into_response();
                // The envelope contract pins the charset; axum's `Json`
                // emits bare `application/json`.
                response.headers_mut().insert(
                    CONTENT_TYPE,
                    HeaderValue::from_static("application/json; charset=utf-8"),
                );
                response
            }
            // 302, not `Redirect::to`'s 303: interactive denials are plain
            // "go log in" redirects.
            ResponseKind::Redirect { location } => match HeaderValue::from_str(&location) {
                Ok(value) => {
                    let mut response = self.status.into_response();
                    response.headers_mut().insert(LOCATION, value);
                    response
                }
                Err(err) => {
                    error!("Failed to build redirect location header: {err}");
                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                }
            },
        };
        if let Some(cookie) = &self.set_cookie {
            match HeaderValue::from_str(cookie) {
                Ok(value) => {
                    response.headers_mut().insert(SET_COOKIE, value);
                }
                Err(err) => {
                    error!("Failed to build session cookie header: {err}");
                }
            }
        }
        response
    }
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated; session cookie set"),
        (status = 400, description = "Not a login submission"),
        (status = 401, description = "Credential rejected")
    ),
    tag = "auth"
)]
pub async fn login(
    gateway: Extension<Arc<Gateway>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    payload: Option<JsonBody<LoginRequest>>,
) -> Response {
    let mut request = adapt_request(&gateway, method, &uri, &headers);
    if let Some(JsonBody(body)) = payload {
        match decode_assertion(&body.assertion) {
            Ok(assertion) => {
                request = request.with_credential(Credential::Face {
                    principal_id: body.userid,
                    assertion,
                });
            }
            Err(message) => {
                return RenderedResponse::json(
                    StatusCode::BAD_REQUEST,
                    json!({"success": false, "message": message}),
                )
                .into_response();
            }
        }
    }
    gateway.handle(&request).await.into_response()
}

#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 302, description = "Session revoked; redirect to login"),
        (status = 400, description = "Logout requires POST")
    ),
    tag = "auth"
)]
pub async fn logout(
    gateway: Extension<Arc<Gateway>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let request = adapt_request(&gateway, method, &uri, &headers);
    gateway.handle(&request).await.into_response()
}

#[utoipa::path(
    get,
    path = "/session",
    responses(
        (status = 200, description = "Session is active"),
        (status = 401, description = "No active session")
    ),
    tag = "auth"
)]
pub async fn session(
    gateway: Extension<Arc<Gateway>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let request = adapt_request(&gateway, method, &uri, &headers);
    gateway.handle(&request).await.into_response()
}

/// Fallback for every unmatched path: all of them are protected resources.
pub async fn guard(
    gateway: Extension<Arc<Gateway>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let request = adapt_request(&gateway, method, &uri, &headers);
    gateway.handle(&request).await.into_response()
}

fn adapt_request(
    gateway: &Gateway,
    method: Method,
    uri: &Uri,
    headers: &HeaderMap,
) -> AuthRequest {
    let mut request = AuthRequest::new(method, uri.path()).with_ajax(is_ajax_request(headers));
    if let Some(token) = extract_session_token(headers, gateway.config().session_cookie_name()) {
        request = request.with_token(token);
    }
    request
}

fn decode_assertion(value: &str) -> Result<Vec<u8>, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("Missing assertion payload".to_string());
    }
    base64::engine::general_purpose::STANDARD
        .decode(trimmed)
        .map_err(|_| "Invalid base64 assertion".to_string())
}

/// Programmatic callers announce themselves with `X-Requested-With` or by
/// preferring JSON.
fn is_ajax_request(headers: &HeaderMap) -> bool {
    let requested_with = headers
        .get("x-requested-with")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.eq_ignore_ascii_case("XMLHttpRequest"));
    if requested_with {
        return true;
    }
    headers
        .get(ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("application/json"))
}

fn extract_session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    if let Some(token) = extract_bearer_token(headers) {
        return Some(token);
    }
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == cookie_name {
            return Some(val.to_string());
        }
    }
    None
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
