use crate::gateway::Gateway;
use anyhow::Result;
use axum::{
    body::Body,
    extract::{Extension, MatchedPath},
    http::{HeaderName, HeaderValue, Request},
    response::Json,
    routing::{any, get},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;

pub(crate) mod handlers;
// OpenAPI document generation lives in openapi.rs.
mod openapi;

pub use openapi::openapi;

/// Build the gateway router: documented endpoints plus a fallback guard so
/// every unmatched path goes through the authentication decision.
#[must_use]
pub fn router(gateway: Arc<Gateway>) -> Router {
    let config = gateway.config().clone();
    Router::new()
        .route("/health", get(handlers::health::health).options(handlers::health::health))
        .route("/openapi.json", get(openapi_json))
        .route(config.login_path(), any(handlers::gate::login))
        .route(config.logout_path(), any(handlers::gate::logout))
        .route("/session", get(handlers::gate::session))
        .fallback(handlers::gate::guard)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(gateway)),
        )
}

/// Bind the listener and serve the gateway until ctrl-c.
///
/// # Errors
/// Returns an error if the port cannot be bound or the server fails.
pub async fn serve(port: u16, gateway: Arc<Gateway>) -> Result<()> {
    let login_url = gateway.config().login_url().to_string();
    let app = router(gateway);

    let listener = TcpListener::bind(("::", port)).await?;
    let addr = listener.local_addr()?;

    info!(%addr, login_url, "Authentication gateway ready");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Draining connections before shutdown");
        })
        .await?;

    Ok(())
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(openapi::openapi())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    // Mirror the dispatcher's caller classification so denial logs line up
    // with the response kind the caller will see.
    let ajax = request
        .headers()
        .get("x-requested-with")
        .and_then(|val| val.to_str().ok())
        .is_some_and(|val| val.eq_ignore_ascii_case("XMLHttpRequest"));
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "gateway.request",
        http.method = %request.method(),
        http.route = route,
        ajax,
        request_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{AllowAllVerifier, GatewayConfig, Principal, StaticDirectory};
    use axum::http::{Method, StatusCode};
    use tower::ServiceExt;

    fn test_gateway() -> Arc<Gateway> {
        let alice = Principal {
            user_id: "u1".to_string(),
            user_key: "k1".to_string(),
            username: "alice".to_string(),
            roles: vec!["admin".to_string()],
            permissions: vec!["admin".to_string()],
        };
        Arc::new(Gateway::new(
            GatewayConfig::new("/login".to_string()),
            Arc::new(StaticDirectory::new(vec![alice])),
            Arc::new(AllowAllVerifier),
        ))
    }

    fn request(method: Method, path: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .expect("request")
    }

    #[tokio::test]
    async fn health_is_open() {
        let app = router(test_gateway());
        let response = app.oneshot(request(Method::GET, "/health")).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unmatched_paths_hit_the_guard() {
        let app = router(test_gateway());
        let response = app
            .oneshot(request(Method::GET, "/secure/data"))
            .await
            .expect("response");
        // Interactive caller: redirected to the login page.
        assert_eq!(response.status(), StatusCode::FOUND);
        let location = response
            .headers()
            .get("location")
            .and_then(|value| value.to_str().ok())
            .expect("location header");
        assert!(location.starts_with("/login?redirect_to="));
    }

    #[tokio::test]
    async fn get_login_is_a_bad_request() {
        let app = router(test_gateway());
        let response = app.oneshot(request(Method::GET, "/login")).await.expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn requests_carry_a_request_id() {
        let app = router(test_gateway());
        let response = app.oneshot(request(Method::GET, "/health")).await.expect("response");
        assert!(response.headers().contains_key("x-request-id"));
    }
}
