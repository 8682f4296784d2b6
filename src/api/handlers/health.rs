use axum::{
    extract::Extension,
    http::Method,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::gateway::Gateway;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Health {
    name: String,
    version: String,
    active_sessions: usize,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Gateway is serving requests", body = Health)
    ),
    tag = "health"
)]
// axum handler for health
pub async fn health(method: Method, gateway: Extension<Arc<Gateway>>) -> impl IntoResponse {
    let health = Health {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        active_sessions: gateway.token_store().active_sessions().await,
    };

    // OPTIONS preflight gets headers only.
    if method == Method::OPTIONS {
        return ().into_response();
    }
    Json(health).into_response()
}
