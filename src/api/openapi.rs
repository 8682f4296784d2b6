//! OpenAPI document for the documented routes. Served at `/openapi.json`.

use utoipa::OpenApi;

use super::handlers::{gate, health};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "tessera",
        description = "Token-based authentication gateway",
    ),
    paths(health::health, gate::login, gate::logout, gate::session),
    components(schemas(gate::LoginRequest, health::Health)),
    tags(
        (name = "auth", description = "Login, logout, and session endpoints"),
        (name = "health", description = "Liveness")
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
