pub mod rest;
pub mod state;

// Re-export the pieces the server binary and the tests assemble.
pub use rest::ApiDoc;
pub use state::AppState;

use axum::http::HeaderValue;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Builds the complete application router: the habit routes, a CORS layer
/// permitting exactly one origin (all methods, all headers), and the
/// Swagger UI. Constructed explicitly here so the server binary and the
/// integration tests assemble the same application.
pub fn app_router(app_state: Arc<AppState>, allowed_origin: HeaderValue) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(allowed_origin)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_router = rest::router().layer(cors).with_state(app_state);

    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
