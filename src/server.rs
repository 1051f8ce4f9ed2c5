// Server module - builds the full application router.
// Used by main.rs and by the integration tests.

use axum::{routing::get, Router};
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api;

/// Build the application router with CORS, request tracing and the 404 fallback.
/// An empty origin list means any origin is allowed.
pub fn build_router(db: DatabaseConnection, cors_allowed_origins: &[String]) -> Router {
    let cors = if cors_allowed_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let mut origins = Vec::new();
        for origin in cors_allowed_origins {
            match origin.parse::<axum::http::HeaderValue>() {
                Ok(v) => origins.push(v),
                Err(e) => tracing::error!("Failed to parse CORS origin '{}': {}", origin, e),
            }
        }
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .route("/", get(api::health::bienvenida))
        .nest("/api", api::api_router(db))
        .fallback(api::ruta_no_encontrada)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
