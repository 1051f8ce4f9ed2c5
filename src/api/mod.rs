pub mod auth;
pub mod categorias;
pub mod clientes;
pub mod health;
pub mod productos;
pub mod ventas;

use axum::{
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
    Json, Router,
};
use sea_orm::DatabaseConnection;
use serde_json::json;

use crate::services::ServiceError;

pub fn api_router(db: DatabaseConnection) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Auth
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/auth/me", get(auth::get_me))
        .route("/auth/updateprofile", put(auth::update_profile))
        .route("/auth/updatepassword", put(auth::update_password))
        // Categorias
        .route(
            "/categorias",
            get(categorias::list_categorias).post(categorias::create_categoria),
        )
        .route(
            "/categorias/:id",
            get(categorias::get_categoria)
                .put(categorias::update_categoria)
                .delete(categorias::delete_categoria),
        )
        // Clientes
        .route(
            "/clientes",
            get(clientes::list_clientes).post(clientes::create_cliente),
        )
        .route("/clientes/buscar/:documento", get(clientes::buscar_por_documento))
        .route(
            "/clientes/:id",
            get(clientes::get_cliente)
                .put(clientes::update_cliente)
                .delete(clientes::delete_cliente),
        )
        // Productos
        .route(
            "/productos",
            get(productos::list_productos).post(productos::create_producto),
        )
        .route(
            "/productos/:id",
            get(productos::get_producto)
                .put(productos::update_producto)
                .delete(productos::delete_producto),
        )
        .route("/productos/:id/stock", patch(productos::update_stock))
        // Ventas
        .route("/ventas", get(ventas::list_ventas).post(ventas::create_venta))
        .route("/ventas/stats/dashboard", get(ventas::get_estadisticas))
        .route("/ventas/numero/:numero", get(ventas::get_venta_por_numero))
        .route("/ventas/:id", get(ventas::get_venta))
        .route("/ventas/:id/anular", put(ventas::anular_venta))
        .with_state(db)
}

/// Map a service failure to the `{success: false, message}` envelope
pub fn error_response(err: ServiceError) -> Response {
    let status = match &err {
        ServiceError::Validacion(_)
        | ServiceError::Conflicto(_)
        | ServiceError::StockInsuficiente(_)
        | ServiceError::VentaYaAnulada
        | ServiceError::OperacionInvalida(_) => StatusCode::BAD_REQUEST,
        ServiceError::NoAutorizado(_) => StatusCode::UNAUTHORIZED,
        ServiceError::Prohibido(_) => StatusCode::FORBIDDEN,
        ServiceError::NoEncontrado(_) => StatusCode::NOT_FOUND,
        ServiceError::Database(msg) => {
            tracing::error!("Database error: {}", msg);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (
        status,
        Json(json!({ "success": false, "message": err.to_string() })),
    )
        .into_response()
}

/// Fallback for unknown routes
pub async fn ruta_no_encontrada(uri: Uri) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "message": format!("Ruta no encontrada: {}", uri.path())
        })),
    )
        .into_response()
}
