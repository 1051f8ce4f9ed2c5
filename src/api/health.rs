use axum::Json;
use serde_json::{json, Value};

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "lennin-pos",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Unauthenticated welcome route at /
pub async fn bienvenida() -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "API de Sistema de Ventas LENNIN S.A.C",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
