use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::json;

use crate::api::error_response;
use crate::auth::{AuthUser, Rol};
use crate::services::producto_service::{self, ProductoFilter, ProductoInput};
use crate::services::{PageParams, ServiceError};

#[derive(Debug, Deserialize)]
pub struct ListProductosQuery {
    pub categoria: Option<i32>,
    pub estado: Option<String>,
    pub stock_bajo: Option<String>,
    pub search: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// Allow-listed request body for create/update
#[derive(Debug, Deserialize)]
pub struct ProductoRequest {
    pub categoria_id: Option<i32>,
    pub codigo: Option<String>,
    pub nombre: Option<String>,
    pub descripcion: Option<String>,
    pub precio_compra: Option<f64>,
    pub precio_venta: Option<f64>,
    pub stock: Option<i32>,
    pub stock_minimo: Option<i32>,
    pub imagen: Option<String>,
    pub estado: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct StockRequest {
    pub cantidad: Option<i32>,
    pub operacion: Option<String>,
}

fn build_input(req: ProductoRequest) -> Result<ProductoInput, ServiceError> {
    let mut errores = Vec::new();
    if req.categoria_id.is_none() {
        errores.push("La categoría es requerida".to_string());
    }
    if req.precio_compra.is_none() {
        errores.push("El precio de compra es requerido".to_string());
    }
    if req.precio_venta.is_none() {
        errores.push("El precio de venta es requerido".to_string());
    }
    if !errores.is_empty() {
        return Err(ServiceError::Validacion(errores));
    }

    Ok(ProductoInput {
        categoria_id: req.categoria_id.unwrap_or_default(),
        codigo: req.codigo.unwrap_or_default(),
        nombre: req.nombre.unwrap_or_default(),
        descripcion: req.descripcion,
        precio_compra: req.precio_compra.unwrap_or_default(),
        precio_venta: req.precio_venta.unwrap_or_default(),
        stock: req.stock,
        stock_minimo: req.stock_minimo,
        imagen: req.imagen,
        estado: req.estado,
    })
}

/// GET /api/productos
pub async fn list_productos(
    _usuario: AuthUser,
    State(db): State<DatabaseConnection>,
    Query(params): Query<ListProductosQuery>,
) -> impl IntoResponse {
    let filter = ProductoFilter {
        categoria: params.categoria,
        estado: params.estado.as_deref().map(|e| e == "true"),
        stock_bajo: params.stock_bajo.as_deref() == Some("true"),
        search: params.search,
    };
    let page = PageParams::new(params.page, params.limit);

    match producto_service::list_productos(&db, filter, page).await {
        Ok((data, pagination)) => (
            StatusCode::OK,
            Json(json!({ "success": true, "data": data, "pagination": pagination })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /api/productos/:id
pub async fn get_producto(
    _usuario: AuthUser,
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    match producto_service::get_producto(&db, id).await {
        Ok(producto) => (
            StatusCode::OK,
            Json(json!({ "success": true, "data": producto })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /api/productos (admin)
pub async fn create_producto(
    usuario: AuthUser,
    State(db): State<DatabaseConnection>,
    Json(payload): Json<ProductoRequest>,
) -> impl IntoResponse {
    if let Err(e) = usuario.autorizar(&[Rol::Admin]) {
        return error_response(e);
    }

    let input = match build_input(payload) {
        Ok(input) => input,
        Err(e) => return error_response(e),
    };

    match producto_service::create_producto(&db, input).await {
        Ok(producto) => (
            StatusCode::CREATED,
            Json(json!({ "success": true, "data": producto })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// PUT /api/productos/:id (admin)
pub async fn update_producto(
    usuario: AuthUser,
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
    Json(payload): Json<ProductoRequest>,
) -> impl IntoResponse {
    if let Err(e) = usuario.autorizar(&[Rol::Admin]) {
        return error_response(e);
    }

    let input = match build_input(payload) {
        Ok(input) => input,
        Err(e) => return error_response(e),
    };

    match producto_service::update_producto(&db, id, input).await {
        Ok(producto) => (
            StatusCode::OK,
            Json(json!({ "success": true, "data": producto })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// DELETE /api/productos/:id (admin)
pub async fn delete_producto(
    usuario: AuthUser,
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    if let Err(e) = usuario.autorizar(&[Rol::Admin]) {
        return error_response(e);
    }

    match producto_service::delete_producto(&db, id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "success": true, "data": {} })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// PATCH /api/productos/:id/stock (any authenticated role)
pub async fn update_stock(
    _usuario: AuthUser,
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
    Json(payload): Json<StockRequest>,
) -> impl IntoResponse {
    let (cantidad, operacion) = match (payload.cantidad, payload.operacion) {
        (Some(c), Some(o)) => (c, o),
        _ => {
            return error_response(ServiceError::Validacion(vec![
                "Se requiere cantidad y operación (sumar o restar)".to_string(),
            ]));
        }
    };

    match producto_service::ajustar_stock(&db, id, cantidad, &operacion).await {
        Ok(producto) => (
            StatusCode::OK,
            Json(json!({ "success": true, "data": producto })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}
