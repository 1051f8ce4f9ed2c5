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
use crate::services::venta_service::{self, VentaFilter, VentaInput, VentaItemInput};
use crate::services::{PageParams, ServiceError};

#[derive(Debug, Deserialize)]
pub struct ListVentasQuery {
    pub fecha_inicio: Option<String>,
    pub fecha_fin: Option<String>,
    pub cliente: Option<i32>,
    pub usuario: Option<i32>,
    pub metodo_pago: Option<String>,
    pub estado: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct VentaItemRequest {
    pub producto: Option<i32>,
    pub cantidad: Option<i32>,
    pub precio_unitario: Option<f64>,
    pub descuento: Option<f64>,
}

/// Request body for creating a sale
#[derive(Debug, Deserialize)]
pub struct CreateVentaRequest {
    pub cliente: Option<i32>,
    pub items: Option<Vec<VentaItemRequest>>,
    pub metodo_pago: Option<String>,
    pub observaciones: Option<String>,
}

fn build_input(req: CreateVentaRequest) -> Result<VentaInput, ServiceError> {
    let items = req.items.unwrap_or_default();
    if items.is_empty() {
        return Err(ServiceError::Validacion(vec![
            "La venta debe tener al menos un producto".to_string(),
        ]));
    }

    let mut lineas = Vec::with_capacity(items.len());
    for item in items {
        let (producto, cantidad, precio_unitario) =
            match (item.producto, item.cantidad, item.precio_unitario) {
                (Some(p), Some(c), Some(pu)) => (p, c, pu),
                _ => {
                    return Err(ServiceError::Validacion(vec![
                        "Cada item requiere producto, cantidad y precio_unitario".to_string(),
                    ]));
                }
            };
        lineas.push(VentaItemInput {
            producto,
            cantidad,
            precio_unitario,
            descuento: item.descuento.unwrap_or(0.0),
        });
    }

    Ok(VentaInput {
        cliente: req.cliente,
        items: lineas,
        metodo_pago: req.metodo_pago.unwrap_or_default(),
        observaciones: req.observaciones,
    })
}

/// GET /api/ventas
pub async fn list_ventas(
    _usuario: AuthUser,
    State(db): State<DatabaseConnection>,
    Query(params): Query<ListVentasQuery>,
) -> impl IntoResponse {
    let filter = VentaFilter {
        fecha_inicio: params.fecha_inicio,
        fecha_fin: params.fecha_fin,
        cliente: params.cliente,
        usuario: params.usuario,
        metodo_pago: params.metodo_pago,
        estado: params.estado,
    };
    let page = PageParams::new(params.page, params.limit);

    match venta_service::listar_ventas(&db, filter, page).await {
        Ok((data, pagination)) => (
            StatusCode::OK,
            Json(json!({ "success": true, "data": data, "pagination": pagination })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /api/ventas/:id
pub async fn get_venta(
    _usuario: AuthUser,
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    match venta_service::obtener_venta(&db, id).await {
        Ok(venta) => (
            StatusCode::OK,
            Json(json!({ "success": true, "data": venta })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /api/ventas/numero/:numero
pub async fn get_venta_por_numero(
    _usuario: AuthUser,
    State(db): State<DatabaseConnection>,
    Path(numero): Path<String>,
) -> impl IntoResponse {
    match venta_service::obtener_por_numero(&db, &numero).await {
        Ok(venta) => (
            StatusCode::OK,
            Json(json!({ "success": true, "data": venta })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /api/ventas (any authenticated role)
pub async fn create_venta(
    usuario: AuthUser,
    State(db): State<DatabaseConnection>,
    Json(payload): Json<CreateVentaRequest>,
) -> impl IntoResponse {
    let input = match build_input(payload) {
        Ok(input) => input,
        Err(e) => return error_response(e),
    };

    match venta_service::crear_venta(&db, usuario.id, input).await {
        Ok(venta) => (
            StatusCode::CREATED,
            Json(json!({ "success": true, "data": venta })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// PUT /api/ventas/:id/anular (admin)
pub async fn anular_venta(
    usuario: AuthUser,
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    if let Err(e) = usuario.autorizar(&[Rol::Admin]) {
        return error_response(e);
    }

    match venta_service::anular_venta(&db, id).await {
        Ok(venta) => (
            StatusCode::OK,
            Json(json!({ "success": true, "data": venta })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /api/ventas/stats/dashboard
pub async fn get_estadisticas(
    _usuario: AuthUser,
    State(db): State<DatabaseConnection>,
) -> impl IntoResponse {
    match venta_service::estadisticas(&db).await {
        Ok(stats) => (
            StatusCode::OK,
            Json(json!({ "success": true, "data": stats })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}
