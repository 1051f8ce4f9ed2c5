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
use crate::services::cliente_service::{self, ClienteFilter, ClienteInput};
use crate::services::PageParams;

#[derive(Debug, Deserialize)]
pub struct ListClientesQuery {
    pub tipo_documento: Option<String>,
    pub estado: Option<String>,
    pub search: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// Allow-listed request body for create/update
#[derive(Debug, Deserialize)]
pub struct ClienteRequest {
    pub tipo_documento: Option<String>,
    pub numero_documento: Option<String>,
    pub nombres: Option<String>,
    pub apellidos: Option<String>,
    pub telefono: Option<String>,
    pub email: Option<String>,
    pub direccion: Option<String>,
    pub estado: Option<bool>,
}

impl From<ClienteRequest> for ClienteInput {
    fn from(req: ClienteRequest) -> Self {
        ClienteInput {
            tipo_documento: req.tipo_documento.unwrap_or_default(),
            numero_documento: req.numero_documento.unwrap_or_default(),
            nombres: req.nombres.unwrap_or_default(),
            apellidos: req.apellidos.unwrap_or_default(),
            telefono: req.telefono,
            email: req.email,
            direccion: req.direccion,
            estado: req.estado,
        }
    }
}

/// GET /api/clientes
pub async fn list_clientes(
    _usuario: AuthUser,
    State(db): State<DatabaseConnection>,
    Query(params): Query<ListClientesQuery>,
) -> impl IntoResponse {
    let filter = ClienteFilter {
        tipo_documento: params.tipo_documento,
        estado: params.estado.as_deref().map(|e| e == "true"),
        search: params.search,
    };
    let page = PageParams::new(params.page, params.limit);

    match cliente_service::list_clientes(&db, filter, page).await {
        Ok((data, pagination)) => (
            StatusCode::OK,
            Json(json!({ "success": true, "data": data, "pagination": pagination })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /api/clientes/:id
pub async fn get_cliente(
    _usuario: AuthUser,
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    match cliente_service::get_cliente(&db, id).await {
        Ok(cliente) => (
            StatusCode::OK,
            Json(json!({ "success": true, "data": cliente })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /api/clientes/buscar/:documento
pub async fn buscar_por_documento(
    _usuario: AuthUser,
    State(db): State<DatabaseConnection>,
    Path(documento): Path<String>,
) -> impl IntoResponse {
    match cliente_service::buscar_por_documento(&db, &documento).await {
        Ok(cliente) => (
            StatusCode::OK,
            Json(json!({ "success": true, "data": cliente })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /api/clientes (any authenticated role)
pub async fn create_cliente(
    _usuario: AuthUser,
    State(db): State<DatabaseConnection>,
    Json(payload): Json<ClienteRequest>,
) -> impl IntoResponse {
    match cliente_service::create_cliente(&db, payload.into()).await {
        Ok(cliente) => (
            StatusCode::CREATED,
            Json(json!({ "success": true, "data": cliente })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// PUT /api/clientes/:id (any authenticated role)
pub async fn update_cliente(
    _usuario: AuthUser,
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
    Json(payload): Json<ClienteRequest>,
) -> impl IntoResponse {
    match cliente_service::update_cliente(&db, id, payload.into()).await {
        Ok(cliente) => (
            StatusCode::OK,
            Json(json!({ "success": true, "data": cliente })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// DELETE /api/clientes/:id (admin)
pub async fn delete_cliente(
    usuario: AuthUser,
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    if let Err(e) = usuario.autorizar(&[Rol::Admin]) {
        return error_response(e);
    }

    match cliente_service::delete_cliente(&db, id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "success": true, "data": {} })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}
