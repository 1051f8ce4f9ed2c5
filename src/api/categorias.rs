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
use crate::services::categoria_service::{self, CategoriaFilter, CategoriaInput};
use crate::services::PageParams;

#[derive(Debug, Deserialize)]
pub struct ListCategoriasQuery {
    pub estado: Option<String>,
    pub search: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// Allow-listed request body for create/update
#[derive(Debug, Deserialize)]
pub struct CategoriaRequest {
    pub nombre: Option<String>,
    pub descripcion: Option<String>,
    pub estado: Option<bool>,
}

impl From<CategoriaRequest> for CategoriaInput {
    fn from(req: CategoriaRequest) -> Self {
        CategoriaInput {
            nombre: req.nombre.unwrap_or_default(),
            descripcion: req.descripcion,
            estado: req.estado,
        }
    }
}

/// GET /api/categorias
pub async fn list_categorias(
    _usuario: AuthUser,
    State(db): State<DatabaseConnection>,
    Query(params): Query<ListCategoriasQuery>,
) -> impl IntoResponse {
    let filter = CategoriaFilter {
        estado: params.estado.as_deref().map(|e| e == "true"),
        search: params.search,
    };
    let page = PageParams::new(params.page, params.limit);

    match categoria_service::list_categorias(&db, filter, page).await {
        Ok((data, pagination)) => (
            StatusCode::OK,
            Json(json!({ "success": true, "data": data, "pagination": pagination })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /api/categorias/:id
pub async fn get_categoria(
    _usuario: AuthUser,
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    match categoria_service::get_categoria(&db, id).await {
        Ok(categoria) => (
            StatusCode::OK,
            Json(json!({ "success": true, "data": categoria })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /api/categorias (admin)
pub async fn create_categoria(
    usuario: AuthUser,
    State(db): State<DatabaseConnection>,
    Json(payload): Json<CategoriaRequest>,
) -> impl IntoResponse {
    if let Err(e) = usuario.autorizar(&[Rol::Admin]) {
        return error_response(e);
    }

    match categoria_service::create_categoria(&db, payload.into()).await {
        Ok(categoria) => (
            StatusCode::CREATED,
            Json(json!({ "success": true, "data": categoria })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// PUT /api/categorias/:id (admin)
pub async fn update_categoria(
    usuario: AuthUser,
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
    Json(payload): Json<CategoriaRequest>,
) -> impl IntoResponse {
    if let Err(e) = usuario.autorizar(&[Rol::Admin]) {
        return error_response(e);
    }

    match categoria_service::update_categoria(&db, id, payload.into()).await {
        Ok(categoria) => (
            StatusCode::OK,
            Json(json!({ "success": true, "data": categoria })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// DELETE /api/categorias/:id (admin)
pub async fn delete_categoria(
    usuario: AuthUser,
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    if let Err(e) = usuario.autorizar(&[Rol::Admin]) {
        return error_response(e);
    }

    match categoria_service::delete_categoria(&db, id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "success": true, "data": {} })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}
