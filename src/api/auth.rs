use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::Deserialize;
use serde_json::json;

use crate::api::error_response;
use crate::auth::{create_jwt, hash_password, verify_password, AuthUser, Rol};
use crate::models::usuario::{self, Entity as Usuario};
use crate::services::ServiceError;

#[derive(Deserialize)]
pub struct LoginRequest {
    email: Option<String>,
    password: Option<String>,
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
    role: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    name: Option<String>,
    email: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdatePasswordRequest {
    password_actual: Option<String>,
    password_nuevo: Option<String>,
}

fn perfil_con_token(user: &usuario::Model) -> Result<serde_json::Value, ServiceError> {
    let token = create_jwt(user.id).map_err(ServiceError::Database)?;
    Ok(json!({
        "id": user.id,
        "name": user.name,
        "email": user.email,
        "role": user.role,
        "token": token
    }))
}

/// POST /api/auth/login
pub async fn login(
    State(db): State<DatabaseConnection>,
    Json(payload): Json<LoginRequest>,
) -> impl IntoResponse {
    let (email, password) = match (payload.email, payload.password) {
        (Some(e), Some(p)) if !e.is_empty() && !p.is_empty() => (e, p),
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "success": false,
                    "message": "Por favor proporcione email y contraseña"
                })),
            )
                .into_response();
        }
    };

    tracing::info!("Login attempt for {}", email);

    let user = match Usuario::find()
        .filter(usuario::Column::Email.eq(email.to_lowercase()))
        .one(&db)
        .await
    {
        Ok(Some(u)) => u,
        Ok(None) => {
            tracing::warn!("User not found: {}", email);
            return error_response(ServiceError::NoAutorizado(
                "Credenciales inválidas".to_string(),
            ));
        }
        Err(e) => return error_response(ServiceError::from(e)),
    };

    if !user.activo {
        tracing::warn!("Inactive user attempted login: {}", email);
        return error_response(ServiceError::NoAutorizado(
            "Usuario inactivo. Contacte al administrador".to_string(),
        ));
    }

    match verify_password(&password, &user.password) {
        Ok(true) => {}
        _ => {
            tracing::warn!("Password verification failed for {}", email);
            return error_response(ServiceError::NoAutorizado(
                "Credenciales inválidas".to_string(),
            ));
        }
    }

    match perfil_con_token(&user) {
        Ok(data) => (
            StatusCode::OK,
            Json(json!({ "success": true, "data": data })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /api/auth/register (admin only)
pub async fn register(
    usuario_actual: AuthUser,
    State(db): State<DatabaseConnection>,
    Json(payload): Json<RegisterRequest>,
) -> impl IntoResponse {
    if let Err(e) = usuario_actual.autorizar(&[Rol::Admin]) {
        return error_response(e);
    }

    let mut errores = Vec::new();
    let name = payload.name.unwrap_or_default();
    let email = payload.email.unwrap_or_default().trim().to_lowercase();
    let password = payload.password.unwrap_or_default();
    let role = payload.role.unwrap_or_else(|| "vendedor".to_string());

    if name.trim().is_empty() {
        errores.push("El nombre es requerido".to_string());
    } else if name.len() > 100 {
        errores.push("El nombre no puede exceder 100 caracteres".to_string());
    }
    if email.is_empty() || !email.contains('@') {
        errores.push("Por favor ingrese un email válido".to_string());
    }
    if password.len() < 6 {
        errores.push("La contraseña debe tener al menos 6 caracteres".to_string());
    }
    if Rol::parse(&role).is_none() {
        errores.push(format!("{} no es un rol válido", role));
    }
    if !errores.is_empty() {
        return error_response(ServiceError::Validacion(errores));
    }

    match Usuario::find()
        .filter(usuario::Column::Email.eq(email.clone()))
        .one(&db)
        .await
    {
        Ok(Some(_)) => {
            return error_response(ServiceError::Conflicto("El usuario ya existe".to_string()));
        }
        Ok(None) => {}
        Err(e) => return error_response(ServiceError::from(e)),
    }

    let password_hash = match hash_password(&password) {
        Ok(h) => h,
        Err(e) => return error_response(ServiceError::Database(e)),
    };

    let now = chrono::Utc::now().to_rfc3339();
    let nuevo = usuario::ActiveModel {
        name: Set(name.trim().to_string()),
        email: Set(email),
        password: Set(password_hash),
        role: Set(role),
        activo: Set(true),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };

    match nuevo.insert(&db).await {
        Ok(user) => match perfil_con_token(&user) {
            Ok(data) => (
                StatusCode::CREATED,
                Json(json!({ "success": true, "data": data })),
            )
                .into_response(),
            Err(e) => error_response(e),
        },
        Err(e) => error_response(ServiceError::from(e)),
    }
}

/// GET /api/auth/me
pub async fn get_me(
    usuario_actual: AuthUser,
    State(db): State<DatabaseConnection>,
) -> impl IntoResponse {
    match Usuario::find_by_id(usuario_actual.id).one(&db).await {
        Ok(Some(user)) => (
            StatusCode::OK,
            Json(json!({ "success": true, "data": user })),
        )
            .into_response(),
        Ok(None) => error_response(ServiceError::NoEncontrado(
            "Usuario no encontrado".to_string(),
        )),
        Err(e) => error_response(ServiceError::from(e)),
    }
}

/// PUT /api/auth/updateprofile (allow-listed fields: name, email)
pub async fn update_profile(
    usuario_actual: AuthUser,
    State(db): State<DatabaseConnection>,
    Json(payload): Json<UpdateProfileRequest>,
) -> impl IntoResponse {
    let mut errores = Vec::new();
    let name = payload.name.unwrap_or_default();
    let email = payload.email.unwrap_or_default().trim().to_lowercase();

    if name.trim().is_empty() {
        errores.push("El nombre es requerido".to_string());
    }
    if email.is_empty() || !email.contains('@') {
        errores.push("Por favor ingrese un email válido".to_string());
    }
    if !errores.is_empty() {
        return error_response(ServiceError::Validacion(errores));
    }

    // Another user already holding the email is a conflict
    match Usuario::find()
        .filter(usuario::Column::Email.eq(email.clone()))
        .filter(usuario::Column::Id.ne(usuario_actual.id))
        .one(&db)
        .await
    {
        Ok(Some(_)) => {
            return error_response(ServiceError::Conflicto("El email ya existe".to_string()));
        }
        Ok(None) => {}
        Err(e) => return error_response(ServiceError::from(e)),
    }

    let user = match Usuario::find_by_id(usuario_actual.id).one(&db).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            return error_response(ServiceError::NoEncontrado(
                "Usuario no encontrado".to_string(),
            ));
        }
        Err(e) => return error_response(ServiceError::from(e)),
    };

    let mut active: usuario::ActiveModel = user.into();
    active.name = Set(name.trim().to_string());
    active.email = Set(email);
    active.updated_at = Set(chrono::Utc::now().to_rfc3339());

    match active.update(&db).await {
        Ok(user) => (
            StatusCode::OK,
            Json(json!({ "success": true, "data": user })),
        )
            .into_response(),
        Err(e) => error_response(ServiceError::from(e)),
    }
}

/// PUT /api/auth/updatepassword, re-issues a token on success
pub async fn update_password(
    usuario_actual: AuthUser,
    State(db): State<DatabaseConnection>,
    Json(payload): Json<UpdatePasswordRequest>,
) -> impl IntoResponse {
    let (actual, nuevo) = match (payload.password_actual, payload.password_nuevo) {
        (Some(a), Some(n)) if !a.is_empty() && !n.is_empty() => (a, n),
        _ => {
            return error_response(ServiceError::Validacion(vec![
                "Por favor proporcione la contraseña actual y la nueva".to_string(),
            ]));
        }
    };

    if nuevo.len() < 6 {
        return error_response(ServiceError::Validacion(vec![
            "La contraseña debe tener al menos 6 caracteres".to_string(),
        ]));
    }

    let user = match Usuario::find_by_id(usuario_actual.id).one(&db).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            return error_response(ServiceError::NoEncontrado(
                "Usuario no encontrado".to_string(),
            ));
        }
        Err(e) => return error_response(ServiceError::from(e)),
    };

    match verify_password(&actual, &user.password) {
        Ok(true) => {}
        _ => {
            return error_response(ServiceError::NoAutorizado(
                "Contraseña actual incorrecta".to_string(),
            ));
        }
    }

    let password_hash = match hash_password(&nuevo) {
        Ok(h) => h,
        Err(e) => return error_response(ServiceError::Database(e)),
    };

    let mut active: usuario::ActiveModel = user.into();
    active.password = Set(password_hash);
    active.updated_at = Set(chrono::Utc::now().to_rfc3339());

    match active.update(&db).await {
        Ok(user) => match perfil_con_token(&user) {
            Ok(data) => (
                StatusCode::OK,
                Json(json!({ "success": true, "data": data })),
            )
                .into_response(),
            Err(e) => error_response(e),
        },
        Err(e) => error_response(ServiceError::from(e)),
    }
}
