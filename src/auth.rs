use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::env;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Json},
    http::{request::Parts, StatusCode},
};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde_json::json;

use crate::models::usuario::Entity as Usuario;
use crate::services::ServiceError;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32, // user id
    pub exp: usize,
}

/// Closed role set. Anything else in the column is treated as no access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rol {
    Admin,
    Vendedor,
}

impl Rol {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Rol::Admin),
            "vendedor" => Some(Rol::Vendedor),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rol::Admin => "admin",
            Rol::Vendedor => "vendedor",
        }
    }
}

/// Identity resolved from the bearer token, attached to each request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: Rol,
}

impl AuthUser {
    /// Role whitelist check for privileged routes.
    pub fn autorizar(&self, roles: &[Rol]) -> Result<(), ServiceError> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(ServiceError::Prohibido(format!(
                "El rol {} no tiene permiso para acceder a este recurso",
                self.role.as_str()
            )))
        }
    }
}

fn unauthorized(message: &str) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "success": false, "message": message })),
    )
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    DatabaseConnection: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| unauthorized("No se proporcionó token de autenticación"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| unauthorized("No se proporcionó token de autenticación"))?;

        let claims = decode_jwt(token).map_err(|_| unauthorized("Token no válido"))?;

        let db = DatabaseConnection::from_ref(state);
        let user = Usuario::find_by_id(claims.sub)
            .one(&db)
            .await
            .map_err(|e| {
                tracing::error!("Failed to load user {}: {}", claims.sub, e);
                unauthorized("Token no válido")
            })?
            .ok_or_else(|| unauthorized("Usuario no autorizado o inactivo"))?;

        if !user.activo {
            return Err(unauthorized("Usuario no autorizado o inactivo"));
        }

        let role = Rol::parse(&user.role)
            .ok_or_else(|| unauthorized("Usuario no autorizado o inactivo"))?;

        Ok(AuthUser {
            id: user.id,
            name: user.name,
            email: user.email,
            role,
        })
    }
}

pub fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| e.to_string())?
        .to_string();
    Ok(password_hash)
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, String> {
    let parsed_hash = PasswordHash::new(password_hash).map_err(|e| e.to_string())?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

fn get_jwt_secret() -> String {
    env::var("JWT_SECRET").unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "secret".to_string()
        } else {
            panic!("JWT_SECRET environment variable must be set in production");
        }
    })
}

pub fn create_jwt(user_id: i32) -> Result<String, String> {
    let secret = get_jwt_secret();
    let expiration = Utc::now()
        .checked_add_signed(Duration::days(30))
        .expect("valid timestamp")
        .timestamp();

    let claims = Claims {
        sub: user_id,
        exp: expiration as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| e.to_string())
}

pub fn decode_jwt(token: &str) -> Result<Claims, String> {
    let secret = get_jwt_secret();
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}
