//! Services Layer
//!
//! Pure business logic extracted from HTTP handlers. Every service takes the
//! database connection explicitly and returns `ServiceError` for the API layer
//! to map to a response.

pub mod categoria_service;
pub mod cliente_service;
pub mod producto_service;
pub mod venta_service;

use serde::Serialize;

/// Error type for service operations
#[derive(Debug)]
pub enum ServiceError {
    /// Field-level validation failures, all collected before failing
    Validacion(Vec<String>),
    NoAutorizado(String),
    Prohibido(String),
    NoEncontrado(String),
    /// Duplicate unique field (document number, product code, email)
    Conflicto(String),
    StockInsuficiente(String),
    VentaYaAnulada,
    OperacionInvalida(String),
    Database(String),
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::Validacion(errores) => write!(f, "{}", errores.join(", ")),
            ServiceError::NoAutorizado(msg) => write!(f, "{}", msg),
            ServiceError::Prohibido(msg) => write!(f, "{}", msg),
            ServiceError::NoEncontrado(msg) => write!(f, "{}", msg),
            ServiceError::Conflicto(msg) => write!(f, "{}", msg),
            ServiceError::StockInsuficiente(msg) => write!(f, "{}", msg),
            ServiceError::VentaYaAnulada => write!(f, "La venta ya está anulada"),
            ServiceError::OperacionInvalida(msg) => write!(f, "{}", msg),
            ServiceError::Database(msg) => write!(f, "{}", msg),
        }
    }
}

impl From<sea_orm::DbErr> for ServiceError {
    fn from(e: sea_orm::DbErr) -> Self {
        let msg = e.to_string();
        // SQLite reports duplicate unique fields as constraint violations
        if msg.contains("UNIQUE constraint failed") {
            ServiceError::Conflicto("El valor ya existe".to_string())
        } else {
            ServiceError::Database(msg)
        }
    }
}

/// Pagination block returned alongside every list
#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub total: u64,
    pub page: u64,
    pub pages: u64,
}

impl Pagination {
    pub fn new(total: u64, page: u64, limit: u64) -> Self {
        let pages = if limit == 0 { 0 } else { total.div_ceil(limit) };
        Self { total, page, pages }
    }
}

/// Page/limit query parameters, normalized (1-based page, limit >= 1)
#[derive(Debug, Clone, Copy)]
pub struct PageParams {
    pub page: u64,
    pub limit: u64,
}

impl PageParams {
    pub fn new(page: Option<u64>, limit: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(10).max(1),
        }
    }
}
