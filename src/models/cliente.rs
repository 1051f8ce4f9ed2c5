use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Accepted identity document types
pub const TIPOS_DOCUMENTO: [&str; 4] = ["DNI", "RUC", "CE", "PASAPORTE"];

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "clientes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub tipo_documento: String,
    pub numero_documento: String,
    pub nombres: String,
    pub apellidos: String,
    pub telefono: Option<String>,
    pub email: Option<String>,
    pub direccion: Option<String>,
    pub estado: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::venta::Entity")]
    Venta,
}

impl Related<super::venta::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Venta.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// DTO for API responses, adds the derived full name
#[derive(Debug, Clone, Serialize)]
pub struct ClienteDto {
    pub id: i32,
    pub tipo_documento: String,
    pub numero_documento: String,
    pub nombres: String,
    pub apellidos: String,
    pub nombre_completo: String,
    pub telefono: Option<String>,
    pub email: Option<String>,
    pub direccion: Option<String>,
    pub estado: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Model> for ClienteDto {
    fn from(model: Model) -> Self {
        let nombre_completo = format!("{} {}", model.nombres, model.apellidos);
        Self {
            id: model.id,
            tipo_documento: model.tipo_documento,
            numero_documento: model.numero_documento,
            nombres: model.nombres,
            apellidos: model.apellidos,
            nombre_completo,
            telefono: model.telefono,
            email: model.email,
            direccion: model.direccion,
            estado: model.estado,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
