use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Accepted payment methods
pub const METODOS_PAGO: [&str; 5] = ["efectivo", "tarjeta", "yape", "plin", "transferencia"];

/// Sale lifecycle states
pub const ESTADOS: [&str; 3] = ["pendiente", "completada", "anulada"];

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ventas")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub numero_venta: String,
    pub cliente_id: Option<i32>,
    pub usuario_id: i32,
    pub fecha_venta: String,
    pub subtotal: f64,
    pub igv: f64,
    pub total: f64,
    pub metodo_pago: String,
    pub estado: String,
    pub observaciones: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::cliente::Entity",
        from = "Column::ClienteId",
        to = "super::cliente::Column::Id"
    )]
    Cliente,
    #[sea_orm(
        belongs_to = "super::usuario::Entity",
        from = "Column::UsuarioId",
        to = "super::usuario::Column::Id"
    )]
    Usuario,
    #[sea_orm(has_many = "super::venta_item::Entity")]
    VentaItem,
}

impl Related<super::cliente::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cliente.def()
    }
}

impl Related<super::usuario::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Usuario.def()
    }
}

impl Related<super::venta_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VentaItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
