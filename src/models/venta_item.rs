use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One sale line. Code and name are snapshots taken at sale time,
/// so voiding or listing a sale never depends on the product still existing.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "venta_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub venta_id: i32,
    pub producto_id: i32,
    pub codigo: String,
    pub nombre: String,
    pub cantidad: i32,
    pub precio_unitario: f64,
    pub descuento: f64,
    pub subtotal: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::venta::Entity",
        from = "Column::VentaId",
        to = "super::venta::Column::Id"
    )]
    Venta,
    #[sea_orm(
        belongs_to = "super::producto::Entity",
        from = "Column::ProductoId",
        to = "super::producto::Column::Id"
    )]
    Producto,
}

impl Related<super::venta::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Venta.def()
    }
}

impl Related<super::producto::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Producto.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
