use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "productos")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub categoria_id: i32,
    pub codigo: String,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub precio_compra: f64,
    pub precio_venta: f64,
    pub stock: i32,
    pub stock_minimo: i32,
    pub imagen: Option<String>,
    pub estado: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categoria::Entity",
        from = "Column::CategoriaId",
        to = "super::categoria::Column::Id"
    )]
    Categoria,
    #[sea_orm(has_many = "super::venta_item::Entity")]
    VentaItem,
}

impl Related<super::categoria::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categoria.def()
    }
}

impl Related<super::venta_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VentaItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Category summary embedded in product responses
#[derive(Debug, Clone, Serialize)]
pub struct CategoriaResumen {
    pub id: i32,
    pub nombre: String,
    pub descripcion: Option<String>,
}

// DTO for API responses, adds the derived low-stock flag and category summary
#[derive(Debug, Clone, Serialize)]
pub struct ProductoDto {
    pub id: i32,
    pub categoria_id: i32,
    pub categoria: Option<CategoriaResumen>,
    pub codigo: String,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub precio_compra: f64,
    pub precio_venta: f64,
    pub stock: i32,
    pub stock_minimo: i32,
    pub stock_bajo: bool,
    pub imagen: Option<String>,
    pub estado: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl ProductoDto {
    pub fn from_model(model: Model, categoria: Option<CategoriaResumen>) -> Self {
        let stock_bajo = model.stock <= model.stock_minimo;
        Self {
            id: model.id,
            categoria_id: model.categoria_id,
            categoria,
            codigo: model.codigo,
            nombre: model.nombre,
            descripcion: model.descripcion,
            precio_compra: model.precio_compra,
            precio_venta: model.precio_venta,
            stock: model.stock,
            stock_minimo: model.stock_minimo,
            stock_bajo,
            imagen: model.imagen,
            estado: model.estado,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
