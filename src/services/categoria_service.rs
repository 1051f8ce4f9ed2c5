//! Categoria Service - CRUD over product categories

use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};

use crate::models::categoria::{self, Entity as Categoria};
use crate::services::{PageParams, Pagination, ServiceError};

/// Filter parameters for listing categories
#[derive(Debug, Default, Clone)]
pub struct CategoriaFilter {
    pub estado: Option<bool>,
    pub search: Option<String>,
}

/// Allow-listed input for create/update
#[derive(Debug, Clone)]
pub struct CategoriaInput {
    pub nombre: String,
    pub descripcion: Option<String>,
    pub estado: Option<bool>,
}

fn validar(input: &CategoriaInput) -> Result<(), ServiceError> {
    let mut errores = Vec::new();

    if input.nombre.trim().is_empty() {
        errores.push("El nombre es requerido".to_string());
    } else if input.nombre.len() > 100 {
        errores.push("El nombre no puede exceder 100 caracteres".to_string());
    }

    if let Some(descripcion) = &input.descripcion {
        if descripcion.len() > 500 {
            errores.push("La descripción no puede exceder 500 caracteres".to_string());
        }
    }

    if errores.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::Validacion(errores))
    }
}

/// List categories with filters and pagination
pub async fn list_categorias(
    db: &DatabaseConnection,
    filter: CategoriaFilter,
    params: PageParams,
) -> Result<(Vec<categoria::Model>, Pagination), ServiceError> {
    let mut query = Categoria::find();

    if let Some(estado) = filter.estado {
        query = query.filter(categoria::Column::Estado.eq(estado));
    }

    if let Some(search) = &filter.search {
        if !search.is_empty() {
            let cond = Condition::any()
                .add(categoria::Column::Nombre.contains(search))
                .add(categoria::Column::Descripcion.contains(search));
            query = query.filter(cond);
        }
    }

    query = query.order_by_desc(categoria::Column::CreatedAt);

    let paginator = query.paginate(db, params.limit);
    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(params.page - 1).await?;

    Ok((items, Pagination::new(total, params.page, params.limit)))
}

/// Get a single category by ID
pub async fn get_categoria(
    db: &DatabaseConnection,
    id: i32,
) -> Result<categoria::Model, ServiceError> {
    Categoria::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NoEncontrado("Categoría no encontrada".to_string()))
}

/// Create a new category
pub async fn create_categoria(
    db: &DatabaseConnection,
    input: CategoriaInput,
) -> Result<categoria::Model, ServiceError> {
    validar(&input)?;

    let now = chrono::Utc::now().to_rfc3339();
    let nueva = categoria::ActiveModel {
        nombre: Set(input.nombre.trim().to_string()),
        descripcion: Set(input.descripcion.map(|d| d.trim().to_string())),
        estado: Set(input.estado.unwrap_or(true)),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };

    Ok(nueva.insert(db).await?)
}

/// Update an existing category
pub async fn update_categoria(
    db: &DatabaseConnection,
    id: i32,
    input: CategoriaInput,
) -> Result<categoria::Model, ServiceError> {
    validar(&input)?;

    let existente = get_categoria(db, id).await?;

    let mut active: categoria::ActiveModel = existente.into();
    active.nombre = Set(input.nombre.trim().to_string());
    // Optional fields absent from the body keep their stored value
    if let Some(descripcion) = input.descripcion {
        active.descripcion = Set(Some(descripcion.trim().to_string()));
    }
    if let Some(estado) = input.estado {
        active.estado = Set(estado);
    }
    active.updated_at = Set(chrono::Utc::now().to_rfc3339());

    Ok(active.update(db).await?)
}

/// Delete a category (hard delete)
pub async fn delete_categoria(db: &DatabaseConnection, id: i32) -> Result<(), ServiceError> {
    let existente = get_categoria(db, id).await?;
    existente.delete(db).await?;
    Ok(())
}
