//! Producto Service - product CRUD plus the direct stock-adjustment operation

use std::collections::HashMap;

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};

use crate::models::categoria::{self, Entity as Categoria};
use crate::models::producto::{self, CategoriaResumen, Entity as Producto, ProductoDto};
use crate::services::{PageParams, Pagination, ServiceError};

/// Filter parameters for listing products
#[derive(Debug, Default, Clone)]
pub struct ProductoFilter {
    pub categoria: Option<i32>,
    pub estado: Option<bool>,
    pub stock_bajo: bool,
    pub search: Option<String>,
}

/// Allow-listed input for create/update
#[derive(Debug, Clone)]
pub struct ProductoInput {
    pub categoria_id: i32,
    pub codigo: String,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub precio_compra: f64,
    pub precio_venta: f64,
    pub stock: Option<i32>,
    pub stock_minimo: Option<i32>,
    pub imagen: Option<String>,
    pub estado: Option<bool>,
}

fn validar(input: &ProductoInput) -> Result<(), ServiceError> {
    let mut errores = Vec::new();

    if input.codigo.trim().is_empty() {
        errores.push("El código es requerido".to_string());
    } else if input.codigo.len() > 50 {
        errores.push("El código no puede exceder 50 caracteres".to_string());
    }

    if input.nombre.trim().is_empty() {
        errores.push("El nombre es requerido".to_string());
    } else if input.nombre.len() > 150 {
        errores.push("El nombre no puede exceder 150 caracteres".to_string());
    }

    if let Some(descripcion) = &input.descripcion {
        if descripcion.len() > 1000 {
            errores.push("La descripción no puede exceder 1000 caracteres".to_string());
        }
    }

    if input.precio_compra < 0.0 {
        errores.push("El precio de compra no puede ser negativo".to_string());
    }

    if input.precio_venta < 0.0 {
        errores.push("El precio de venta no puede ser negativo".to_string());
    }

    if input.stock.unwrap_or(0) < 0 {
        errores.push("El stock no puede ser negativo".to_string());
    }

    if input.stock_minimo.unwrap_or(0) < 0 {
        errores.push("El stock mínimo no puede ser negativo".to_string());
    }

    if errores.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::Validacion(errores))
    }
}

async fn check_categoria_existe(
    db: &DatabaseConnection,
    categoria_id: i32,
) -> Result<(), ServiceError> {
    if Categoria::find_by_id(categoria_id).one(db).await?.is_none() {
        return Err(ServiceError::Validacion(vec![format!(
            "La categoría {} no existe",
            categoria_id
        )]));
    }
    Ok(())
}

async fn check_codigo_duplicado(
    db: &DatabaseConnection,
    codigo: &str,
    excluir_id: Option<i32>,
) -> Result<(), ServiceError> {
    let mut query = Producto::find().filter(producto::Column::Codigo.eq(codigo));
    if let Some(id) = excluir_id {
        query = query.filter(producto::Column::Id.ne(id));
    }

    if query.one(db).await?.is_some() {
        return Err(ServiceError::Conflicto("El codigo ya existe".to_string()));
    }
    Ok(())
}

// Batch fetch the categories referenced by a page of products
async fn cargar_categorias(
    db: &DatabaseConnection,
    productos: &[producto::Model],
) -> Result<HashMap<i32, CategoriaResumen>, ServiceError> {
    let categoria_ids: Vec<i32> = productos.iter().map(|p| p.categoria_id).collect();

    let mut map = HashMap::new();
    if !categoria_ids.is_empty() {
        let categorias = Categoria::find()
            .filter(categoria::Column::Id.is_in(categoria_ids))
            .all(db)
            .await?;
        for c in categorias {
            map.insert(
                c.id,
                CategoriaResumen {
                    id: c.id,
                    nombre: c.nombre,
                    descripcion: c.descripcion,
                },
            );
        }
    }
    Ok(map)
}

/// List products with filters, pagination and category names merged in
pub async fn list_productos(
    db: &DatabaseConnection,
    filter: ProductoFilter,
    params: PageParams,
) -> Result<(Vec<ProductoDto>, Pagination), ServiceError> {
    let mut query = Producto::find();

    if let Some(categoria_id) = filter.categoria {
        query = query.filter(producto::Column::CategoriaId.eq(categoria_id));
    }

    if let Some(estado) = filter.estado {
        query = query.filter(producto::Column::Estado.eq(estado));
    }

    if filter.stock_bajo {
        query = query.filter(
            Expr::col(producto::Column::Stock).lte(Expr::col(producto::Column::StockMinimo)),
        );
    }

    if let Some(search) = &filter.search {
        if !search.is_empty() {
            let cond = Condition::any()
                .add(producto::Column::Codigo.contains(search))
                .add(producto::Column::Nombre.contains(search))
                .add(producto::Column::Descripcion.contains(search));
            query = query.filter(cond);
        }
    }

    query = query.order_by_desc(producto::Column::CreatedAt);

    let paginator = query.paginate(db, params.limit);
    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(params.page - 1).await?;

    let categorias = cargar_categorias(db, &items).await?;
    let data = items
        .into_iter()
        .map(|p| {
            let categoria = categorias.get(&p.categoria_id).cloned();
            ProductoDto::from_model(p, categoria)
        })
        .collect();

    Ok((data, Pagination::new(total, params.page, params.limit)))
}

/// Get a single product by ID with its category expanded
pub async fn get_producto(db: &DatabaseConnection, id: i32) -> Result<ProductoDto, ServiceError> {
    let producto = Producto::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NoEncontrado("Producto no encontrado".to_string()))?;

    let categoria = Categoria::find_by_id(producto.categoria_id)
        .one(db)
        .await?
        .map(|c| CategoriaResumen {
            id: c.id,
            nombre: c.nombre,
            descripcion: c.descripcion,
        });

    Ok(ProductoDto::from_model(producto, categoria))
}

/// Create a new product
pub async fn create_producto(
    db: &DatabaseConnection,
    input: ProductoInput,
) -> Result<ProductoDto, ServiceError> {
    validar(&input)?;
    check_categoria_existe(db, input.categoria_id).await?;

    let codigo = input.codigo.trim().to_uppercase();
    check_codigo_duplicado(db, &codigo, None).await?;

    let now = chrono::Utc::now().to_rfc3339();
    let nuevo = producto::ActiveModel {
        categoria_id: Set(input.categoria_id),
        codigo: Set(codigo),
        nombre: Set(input.nombre.trim().to_string()),
        descripcion: Set(input.descripcion.map(|d| d.trim().to_string())),
        precio_compra: Set(input.precio_compra),
        precio_venta: Set(input.precio_venta),
        stock: Set(input.stock.unwrap_or(0)),
        stock_minimo: Set(input.stock_minimo.unwrap_or(5)),
        imagen: Set(input.imagen),
        estado: Set(input.estado.unwrap_or(true)),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };

    let guardado = nuevo.insert(db).await?;
    get_producto(db, guardado.id).await
}

/// Update an existing product
pub async fn update_producto(
    db: &DatabaseConnection,
    id: i32,
    input: ProductoInput,
) -> Result<ProductoDto, ServiceError> {
    validar(&input)?;

    let existente = Producto::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NoEncontrado("Producto no encontrado".to_string()))?;

    check_categoria_existe(db, input.categoria_id).await?;

    let codigo = input.codigo.trim().to_uppercase();
    check_codigo_duplicado(db, &codigo, Some(id)).await?;

    let mut active: producto::ActiveModel = existente.into();
    active.categoria_id = Set(input.categoria_id);
    active.codigo = Set(codigo);
    active.nombre = Set(input.nombre.trim().to_string());
    active.precio_compra = Set(input.precio_compra);
    active.precio_venta = Set(input.precio_venta);
    // Optional fields absent from the body keep their stored value
    if let Some(descripcion) = input.descripcion {
        active.descripcion = Set(Some(descripcion.trim().to_string()));
    }
    if let Some(stock) = input.stock {
        active.stock = Set(stock);
    }
    if let Some(stock_minimo) = input.stock_minimo {
        active.stock_minimo = Set(stock_minimo);
    }
    if let Some(imagen) = input.imagen {
        active.imagen = Set(Some(imagen));
    }
    if let Some(estado) = input.estado {
        active.estado = Set(estado);
    }
    active.updated_at = Set(chrono::Utc::now().to_rfc3339());

    active.update(db).await?;
    get_producto(db, id).await
}

/// Delete a product (hard delete)
pub async fn delete_producto(db: &DatabaseConnection, id: i32) -> Result<(), ServiceError> {
    let existente = Producto::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NoEncontrado("Producto no encontrado".to_string()))?;
    existente.delete(db).await?;
    Ok(())
}

/// Adjust stock up or down for a single product.
/// "restar" never drives stock below zero; "sumar" is unbounded.
pub async fn ajustar_stock(
    db: &DatabaseConnection,
    id: i32,
    cantidad: i32,
    operacion: &str,
) -> Result<ProductoDto, ServiceError> {
    if cantidad <= 0 {
        return Err(ServiceError::Validacion(vec![
            "Se requiere cantidad y operación (sumar o restar)".to_string(),
        ]));
    }

    let producto = Producto::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NoEncontrado("Producto no encontrado".to_string()))?;

    let nuevo_stock = match operacion {
        "sumar" => producto.stock + cantidad,
        "restar" => {
            if producto.stock < cantidad {
                return Err(ServiceError::StockInsuficiente(
                    "Stock insuficiente".to_string(),
                ));
            }
            producto.stock - cantidad
        }
        _ => {
            return Err(ServiceError::OperacionInvalida(
                "Operación inválida. Use \"sumar\" o \"restar\"".to_string(),
            ));
        }
    };

    let mut active: producto::ActiveModel = producto.into();
    active.stock = Set(nuevo_stock);
    active.updated_at = Set(chrono::Utc::now().to_rfc3339());
    active.update(db).await?;

    get_producto(db, id).await
}
