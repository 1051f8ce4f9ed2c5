//! Cliente Service - customer CRUD plus document-number lookup

use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};

use crate::models::cliente::{self, ClienteDto, Entity as Cliente, TIPOS_DOCUMENTO};
use crate::services::{PageParams, Pagination, ServiceError};

/// Filter parameters for listing customers
#[derive(Debug, Default, Clone)]
pub struct ClienteFilter {
    pub tipo_documento: Option<String>,
    pub estado: Option<bool>,
    pub search: Option<String>,
}

/// Allow-listed input for create/update
#[derive(Debug, Clone)]
pub struct ClienteInput {
    pub tipo_documento: String,
    pub numero_documento: String,
    pub nombres: String,
    pub apellidos: String,
    pub telefono: Option<String>,
    pub email: Option<String>,
    pub direccion: Option<String>,
    pub estado: Option<bool>,
}

fn validar(input: &ClienteInput) -> Result<(), ServiceError> {
    let mut errores = Vec::new();

    if !TIPOS_DOCUMENTO.contains(&input.tipo_documento.as_str()) {
        errores.push(format!(
            "{} no es un tipo de documento válido",
            input.tipo_documento
        ));
    }

    if input.numero_documento.trim().is_empty() {
        errores.push("El número de documento es requerido".to_string());
    } else if input.numero_documento.len() > 20 {
        errores.push("El número de documento no puede exceder 20 caracteres".to_string());
    }

    if input.nombres.trim().is_empty() {
        errores.push("Los nombres son requeridos".to_string());
    } else if input.nombres.len() > 100 {
        errores.push("Los nombres no pueden exceder 100 caracteres".to_string());
    }

    if input.apellidos.trim().is_empty() {
        errores.push("Los apellidos son requeridos".to_string());
    } else if input.apellidos.len() > 100 {
        errores.push("Los apellidos no pueden exceder 100 caracteres".to_string());
    }

    if let Some(telefono) = &input.telefono {
        if telefono.len() > 20 {
            errores.push("El teléfono no puede exceder 20 caracteres".to_string());
        }
    }

    if let Some(email) = &input.email {
        if !email.is_empty() && !es_email_valido(email) {
            errores.push("Por favor ingrese un email válido".to_string());
        }
    }

    if let Some(direccion) = &input.direccion {
        if direccion.len() > 200 {
            errores.push("La dirección no puede exceder 200 caracteres".to_string());
        }
    }

    if errores.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::Validacion(errores))
    }
}

fn es_email_valido(email: &str) -> bool {
    let mut partes = email.split('@');
    match (partes.next(), partes.next(), partes.next()) {
        (Some(local), Some(dominio), None) => {
            !local.is_empty() && dominio.contains('.') && !dominio.starts_with('.')
        }
        _ => false,
    }
}

// Duplicate document numbers surface as Conflict before hitting the unique index
async fn check_documento_duplicado(
    db: &DatabaseConnection,
    numero_documento: &str,
    excluir_id: Option<i32>,
) -> Result<(), ServiceError> {
    let mut query =
        Cliente::find().filter(cliente::Column::NumeroDocumento.eq(numero_documento));
    if let Some(id) = excluir_id {
        query = query.filter(cliente::Column::Id.ne(id));
    }

    if query.one(db).await?.is_some() {
        return Err(ServiceError::Conflicto(
            "El numero_documento ya existe".to_string(),
        ));
    }
    Ok(())
}

/// List customers with filters and pagination
pub async fn list_clientes(
    db: &DatabaseConnection,
    filter: ClienteFilter,
    params: PageParams,
) -> Result<(Vec<ClienteDto>, Pagination), ServiceError> {
    let mut query = Cliente::find();

    if let Some(tipo_documento) = &filter.tipo_documento {
        query = query.filter(cliente::Column::TipoDocumento.eq(tipo_documento.clone()));
    }

    if let Some(estado) = filter.estado {
        query = query.filter(cliente::Column::Estado.eq(estado));
    }

    if let Some(search) = &filter.search {
        if !search.is_empty() {
            let cond = Condition::any()
                .add(cliente::Column::NumeroDocumento.contains(search))
                .add(cliente::Column::Nombres.contains(search))
                .add(cliente::Column::Apellidos.contains(search))
                .add(cliente::Column::Email.contains(search));
            query = query.filter(cond);
        }
    }

    query = query.order_by_desc(cliente::Column::CreatedAt);

    let paginator = query.paginate(db, params.limit);
    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(params.page - 1).await?;

    Ok((
        items.into_iter().map(ClienteDto::from).collect(),
        Pagination::new(total, params.page, params.limit),
    ))
}

/// Get a single customer by ID
pub async fn get_cliente(db: &DatabaseConnection, id: i32) -> Result<ClienteDto, ServiceError> {
    let cliente = Cliente::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NoEncontrado("Cliente no encontrado".to_string()))?;
    Ok(ClienteDto::from(cliente))
}

/// Look up a customer by exact document number
pub async fn buscar_por_documento(
    db: &DatabaseConnection,
    documento: &str,
) -> Result<ClienteDto, ServiceError> {
    let cliente = Cliente::find()
        .filter(cliente::Column::NumeroDocumento.eq(documento))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NoEncontrado("Cliente no encontrado".to_string()))?;
    Ok(ClienteDto::from(cliente))
}

/// Create a new customer
pub async fn create_cliente(
    db: &DatabaseConnection,
    input: ClienteInput,
) -> Result<ClienteDto, ServiceError> {
    validar(&input)?;
    check_documento_duplicado(db, input.numero_documento.trim(), None).await?;

    let now = chrono::Utc::now().to_rfc3339();
    let nuevo = cliente::ActiveModel {
        tipo_documento: Set(input.tipo_documento),
        numero_documento: Set(input.numero_documento.trim().to_string()),
        nombres: Set(input.nombres.trim().to_string()),
        apellidos: Set(input.apellidos.trim().to_string()),
        telefono: Set(input.telefono.map(|t| t.trim().to_string())),
        email: Set(input.email.map(|e| e.trim().to_lowercase())),
        direccion: Set(input.direccion.map(|d| d.trim().to_string())),
        estado: Set(input.estado.unwrap_or(true)),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };

    Ok(ClienteDto::from(nuevo.insert(db).await?))
}

/// Update an existing customer
pub async fn update_cliente(
    db: &DatabaseConnection,
    id: i32,
    input: ClienteInput,
) -> Result<ClienteDto, ServiceError> {
    validar(&input)?;

    let existente = Cliente::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NoEncontrado("Cliente no encontrado".to_string()))?;

    check_documento_duplicado(db, input.numero_documento.trim(), Some(id)).await?;

    let mut active: cliente::ActiveModel = existente.into();
    active.tipo_documento = Set(input.tipo_documento);
    active.numero_documento = Set(input.numero_documento.trim().to_string());
    active.nombres = Set(input.nombres.trim().to_string());
    active.apellidos = Set(input.apellidos.trim().to_string());
    // Optional fields absent from the body keep their stored value
    if let Some(telefono) = input.telefono {
        active.telefono = Set(Some(telefono.trim().to_string()));
    }
    if let Some(email) = input.email {
        active.email = Set(Some(email.trim().to_lowercase()));
    }
    if let Some(direccion) = input.direccion {
        active.direccion = Set(Some(direccion.trim().to_string()));
    }
    if let Some(estado) = input.estado {
        active.estado = Set(estado);
    }
    active.updated_at = Set(chrono::Utc::now().to_rfc3339());

    Ok(ClienteDto::from(active.update(db).await?))
}

/// Delete a customer (hard delete)
pub async fn delete_cliente(db: &DatabaseConnection, id: i32) -> Result<(), ServiceError> {
    let existente = Cliente::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NoEncontrado("Cliente no encontrado".to_string()))?;
    existente.delete(db).await?;
    Ok(())
}
