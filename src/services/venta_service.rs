//! Venta Service - the sale workflow: creation, voiding and dashboard rollups.
//!
//! Sale creation runs inside a single transaction: per-line stock checks and
//! decrements, the sale insert and the item snapshots either all commit or all
//! roll back. Voiding restores stock and flips the status under the same rule.

use std::collections::HashMap;

use chrono::{Datelike, Local};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;

use crate::models::cliente::{self, Entity as Cliente};
use crate::models::producto::{self, Entity as Producto};
use crate::models::usuario::{self, Entity as Usuario};
use crate::models::venta::{self, Entity as Venta, METODOS_PAGO};
use crate::models::venta_item::{self, Entity as VentaItem};
use crate::services::{PageParams, Pagination, ServiceError};

/// IGV (Peruvian sales tax) applied over the sale subtotal
const TASA_IGV: f64 = 0.18;

/// One requested line of a new sale
#[derive(Debug, Clone)]
pub struct VentaItemInput {
    pub producto: i32,
    pub cantidad: i32,
    pub precio_unitario: f64,
    pub descuento: f64,
}

/// Input for sale creation
#[derive(Debug, Clone)]
pub struct VentaInput {
    pub cliente: Option<i32>,
    pub items: Vec<VentaItemInput>,
    pub metodo_pago: String,
    pub observaciones: Option<String>,
}

/// Filter parameters for listing sales
#[derive(Debug, Default, Clone)]
pub struct VentaFilter {
    pub fecha_inicio: Option<String>,
    pub fecha_fin: Option<String>,
    pub cliente: Option<i32>,
    pub usuario: Option<i32>,
    pub metodo_pago: Option<String>,
    pub estado: Option<String>,
}

/// Customer summary embedded in sale responses
#[derive(Debug, Clone, Serialize)]
pub struct ClienteResumen {
    pub id: i32,
    pub nombres: String,
    pub apellidos: String,
    pub numero_documento: String,
}

/// Operator summary embedded in sale responses
#[derive(Debug, Clone, Serialize)]
pub struct UsuarioResumen {
    pub id: i32,
    pub name: String,
    pub email: String,
}

/// Fully expanded sale record
#[derive(Debug, Clone, Serialize)]
pub struct VentaConDetalles {
    pub id: i32,
    pub numero_venta: String,
    pub cliente: Option<ClienteResumen>,
    pub usuario: Option<UsuarioResumen>,
    pub fecha_venta: String,
    pub items: Vec<venta_item::Model>,
    pub subtotal: f64,
    pub igv: f64,
    pub total: f64,
    pub metodo_pago: String,
    pub estado: String,
    pub observaciones: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Totals for one dashboard window
#[derive(Debug, Clone, Serialize)]
pub struct ResumenVentana {
    pub total: f64,
    pub cantidad: i64,
}

/// One entry of the top-products rollup
#[derive(Debug, Clone, Serialize)]
pub struct TopProducto {
    pub producto: i32,
    pub codigo: String,
    pub nombre: String,
    pub cantidad: i64,
    pub total: f64,
}

/// Composite dashboard payload
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub hoy: ResumenVentana,
    pub mes: ResumenVentana,
    pub anio: ResumenVentana,
    pub top_productos: Vec<TopProducto>,
}

fn validar(input: &VentaInput) -> Result<(), ServiceError> {
    let mut errores = Vec::new();

    if input.items.is_empty() {
        errores.push("La venta debe tener al menos un producto".to_string());
    }

    for item in &input.items {
        if item.cantidad < 1 {
            errores.push("La cantidad debe ser mayor a 0".to_string());
        }
        if item.precio_unitario < 0.0 {
            errores.push("El precio unitario no puede ser negativo".to_string());
        }
        if item.descuento < 0.0 {
            errores.push("El descuento no puede ser negativo".to_string());
        }
    }

    if !METODOS_PAGO.contains(&input.metodo_pago.as_str()) {
        errores.push(format!(
            "{} no es un método de pago válido",
            input.metodo_pago
        ));
    }

    if let Some(observaciones) = &input.observaciones {
        if observaciones.len() > 500 {
            errores.push("Las observaciones no pueden exceder 500 caracteres".to_string());
        }
    }

    if errores.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::Validacion(errores))
    }
}

/// Next sale number for the current year-month prefix, e.g. `V202608000001`.
/// Scanned inside the creation transaction; the UNIQUE index on numero_venta
/// backstops races between concurrent inserts.
async fn generar_numero_venta<C: ConnectionTrait>(conn: &C) -> Result<String, ServiceError> {
    let ahora = Local::now();
    let prefijo = format!("V{}{:02}", ahora.year(), ahora.month());

    let ultima = Venta::find()
        .filter(venta::Column::NumeroVenta.starts_with(&prefijo))
        .order_by_desc(venta::Column::NumeroVenta)
        .one(conn)
        .await?;

    let siguiente = match ultima {
        Some(v) => {
            let sufijo = &v.numero_venta[v.numero_venta.len().saturating_sub(6)..];
            sufijo.parse::<u32>().unwrap_or(0) + 1
        }
        None => 1,
    };

    Ok(format!("{}{:06}", prefijo, siguiente))
}

// Expand a page of sales with customer, operator and item data in three batch fetches
async fn expandir_ventas(
    db: &DatabaseConnection,
    ventas: Vec<venta::Model>,
) -> Result<Vec<VentaConDetalles>, ServiceError> {
    let venta_ids: Vec<i32> = ventas.iter().map(|v| v.id).collect();
    let cliente_ids: Vec<i32> = ventas.iter().filter_map(|v| v.cliente_id).collect();
    let usuario_ids: Vec<i32> = ventas.iter().map(|v| v.usuario_id).collect();

    let mut clientes: HashMap<i32, ClienteResumen> = HashMap::new();
    if !cliente_ids.is_empty() {
        for c in Cliente::find()
            .filter(cliente::Column::Id.is_in(cliente_ids))
            .all(db)
            .await?
        {
            clientes.insert(
                c.id,
                ClienteResumen {
                    id: c.id,
                    nombres: c.nombres,
                    apellidos: c.apellidos,
                    numero_documento: c.numero_documento,
                },
            );
        }
    }

    let mut usuarios: HashMap<i32, UsuarioResumen> = HashMap::new();
    if !usuario_ids.is_empty() {
        for u in Usuario::find()
            .filter(usuario::Column::Id.is_in(usuario_ids))
            .all(db)
            .await?
        {
            usuarios.insert(
                u.id,
                UsuarioResumen {
                    id: u.id,
                    name: u.name,
                    email: u.email,
                },
            );
        }
    }

    let mut items_por_venta: HashMap<i32, Vec<venta_item::Model>> = HashMap::new();
    if !venta_ids.is_empty() {
        for item in VentaItem::find()
            .filter(venta_item::Column::VentaId.is_in(venta_ids))
            .all(db)
            .await?
        {
            items_por_venta.entry(item.venta_id).or_default().push(item);
        }
    }

    Ok(ventas
        .into_iter()
        .map(|v| {
            let cliente = v.cliente_id.and_then(|id| clientes.get(&id).cloned());
            let usuario = usuarios.get(&v.usuario_id).cloned();
            let items = items_por_venta.remove(&v.id).unwrap_or_default();
            VentaConDetalles {
                id: v.id,
                numero_venta: v.numero_venta,
                cliente,
                usuario,
                fecha_venta: v.fecha_venta,
                items,
                subtotal: v.subtotal,
                igv: v.igv,
                total: v.total,
                metodo_pago: v.metodo_pago,
                estado: v.estado,
                observaciones: v.observaciones,
                created_at: v.created_at,
                updated_at: v.updated_at,
            }
        })
        .collect())
}

/// List sales with filters, pagination and expanded references
pub async fn listar_ventas(
    db: &DatabaseConnection,
    filter: VentaFilter,
    params: PageParams,
) -> Result<(Vec<VentaConDetalles>, Pagination), ServiceError> {
    let mut query = Venta::find();

    if let Some(fecha_inicio) = &filter.fecha_inicio {
        query = query.filter(venta::Column::FechaVenta.gte(fecha_inicio.clone()));
    }

    // End date is inclusive end-of-day when given as a plain date
    if let Some(fecha_fin) = &filter.fecha_fin {
        let limite = if fecha_fin.len() == 10 {
            format!("{} 23:59:59", fecha_fin)
        } else {
            fecha_fin.clone()
        };
        query = query.filter(venta::Column::FechaVenta.lte(limite));
    }

    if let Some(cliente) = filter.cliente {
        query = query.filter(venta::Column::ClienteId.eq(cliente));
    }

    if let Some(usuario) = filter.usuario {
        query = query.filter(venta::Column::UsuarioId.eq(usuario));
    }

    if let Some(metodo_pago) = &filter.metodo_pago {
        query = query.filter(venta::Column::MetodoPago.eq(metodo_pago.clone()));
    }

    if let Some(estado) = &filter.estado {
        query = query.filter(venta::Column::Estado.eq(estado.clone()));
    }

    query = query.order_by_desc(venta::Column::FechaVenta);

    let paginator = query.paginate(db, params.limit);
    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(params.page - 1).await?;

    let data = expandir_ventas(db, items).await?;
    Ok((data, Pagination::new(total, params.page, params.limit)))
}

/// Get a fully expanded sale by ID
pub async fn obtener_venta(
    db: &DatabaseConnection,
    id: i32,
) -> Result<VentaConDetalles, ServiceError> {
    let venta = Venta::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NoEncontrado("Venta no encontrada".to_string()))?;

    let mut expandidas = expandir_ventas(db, vec![venta]).await?;
    Ok(expandidas.remove(0))
}

/// Get a fully expanded sale by its human-readable number
pub async fn obtener_por_numero(
    db: &DatabaseConnection,
    numero: &str,
) -> Result<VentaConDetalles, ServiceError> {
    let venta = Venta::find()
        .filter(venta::Column::NumeroVenta.eq(numero))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NoEncontrado("Venta no encontrada".to_string()))?;

    let mut expandidas = expandir_ventas(db, vec![venta]).await?;
    Ok(expandidas.remove(0))
}

/// Create a sale: validate lines, decrement stock, compute totals and persist,
/// all inside one transaction. Any line failure leaves stock untouched.
pub async fn crear_venta(
    db: &DatabaseConnection,
    usuario_id: i32,
    input: VentaInput,
) -> Result<VentaConDetalles, ServiceError> {
    validar(&input)?;

    let txn = db.begin().await?;

    if let Some(cliente_id) = input.cliente {
        if Cliente::find_by_id(cliente_id).one(&txn).await?.is_none() {
            return Err(ServiceError::NoEncontrado(
                "Cliente no encontrado".to_string(),
            ));
        }
    }

    let now = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let created = chrono::Utc::now().to_rfc3339();

    // Check stock, capture snapshots and decrement line by line
    let mut snapshots = Vec::with_capacity(input.items.len());
    for item in &input.items {
        let producto = Producto::find_by_id(item.producto)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NoEncontrado(format!("Producto {} no encontrado", item.producto))
            })?;

        if producto.stock < item.cantidad {
            return Err(ServiceError::StockInsuficiente(format!(
                "Stock insuficiente para {}. Stock disponible: {}",
                producto.nombre, producto.stock
            )));
        }

        let subtotal = item.cantidad as f64 * item.precio_unitario - item.descuento;
        snapshots.push((
            producto.id,
            producto.codigo.clone(),
            producto.nombre.clone(),
            item,
            subtotal,
        ));

        let nuevo_stock = producto.stock - item.cantidad;
        let mut active: producto::ActiveModel = producto.into();
        active.stock = Set(nuevo_stock);
        active.updated_at = Set(created.clone());
        active.update(&txn).await?;
    }

    let subtotal: f64 = snapshots.iter().map(|(_, _, _, _, s)| s).sum();
    let igv = subtotal * TASA_IGV;
    let total = subtotal + igv;

    let numero_venta = generar_numero_venta(&txn).await?;

    tracing::info!(
        "Registering sale {} ({} items, total {:.2})",
        numero_venta,
        snapshots.len(),
        total
    );

    let nueva = venta::ActiveModel {
        numero_venta: Set(numero_venta),
        cliente_id: Set(input.cliente),
        usuario_id: Set(usuario_id),
        fecha_venta: Set(now),
        subtotal: Set(subtotal),
        igv: Set(igv),
        total: Set(total),
        metodo_pago: Set(input.metodo_pago),
        estado: Set("completada".to_string()),
        observaciones: Set(input.observaciones),
        created_at: Set(created.clone()),
        updated_at: Set(created),
        ..Default::default()
    };
    let guardada = nueva.insert(&txn).await?;

    for (producto_id, codigo, nombre, item, item_subtotal) in snapshots {
        let nuevo_item = venta_item::ActiveModel {
            venta_id: Set(guardada.id),
            producto_id: Set(producto_id),
            codigo: Set(codigo),
            nombre: Set(nombre),
            cantidad: Set(item.cantidad),
            precio_unitario: Set(item.precio_unitario),
            descuento: Set(item.descuento),
            subtotal: Set(item_subtotal),
            ..Default::default()
        };
        nuevo_item.insert(&txn).await?;
    }

    txn.commit().await?;

    obtener_venta(db, guardada.id).await
}

/// Void a sale: restore each line's stock once and flip the status, in one
/// transaction. Lines whose product was deleted since the sale are skipped.
pub async fn anular_venta(
    db: &DatabaseConnection,
    id: i32,
) -> Result<VentaConDetalles, ServiceError> {
    let txn = db.begin().await?;

    let venta = Venta::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| ServiceError::NoEncontrado("Venta no encontrada".to_string()))?;

    if venta.estado == "anulada" {
        return Err(ServiceError::VentaYaAnulada);
    }

    let items = VentaItem::find()
        .filter(venta_item::Column::VentaId.eq(venta.id))
        .all(&txn)
        .await?;

    let now = chrono::Utc::now().to_rfc3339();

    for item in &items {
        if let Some(producto) = Producto::find_by_id(item.producto_id).one(&txn).await? {
            let nuevo_stock = producto.stock + item.cantidad;
            let mut active: producto::ActiveModel = producto.into();
            active.stock = Set(nuevo_stock);
            active.updated_at = Set(now.clone());
            active.update(&txn).await?;
        } else {
            tracing::warn!(
                "Product {} of sale {} no longer exists, skipping stock restore",
                item.producto_id,
                venta.numero_venta
            );
        }
    }

    let mut active: venta::ActiveModel = venta.into();
    active.estado = Set("anulada".to_string());
    active.updated_at = Set(now);
    let anulada = active.update(&txn).await?;

    txn.commit().await?;

    obtener_venta(db, anulada.id).await
}

async fn resumen_ventana(
    db: &DatabaseConnection,
    condition: Condition,
) -> Result<ResumenVentana, ServiceError> {
    let ventas = Venta::find().filter(condition).all(db).await?;
    Ok(ResumenVentana {
        total: ventas.iter().map(|v| v.total).sum(),
        cantidad: ventas.len() as i64,
    })
}

/// Dashboard rollups: completed-sale totals for today, this month and this
/// year, plus the top 10 products by cumulative quantity sold.
pub async fn estadisticas(db: &DatabaseConnection) -> Result<DashboardStats, ServiceError> {
    let ahora = Local::now();
    let hoy = ahora.format("%Y-%m-%d").to_string();
    let inicio_mes = format!("{}-{:02}-01 00:00:00", ahora.year(), ahora.month());
    let inicio_anio = format!("{}-01-01 00:00:00", ahora.year());

    let completada = venta::Column::Estado.eq("completada");

    let ventas_hoy = resumen_ventana(
        db,
        Condition::all()
            .add(completada.clone())
            .add(venta::Column::FechaVenta.gte(format!("{} 00:00:00", hoy)))
            .add(venta::Column::FechaVenta.lte(format!("{} 23:59:59", hoy))),
    )
    .await?;

    let ventas_mes = resumen_ventana(
        db,
        Condition::all()
            .add(completada.clone())
            .add(venta::Column::FechaVenta.gte(inicio_mes)),
    )
    .await?;

    let ventas_anio = resumen_ventana(
        db,
        Condition::all()
            .add(completada.clone())
            .add(venta::Column::FechaVenta.gte(inicio_anio)),
    )
    .await?;

    // Top products: group completed sales' items in memory
    let ids_completadas: Vec<i32> = Venta::find()
        .filter(completada)
        .all(db)
        .await?
        .into_iter()
        .map(|v| v.id)
        .collect();

    let mut acumulados: HashMap<i32, TopProducto> = HashMap::new();
    if !ids_completadas.is_empty() {
        let items = VentaItem::find()
            .filter(venta_item::Column::VentaId.is_in(ids_completadas))
            .all(db)
            .await?;

        for item in items {
            let entry = acumulados.entry(item.producto_id).or_insert(TopProducto {
                producto: item.producto_id,
                codigo: item.codigo.clone(),
                nombre: item.nombre.clone(),
                cantidad: 0,
                total: 0.0,
            });
            entry.cantidad += item.cantidad as i64;
            entry.total += item.subtotal;
        }
    }

    let mut top_productos: Vec<TopProducto> = acumulados.into_values().collect();
    top_productos.sort_by(|a, b| b.cantidad.cmp(&a.cantidad));
    top_productos.truncate(10);

    Ok(DashboardStats {
        hoy: ventas_hoy,
        mes: ventas_mes,
        anio: ventas_anio,
        top_productos,
    })
}
