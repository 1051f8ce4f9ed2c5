//! Workflow properties of the sale flow: totals, all-or-nothing creation,
//! void idempotence, dashboard rollups, pagination and stock adjustment.

use chrono::{Datelike, Duration, Local};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, Set};

use lennin_pos::db;
use lennin_pos::models::{categoria, cliente, producto, usuario, venta};
use lennin_pos::services::categoria_service::{self, CategoriaFilter, CategoriaInput};
use lennin_pos::services::cliente_service::{self, ClienteInput};
use lennin_pos::services::producto_service::{self, ProductoFilter, ProductoInput};
use lennin_pos::services::venta_service::{self, VentaFilter, VentaInput, VentaItemInput};
use lennin_pos::services::{PageParams, ServiceError};

async fn setup_test_db() -> DatabaseConnection {
    db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB")
}

async fn create_test_usuario(db: &DatabaseConnection) -> i32 {
    let now = chrono::Utc::now().to_rfc3339();
    let user = usuario::ActiveModel {
        name: Set("Vendedor".to_string()),
        email: Set("vendedor@test.com".to_string()),
        password: Set("not-a-real-hash".to_string()),
        role: Set("vendedor".to_string()),
        activo: Set(true),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };
    user.insert(db).await.expect("Failed to create usuario").id
}

async fn create_test_categoria(db: &DatabaseConnection) -> i32 {
    let now = chrono::Utc::now().to_rfc3339();
    let cat = categoria::ActiveModel {
        nombre: Set("Bebidas".to_string()),
        estado: Set(true),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };
    cat.insert(db).await.expect("Failed to create categoria").id
}

async fn create_test_producto(
    db: &DatabaseConnection,
    categoria_id: i32,
    codigo: &str,
    stock: i32,
) -> i32 {
    let now = chrono::Utc::now().to_rfc3339();
    let prod = producto::ActiveModel {
        categoria_id: Set(categoria_id),
        codigo: Set(codigo.to_string()),
        nombre: Set(format!("Producto {}", codigo)),
        precio_compra: Set(5.0),
        precio_venta: Set(10.0),
        stock: Set(stock),
        stock_minimo: Set(5),
        estado: Set(true),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };
    prod.insert(db).await.expect("Failed to create producto").id
}

async fn stock_actual(db: &DatabaseConnection, id: i32) -> i32 {
    producto::Entity::find_by_id(id)
        .one(db)
        .await
        .unwrap()
        .unwrap()
        .stock
}

fn venta_simple(producto: i32, cantidad: i32, precio: f64) -> VentaInput {
    VentaInput {
        cliente: None,
        items: vec![VentaItemInput {
            producto,
            cantidad,
            precio_unitario: precio,
            descuento: 0.0,
        }],
        metodo_pago: "efectivo".to_string(),
        observaciones: None,
    }
}

#[tokio::test]
async fn test_venta_totales() {
    let db = setup_test_db().await;
    let usuario_id = create_test_usuario(&db).await;
    let categoria_id = create_test_categoria(&db).await;
    let producto_id = create_test_producto(&db, categoria_id, "GAS001", 10).await;

    let venta = venta_service::crear_venta(&db, usuario_id, venta_simple(producto_id, 2, 10.0))
        .await
        .expect("Sale creation failed");

    assert_eq!(venta.items.len(), 1);
    assert_eq!(venta.items[0].subtotal, 20.0);
    assert_eq!(venta.subtotal, 20.0);
    assert!((venta.igv - 3.6).abs() < 1e-9);
    assert!((venta.total - 23.6).abs() < 1e-9);
    assert_eq!(venta.estado, "completada");

    // Stock was decremented
    assert_eq!(stock_actual(&db, producto_id).await, 8);

    // Line snapshot captured the product code and name
    assert_eq!(venta.items[0].codigo, "GAS001");
}

#[tokio::test]
async fn test_venta_descuento_en_subtotal() {
    let db = setup_test_db().await;
    let usuario_id = create_test_usuario(&db).await;
    let categoria_id = create_test_categoria(&db).await;
    let producto_id = create_test_producto(&db, categoria_id, "GAS001", 10).await;

    let input = VentaInput {
        cliente: None,
        items: vec![VentaItemInput {
            producto: producto_id,
            cantidad: 3,
            precio_unitario: 10.0,
            descuento: 5.0,
        }],
        metodo_pago: "tarjeta".to_string(),
        observaciones: Some("con descuento".to_string()),
    };

    let venta = venta_service::crear_venta(&db, usuario_id, input)
        .await
        .unwrap();

    assert_eq!(venta.items[0].subtotal, 25.0);
    assert_eq!(venta.subtotal, 25.0);
}

#[tokio::test]
async fn test_venta_stock_insuficiente_deja_todo_intacto() {
    let db = setup_test_db().await;
    let usuario_id = create_test_usuario(&db).await;
    let categoria_id = create_test_categoria(&db).await;
    let producto_a = create_test_producto(&db, categoria_id, "AAA001", 5).await;
    let producto_b = create_test_producto(&db, categoria_id, "BBB001", 1).await;

    let input = VentaInput {
        cliente: None,
        items: vec![
            VentaItemInput {
                producto: producto_a,
                cantidad: 2,
                precio_unitario: 10.0,
                descuento: 0.0,
            },
            VentaItemInput {
                producto: producto_b,
                cantidad: 5,
                precio_unitario: 10.0,
                descuento: 0.0,
            },
        ],
        metodo_pago: "efectivo".to_string(),
        observaciones: None,
    };

    let result = venta_service::crear_venta(&db, usuario_id, input).await;
    assert!(matches!(result, Err(ServiceError::StockInsuficiente(_))));

    // All-or-nothing: the first line's decrement was rolled back too
    assert_eq!(stock_actual(&db, producto_a).await, 5);
    assert_eq!(stock_actual(&db, producto_b).await, 1);

    let total_ventas = venta::Entity::find().count(&db).await.unwrap();
    assert_eq!(total_ventas, 0);
}

#[tokio::test]
async fn test_venta_producto_inexistente() {
    let db = setup_test_db().await;
    let usuario_id = create_test_usuario(&db).await;

    let result = venta_service::crear_venta(&db, usuario_id, venta_simple(999, 1, 10.0)).await;
    assert!(matches!(result, Err(ServiceError::NoEncontrado(_))));
}

#[tokio::test]
async fn test_numero_venta_secuencial() {
    let db = setup_test_db().await;
    let usuario_id = create_test_usuario(&db).await;
    let categoria_id = create_test_categoria(&db).await;
    let producto_id = create_test_producto(&db, categoria_id, "GAS001", 10).await;

    let primera = venta_service::crear_venta(&db, usuario_id, venta_simple(producto_id, 1, 10.0))
        .await
        .unwrap();
    let segunda = venta_service::crear_venta(&db, usuario_id, venta_simple(producto_id, 1, 10.0))
        .await
        .unwrap();

    let ahora = Local::now();
    let prefijo = format!("V{}{:02}", ahora.year(), ahora.month());
    assert_eq!(primera.numero_venta, format!("{}000001", prefijo));
    assert_eq!(segunda.numero_venta, format!("{}000002", prefijo));

    // Lookup by number round-trips
    let encontrada = venta_service::obtener_por_numero(&db, &primera.numero_venta)
        .await
        .unwrap();
    assert_eq!(encontrada.id, primera.id);
}

#[tokio::test]
async fn test_listado_filtra_por_rango_de_fechas() {
    let db = setup_test_db().await;
    let usuario_id = create_test_usuario(&db).await;
    let categoria_id = create_test_categoria(&db).await;
    let producto_id = create_test_producto(&db, categoria_id, "GAS001", 10).await;

    venta_service::crear_venta(&db, usuario_id, venta_simple(producto_id, 1, 10.0))
        .await
        .unwrap();

    let hoy = Local::now().format("%Y-%m-%d").to_string();
    let ayer = (Local::now() - Duration::days(1))
        .format("%Y-%m-%d")
        .to_string();

    // A plain end date covers the whole day, so today's sale is included
    let (data, _) = venta_service::listar_ventas(
        &db,
        VentaFilter {
            fecha_fin: Some(hoy.clone()),
            ..Default::default()
        },
        PageParams::new(None, None),
    )
    .await
    .unwrap();
    assert_eq!(data.len(), 1);

    // An end date of yesterday excludes it
    let (data, _) = venta_service::listar_ventas(
        &db,
        VentaFilter {
            fecha_fin: Some(ayer),
            ..Default::default()
        },
        PageParams::new(None, None),
    )
    .await
    .unwrap();
    assert!(data.is_empty());

    let (data, _) = venta_service::listar_ventas(
        &db,
        VentaFilter {
            fecha_inicio: Some(format!("{} 00:00:00", hoy)),
            ..Default::default()
        },
        PageParams::new(None, None),
    )
    .await
    .unwrap();
    assert_eq!(data.len(), 1);
}

#[tokio::test]
async fn test_anular_restaura_stock_una_sola_vez() {
    let db = setup_test_db().await;
    let usuario_id = create_test_usuario(&db).await;
    let categoria_id = create_test_categoria(&db).await;
    let producto_id = create_test_producto(&db, categoria_id, "GAS001", 10).await;

    let venta = venta_service::crear_venta(&db, usuario_id, venta_simple(producto_id, 4, 10.0))
        .await
        .unwrap();
    assert_eq!(stock_actual(&db, producto_id).await, 6);

    let anulada = venta_service::anular_venta(&db, venta.id).await.unwrap();
    assert_eq!(anulada.estado, "anulada");
    assert_eq!(stock_actual(&db, producto_id).await, 10);

    // Second void fails and stock stays put
    let result = venta_service::anular_venta(&db, venta.id).await;
    assert!(matches!(result, Err(ServiceError::VentaYaAnulada)));
    assert_eq!(stock_actual(&db, producto_id).await, 10);
}

#[tokio::test]
async fn test_anular_con_producto_eliminado() {
    let db = setup_test_db().await;
    let usuario_id = create_test_usuario(&db).await;
    let categoria_id = create_test_categoria(&db).await;
    let producto_id = create_test_producto(&db, categoria_id, "GAS001", 10).await;

    let venta = venta_service::crear_venta(&db, usuario_id, venta_simple(producto_id, 2, 10.0))
        .await
        .unwrap();

    producto_service::delete_producto(&db, producto_id)
        .await
        .unwrap();

    // The missing product's restore is skipped, the void still lands
    let anulada = venta_service::anular_venta(&db, venta.id).await.unwrap();
    assert_eq!(anulada.estado, "anulada");
}

#[tokio::test]
async fn test_dashboard_vacio() {
    let db = setup_test_db().await;

    let stats = venta_service::estadisticas(&db).await.unwrap();
    assert_eq!(stats.hoy.total, 0.0);
    assert_eq!(stats.hoy.cantidad, 0);
    assert_eq!(stats.mes.total, 0.0);
    assert_eq!(stats.mes.cantidad, 0);
    assert_eq!(stats.anio.total, 0.0);
    assert_eq!(stats.anio.cantidad, 0);
    assert!(stats.top_productos.is_empty());
}

#[tokio::test]
async fn test_dashboard_cuenta_solo_completadas() {
    let db = setup_test_db().await;
    let usuario_id = create_test_usuario(&db).await;
    let categoria_id = create_test_categoria(&db).await;
    let producto_a = create_test_producto(&db, categoria_id, "AAA001", 50).await;
    let producto_b = create_test_producto(&db, categoria_id, "BBB001", 50).await;

    venta_service::crear_venta(&db, usuario_id, venta_simple(producto_a, 5, 10.0))
        .await
        .unwrap();
    venta_service::crear_venta(&db, usuario_id, venta_simple(producto_b, 2, 10.0))
        .await
        .unwrap();
    let anulable = venta_service::crear_venta(&db, usuario_id, venta_simple(producto_a, 3, 10.0))
        .await
        .unwrap();
    venta_service::anular_venta(&db, anulable.id).await.unwrap();

    let stats = venta_service::estadisticas(&db).await.unwrap();
    assert_eq!(stats.hoy.cantidad, 2);
    assert!((stats.hoy.total - (59.0 + 23.6)).abs() < 1e-9);
    assert_eq!(stats.hoy.cantidad, stats.mes.cantidad);
    assert_eq!(stats.hoy.cantidad, stats.anio.cantidad);

    // Top products exclude the voided sale and sort by quantity sold
    assert_eq!(stats.top_productos.len(), 2);
    assert_eq!(stats.top_productos[0].codigo, "AAA001");
    assert_eq!(stats.top_productos[0].cantidad, 5);
    assert_eq!(stats.top_productos[1].cantidad, 2);
}

#[tokio::test]
async fn test_ajuste_de_stock() {
    let db = setup_test_db().await;
    let categoria_id = create_test_categoria(&db).await;
    let producto_id = create_test_producto(&db, categoria_id, "GAS001", 10).await;

    // Increase is unbounded
    let producto = producto_service::ajustar_stock(&db, producto_id, 1000, "sumar")
        .await
        .unwrap();
    assert_eq!(producto.stock, 1010);

    // Decrease never goes below zero
    let result = producto_service::ajustar_stock(&db, producto_id, 2000, "restar").await;
    assert!(matches!(result, Err(ServiceError::StockInsuficiente(_))));
    assert_eq!(stock_actual(&db, producto_id).await, 1010);

    // Unknown tag
    let result = producto_service::ajustar_stock(&db, producto_id, 1, "duplicar").await;
    assert!(matches!(result, Err(ServiceError::OperacionInvalida(_))));
}

#[tokio::test]
async fn test_paginacion_calcula_pages() {
    let db = setup_test_db().await;

    for i in 0..25 {
        categoria_service::create_categoria(
            &db,
            CategoriaInput {
                nombre: format!("Categoria {}", i),
                descripcion: None,
                estado: None,
            },
        )
        .await
        .unwrap();
    }

    let (data, pagination) = categoria_service::list_categorias(
        &db,
        CategoriaFilter::default(),
        PageParams::new(Some(1), Some(10)),
    )
    .await
    .unwrap();
    assert_eq!(data.len(), 10);
    assert_eq!(pagination.total, 25);
    assert_eq!(pagination.pages, 3);

    let (data, pagination) = categoria_service::list_categorias(
        &db,
        CategoriaFilter::default(),
        PageParams::new(Some(3), Some(10)),
    )
    .await
    .unwrap();
    assert_eq!(data.len(), 5);
    assert_eq!(pagination.page, 3);
}

#[tokio::test]
async fn test_busqueda_insensible_a_mayusculas() {
    let db = setup_test_db().await;
    let categoria_id = create_test_categoria(&db).await;

    producto_service::create_producto(
        &db,
        ProductoInput {
            categoria_id,
            codigo: "gas001".to_string(),
            nombre: "Gaseosa Cola 500ml".to_string(),
            descripcion: None,
            precio_compra: 1.8,
            precio_venta: 2.5,
            stock: Some(10),
            stock_minimo: None,
            imagen: None,
            estado: None,
        },
    )
    .await
    .unwrap();

    let (data, _) = producto_service::list_productos(
        &db,
        ProductoFilter {
            search: Some("cola".to_string()),
            ..Default::default()
        },
        PageParams::new(None, None),
    )
    .await
    .unwrap();

    assert_eq!(data.len(), 1);
    // Code was uppercased on create
    assert_eq!(data[0].codigo, "GAS001");
    assert_eq!(data[0].categoria.as_ref().unwrap().nombre, "Bebidas");
}

#[tokio::test]
async fn test_producto_stock_bajo_derivado_y_filtro() {
    let db = setup_test_db().await;
    let categoria_id = create_test_categoria(&db).await;
    create_test_producto(&db, categoria_id, "BAJO01", 3).await;
    create_test_producto(&db, categoria_id, "ALTO01", 50).await;

    let (data, _) = producto_service::list_productos(
        &db,
        ProductoFilter {
            stock_bajo: true,
            ..Default::default()
        },
        PageParams::new(None, None),
    )
    .await
    .unwrap();

    assert_eq!(data.len(), 1);
    assert_eq!(data[0].codigo, "BAJO01");
    assert!(data[0].stock_bajo);
}

#[tokio::test]
async fn test_cliente_documento_duplicado() {
    let db = setup_test_db().await;

    let input = ClienteInput {
        tipo_documento: "DNI".to_string(),
        numero_documento: "45678912".to_string(),
        nombres: "María".to_string(),
        apellidos: "Quispe".to_string(),
        telefono: None,
        email: None,
        direccion: None,
        estado: None,
    };

    let creado = cliente_service::create_cliente(&db, input.clone()).await.unwrap();
    assert_eq!(creado.nombre_completo, "María Quispe");

    let result = cliente_service::create_cliente(&db, input).await;
    assert!(matches!(result, Err(ServiceError::Conflicto(_))));

    // Exact document lookup
    let encontrado = cliente_service::buscar_por_documento(&db, "45678912")
        .await
        .unwrap();
    assert_eq!(encontrado.id, creado.id);
}

#[tokio::test]
async fn test_update_preserva_campos_opcionales_ausentes() {
    let db = setup_test_db().await;
    let categoria_id = create_test_categoria(&db).await;

    let creado = cliente_service::create_cliente(
        &db,
        ClienteInput {
            tipo_documento: "DNI".to_string(),
            numero_documento: "45678912".to_string(),
            nombres: "María".to_string(),
            apellidos: "Quispe".to_string(),
            telefono: Some("987654321".to_string()),
            email: Some("maria@test.com".to_string()),
            direccion: None,
            estado: None,
        },
    )
    .await
    .unwrap();

    // Renaming without resending telefono/email keeps them
    let actualizado = cliente_service::update_cliente(
        &db,
        creado.id,
        ClienteInput {
            tipo_documento: "DNI".to_string(),
            numero_documento: "45678912".to_string(),
            nombres: "María Elena".to_string(),
            apellidos: "Quispe".to_string(),
            telefono: None,
            email: None,
            direccion: None,
            estado: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(actualizado.nombres, "María Elena");
    assert_eq!(actualizado.telefono.as_deref(), Some("987654321"));
    assert_eq!(actualizado.email.as_deref(), Some("maria@test.com"));

    let producto = producto_service::create_producto(
        &db,
        ProductoInput {
            categoria_id,
            codigo: "GAS001".to_string(),
            nombre: "Gaseosa Cola 500ml".to_string(),
            descripcion: Some("Botella retornable".to_string()),
            precio_compra: 1.8,
            precio_venta: 2.5,
            stock: Some(10),
            stock_minimo: None,
            imagen: None,
            estado: None,
        },
    )
    .await
    .unwrap();

    let actualizado = producto_service::update_producto(
        &db,
        producto.id,
        ProductoInput {
            categoria_id,
            codigo: "GAS001".to_string(),
            nombre: "Gaseosa Cola 500ml".to_string(),
            descripcion: None,
            precio_compra: 1.8,
            precio_venta: 2.8,
            stock: None,
            stock_minimo: None,
            imagen: None,
            estado: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(actualizado.precio_venta, 2.8);
    assert_eq!(actualizado.descripcion.as_deref(), Some("Botella retornable"));
    assert_eq!(actualizado.stock, 10);
}

#[tokio::test]
async fn test_cliente_validacion_junta_errores() {
    let db = setup_test_db().await;

    let input = ClienteInput {
        tipo_documento: "CARNET".to_string(),
        numero_documento: "".to_string(),
        nombres: "".to_string(),
        apellidos: "Quispe".to_string(),
        telefono: None,
        email: Some("no-es-un-email".to_string()),
        direccion: None,
        estado: None,
    };

    match cliente_service::create_cliente(&db, input).await {
        Err(ServiceError::Validacion(errores)) => {
            assert!(errores.len() >= 3);
            assert!(errores.iter().any(|e| e.contains("tipo de documento")));
            assert!(errores.iter().any(|e| e.contains("número de documento")));
            assert!(errores.iter().any(|e| e.contains("email")));
        }
        other => panic!("Expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_venta_metodo_pago_invalido() {
    let db = setup_test_db().await;
    let usuario_id = create_test_usuario(&db).await;
    let categoria_id = create_test_categoria(&db).await;
    let producto_id = create_test_producto(&db, categoria_id, "GAS001", 10).await;

    let mut input = venta_simple(producto_id, 1, 10.0);
    input.metodo_pago = "cheque".to_string();

    let result = venta_service::crear_venta(&db, usuario_id, input).await;
    assert!(matches!(result, Err(ServiceError::Validacion(_))));
    assert_eq!(stock_actual(&db, producto_id).await, 10);
}

#[tokio::test]
async fn test_venta_con_cliente_expandido() {
    let db = setup_test_db().await;
    let usuario_id = create_test_usuario(&db).await;
    let categoria_id = create_test_categoria(&db).await;
    let producto_id = create_test_producto(&db, categoria_id, "GAS001", 10).await;

    let now = chrono::Utc::now().to_rfc3339();
    let cliente_id = cliente::ActiveModel {
        tipo_documento: Set("DNI".to_string()),
        numero_documento: Set("12345678".to_string()),
        nombres: Set("Juan".to_string()),
        apellidos: Set("Pérez".to_string()),
        estado: Set(true),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&db)
    .await
    .unwrap()
    .id;

    let mut input = venta_simple(producto_id, 1, 10.0);
    input.cliente = Some(cliente_id);

    let venta = venta_service::crear_venta(&db, usuario_id, input)
        .await
        .unwrap();

    let cliente = venta.cliente.expect("Expected expanded customer");
    assert_eq!(cliente.numero_documento, "12345678");
    let operador = venta.usuario.expect("Expected expanded operator");
    assert_eq!(operador.email, "vendedor@test.com");
}
