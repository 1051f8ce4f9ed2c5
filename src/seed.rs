use crate::auth::hash_password;
use crate::models::{categoria, cliente, producto, usuario};
use sea_orm::*;

/// Ensure the admin account exists. Safe to run on every startup.
pub async fn seed_admin(db: &DatabaseConnection) -> Result<(), DbErr> {
    let password = hash_password("admin123")
        .map_err(|e| DbErr::Custom(format!("Failed to hash admin password: {}", e)))?;

    let now = chrono::Utc::now().to_rfc3339();
    let admin = usuario::ActiveModel {
        name: Set("Administrador".to_owned()),
        email: Set("admin@lennin.com".to_owned()),
        password: Set(password),
        role: Set("admin".to_owned()),
        activo: Set(true),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };

    usuario::Entity::insert(admin)
        .on_conflict(
            sea_orm::sea_query::OnConflict::column(usuario::Column::Email)
                .do_nothing()
                .to_owned(),
        )
        .do_nothing()
        .exec(db)
        .await?;

    Ok(())
}

/// Seed a small demo inventory and customer set
pub async fn seed_demo_data(db: &DatabaseConnection) -> Result<(), DbErr> {
    let now = chrono::Utc::now().to_rfc3339();

    let bebidas = categoria::ActiveModel {
        nombre: Set("Bebidas".to_owned()),
        descripcion: Set(Some("Gaseosas, aguas y jugos".to_owned())),
        estado: Set(true),
        created_at: Set(now.clone()),
        updated_at: Set(now.clone()),
        ..Default::default()
    };
    let bebidas = bebidas.insert(db).await?;

    let abarrotes = categoria::ActiveModel {
        nombre: Set("Abarrotes".to_owned()),
        descripcion: Set(Some("Productos de primera necesidad".to_owned())),
        estado: Set(true),
        created_at: Set(now.clone()),
        updated_at: Set(now.clone()),
        ..Default::default()
    };
    let abarrotes = abarrotes.insert(db).await?;

    let productos = vec![
        ("GAS001", "Gaseosa Cola 500ml", bebidas.id, 1.8, 2.5, 48),
        ("AGU001", "Agua Mineral 625ml", bebidas.id, 0.8, 1.5, 60),
        ("ARR001", "Arroz Extra 1kg", abarrotes.id, 3.2, 4.5, 25),
        ("AZU001", "Azúcar Rubia 1kg", abarrotes.id, 3.5, 4.8, 18),
    ];

    for (codigo, nombre, categoria_id, compra, venta, stock) in productos {
        let producto = producto::ActiveModel {
            categoria_id: Set(categoria_id),
            codigo: Set(codigo.to_owned()),
            nombre: Set(nombre.to_owned()),
            precio_compra: Set(compra),
            precio_venta: Set(venta),
            stock: Set(stock),
            stock_minimo: Set(5),
            estado: Set(true),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
            ..Default::default()
        };
        producto.insert(db).await?;
    }

    let cliente = cliente::ActiveModel {
        tipo_documento: Set("DNI".to_owned()),
        numero_documento: Set("45678912".to_owned()),
        nombres: Set("María".to_owned()),
        apellidos: Set("Quispe Huamán".to_owned()),
        telefono: Set(Some("987654321".to_owned())),
        estado: Set(true),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };
    cliente.insert(db).await?;

    Ok(())
}
