pub mod categoria;
pub mod cliente;
pub mod producto;
pub mod usuario;
pub mod venta;
pub mod venta_item;
