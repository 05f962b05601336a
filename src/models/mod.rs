mod chat;
mod cliente;
mod comision;
mod permission;
mod reporte;
mod user;
mod usuario;

pub use chat::*;
pub use cliente::*;
pub use comision::*;
pub use permission::{ModulePermissions, PermissionAction, PermissionModule, Permissions};
pub use reporte::*;
pub use user::*;
pub use usuario::*;
