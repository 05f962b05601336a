use serde::Serialize;

use crate::models::PermissionModule;
use crate::services::PermissionEvaluator;

/// Dashboard sidebar entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Section {
    pub id: &'static str,
    pub label: &'static str,
    /// `None` means always visible.
    pub module: Option<PermissionModule>,
}

pub const SECTIONS: [Section; 11] = [
    Section { id: "dashboard", label: "Dashboard", module: None },
    Section { id: "clientes", label: "Clientes", module: Some(PermissionModule::Clientes) },
    Section { id: "asesores", label: "Asesores", module: Some(PermissionModule::Asesores) },
    Section { id: "bancos", label: "Bancos", module: Some(PermissionModule::Bancos) },
    Section { id: "financieras", label: "Financieras", module: Some(PermissionModule::Financieras) },
    Section { id: "creditos", label: "Créditos", module: Some(PermissionModule::Creditos) },
    Section { id: "objetivos", label: "Objetivos", module: Some(PermissionModule::Objetivos) },
    Section { id: "reportes", label: "Reportes", module: Some(PermissionModule::Reportes) },
    Section { id: "comisiones", label: "Comisiones", module: Some(PermissionModule::Comisiones) },
    Section {
        id: "gestion-usuarios",
        label: "Gestión de Usuarios",
        module: Some(PermissionModule::GestionUsuarios),
    },
    Section {
        id: "configuracion",
        label: "Configuración",
        module: Some(PermissionModule::Configuracion),
    },
];

/// Sections the user may open, in sidebar order.
pub fn visible_sections(permissions: &PermissionEvaluator<'_>) -> Vec<Section> {
    SECTIONS
        .iter()
        .filter(|section| section.module.map_or(true, |m| permissions.can_view(m)))
        .copied()
        .collect()
}
