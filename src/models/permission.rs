use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Functional area of the dashboard gated by its own permission flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionModule {
    Creditos,
    Clientes,
    Asesores,
    Bancos,
    Financieras,
    Objetivos,
    Reportes,
    Comisiones,
    Configuracion,
    GestionUsuarios,
}

impl PermissionModule {
    pub const ALL: [PermissionModule; 10] = [
        PermissionModule::Creditos,
        PermissionModule::Clientes,
        PermissionModule::Asesores,
        PermissionModule::Bancos,
        PermissionModule::Financieras,
        PermissionModule::Objetivos,
        PermissionModule::Reportes,
        PermissionModule::Comisiones,
        PermissionModule::Configuracion,
        PermissionModule::GestionUsuarios,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionModule::Creditos => "creditos",
            PermissionModule::Clientes => "clientes",
            PermissionModule::Asesores => "asesores",
            PermissionModule::Bancos => "bancos",
            PermissionModule::Financieras => "financieras",
            PermissionModule::Objetivos => "objetivos",
            PermissionModule::Reportes => "reportes",
            PermissionModule::Comisiones => "comisiones",
            PermissionModule::Configuracion => "configuracion",
            PermissionModule::GestionUsuarios => "gestionUsuarios",
        }
    }
}

impl fmt::Display for PermissionModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionModule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PermissionModule::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("unknown permission module: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionAction {
    Ver,
    Crear,
    Editar,
    Eliminar,
}

impl PermissionAction {
    pub const ALL: [PermissionAction; 4] = [
        PermissionAction::Ver,
        PermissionAction::Crear,
        PermissionAction::Editar,
        PermissionAction::Eliminar,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionAction::Ver => "ver",
            PermissionAction::Crear => "crear",
            PermissionAction::Editar => "editar",
            PermissionAction::Eliminar => "eliminar",
        }
    }
}

impl fmt::Display for PermissionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PermissionAction::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| format!("unknown permission action: {}", s))
    }
}

/// The four flags tracked per module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModulePermissions {
    #[serde(default)]
    pub ver: bool,
    #[serde(default)]
    pub crear: bool,
    #[serde(default)]
    pub editar: bool,
    #[serde(default)]
    pub eliminar: bool,
}

impl ModulePermissions {
    pub const fn new(ver: bool, crear: bool, editar: bool, eliminar: bool) -> Self {
        Self {
            ver,
            crear,
            editar,
            eliminar,
        }
    }

    pub const fn full() -> Self {
        Self::new(true, true, true, true)
    }

    pub const fn read_only() -> Self {
        Self::new(true, false, false, false)
    }

    pub fn allows(&self, action: PermissionAction) -> bool {
        match action {
            PermissionAction::Ver => self.ver,
            PermissionAction::Crear => self.crear,
            PermissionAction::Editar => self.editar,
            PermissionAction::Eliminar => self.eliminar,
        }
    }

    pub fn any(&self) -> bool {
        self.ver || self.crear || self.editar || self.eliminar
    }

    /// Only literal `true` grants a flag; anything else denies.
    fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let flag = |name: &str| object.get(name).and_then(Value::as_bool).unwrap_or(false);
        Some(Self::new(
            flag("ver"),
            flag("crear"),
            flag("editar"),
            flag("eliminar"),
        ))
    }
}

/// Per-module permission map as sent by the backend under `permisos`.
///
/// Deserialization never fails on content: unknown module keys are skipped
/// and entries that are not objects are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Permissions {
    modules: BTreeMap<PermissionModule, ModulePermissions>,
}

impl Permissions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, module: PermissionModule, flags: ModulePermissions) -> Self {
        self.modules.insert(module, flags);
        self
    }

    pub fn set(&mut self, module: PermissionModule, flags: ModulePermissions) {
        self.modules.insert(module, flags);
    }

    pub fn get(&self, module: PermissionModule) -> Option<&ModulePermissions> {
        self.modules.get(&module)
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PermissionModule, &ModulePermissions)> {
        self.modules.iter().map(|(m, p)| (*m, p))
    }

    /// Preset assigned to `administrador` accounts: everything.
    pub fn administrador() -> Self {
        PermissionModule::ALL
            .into_iter()
            .fold(Self::new(), |acc, m| acc.with(m, ModulePermissions::full()))
    }

    /// Preset assigned to `asesor` accounts.
    pub fn asesor() -> Self {
        use PermissionModule::*;

        let working = ModulePermissions::new(true, true, true, false);
        Self::new()
            .with(Creditos, working)
            .with(Clientes, working)
            .with(Asesores, ModulePermissions::read_only())
            .with(Bancos, ModulePermissions::read_only())
            .with(Financieras, ModulePermissions::read_only())
            .with(Objetivos, ModulePermissions::read_only())
            .with(Reportes, ModulePermissions::read_only())
            .with(Comisiones, ModulePermissions::read_only())
            .with(Configuracion, ModulePermissions::default())
            .with(GestionUsuarios, ModulePermissions::default())
    }

    fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let mut permissions = Self::new();
        for (key, entry) in object {
            let Ok(module) = key.parse::<PermissionModule>() else {
                tracing::debug!(module = %key, "ignoring unknown permission module");
                continue;
            };
            if let Some(flags) = ModulePermissions::from_value(entry) {
                permissions.set(module, flags);
            }
        }
        Some(permissions)
    }
}

impl Serialize for Permissions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.modules.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Permissions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Permissions::from_value(&value).unwrap_or_default())
    }
}

/// `permisos` field helper: `null` or a non-object value means "no map".
pub(crate) fn deserialize_optional_permissions<'de, D>(
    deserializer: D,
) -> Result<Option<Permissions>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(Permissions::from_value))
}
