use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Cliente {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[validate(length(min = 1))]
    pub nombre: String,
    #[validate(length(min = 1))]
    pub apellido: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub dni: String,
    #[serde(default)]
    pub telefono: String,
    #[serde(default)]
    pub direccion: String,
    /// Backend key is all lowercase.
    #[serde(rename = "fechanacimiento", default)]
    pub fecha_nacimiento: String,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub ingresos_mensuales: f64,
    #[serde(default)]
    pub estado: String,
}

/// Partial update; only present fields are sent.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClienteUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nombre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apellido: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telefono: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direccion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingresos_mensuales: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estado: Option<String>,
}

/// Result of a bulk Excel import. The backend shape varies by version, so
/// only the counters are typed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportSummary {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, alias = "insertados", alias = "inserted")]
    pub imported: u32,
    #[serde(default, alias = "errores")]
    pub errors: Vec<serde_json::Value>,
}
