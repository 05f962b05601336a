use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportePeriodo {
    pub creditos_aprobados: u32,
    pub creditos_rechazados: u32,
    pub creditos_pendientes: u32,
    pub monto_total: f64,
    pub tasa_aprobacion: f64,
    pub comisiones_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReporteCredito {
    pub creditos_aprobados: u32,
    pub creditos_rechazados: u32,
    pub creditos_pendientes: u32,
    #[serde(rename = "mesnum")]
    pub mes_num: u32,
    pub mes: String,
}

/// Advisor ranking row. The backend sends both a machine-friendly and a
/// display-ready version of each column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReporteAsesor {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub creditos: u32,
    #[serde(rename = "montoGestionado", default)]
    pub monto_gestionado: f64,
    #[serde(default)]
    pub comisiones: f64,
    #[serde(default)]
    pub rendimiento: f64,
    #[serde(rename = "Posicion", default)]
    pub posicion: u32,
    #[serde(rename = "Asesor", default)]
    pub asesor_label: String,
    #[serde(rename = "Monto Gestionado", default)]
    pub monto_gestionado_label: String,
    #[serde(rename = "Comisiones", default)]
    pub comisiones_label: String,
    #[serde(rename = "Rendimiento", default)]
    pub rendimiento_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumenEntidad {
    /// The backend uses `banco` for both banks and lenders.
    pub banco: String,
    pub total_creditos: u32,
    pub total_monto: f64,
}

pub type ResumenBanco = ResumenEntidad;
pub type ResumenFinanciera = ResumenEntidad;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumenEstado {
    pub estado: String,
    pub cantidad: u32,
    pub porcentaje: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Excel,
}

impl ExportFormat {
    pub fn path_segment(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Excel => "excel",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Excel => "xlsx",
        }
    }

    /// Whether a `Content-Type` header looks like this format.
    pub fn matches_content_type(&self, content_type: &str) -> bool {
        match self {
            ExportFormat::Pdf => content_type.contains("pdf"),
            ExportFormat::Excel => {
                content_type.contains("spreadsheet") || content_type.contains("excel")
            }
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ranking_row_with_display_columns() {
        let row: ReporteAsesor = serde_json::from_value(json!({
            "Posicion": 1,
            "Asesor": "Carla Méndez",
            "Creditos": 14,
            "Monto Gestionado": "$ 320.000",
            "Comisiones": "$ 3.200",
            "Rendimiento": "92%"
        }))
        .unwrap();
        assert_eq!(row.posicion, 1);
        assert_eq!(row.asesor_label, "Carla Méndez");
        assert_eq!(row.creditos, 0);
    }

    #[test]
    fn test_export_content_types() {
        assert!(ExportFormat::Excel.matches_content_type(
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        ));
        assert!(!ExportFormat::Pdf.matches_content_type("text/html"));
    }
}
