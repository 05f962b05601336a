use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::utils::validate_periodo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TipoEntidad {
    Banco,
    Financiera,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EstadoComision {
    Pendiente,
    Pagado,
    Rechazado,
}

impl EstadoComision {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstadoComision::Pendiente => "Pendiente",
            EstadoComision::Pagado => "Pagado",
            EstadoComision::Rechazado => "Rechazado",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetodoPago {
    Transferencia,
    Efectivo,
    Cheque,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsesorRef {
    pub id: i64,
    pub nombre: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub cargo: String,
    #[serde(default)]
    pub sucursal: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BancoRef {
    pub id: i64,
    pub nombre: String,
    #[serde(default)]
    pub comisionban: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancieraRef {
    pub id: i64,
    pub nombre: String,
    #[serde(default)]
    pub comisionfin: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comision {
    pub id: i64,
    pub asesor_id: i64,
    #[serde(rename = "bancoid", default)]
    pub banco_id: Option<i64>,
    #[serde(default)]
    pub financiera_id: Option<i64>,
    pub tipo_entidad: TipoEntidad,
    /// `YYYY-MM`
    pub periodo: String,
    pub creditos_aprobados: u32,
    pub monto_total_gestionado: f64,
    pub comision_base: f64,
    pub bonificaciones: f64,
    pub deducciones: f64,
    pub comision_total: f64,
    pub estado: EstadoComision,
    pub fecha_calculo: String,
    #[serde(default)]
    pub fecha_pago: Option<String>,
    #[serde(default)]
    pub metodo_pago: Option<MetodoPago>,
    #[serde(default)]
    pub numero_transferencia: Option<String>,
    #[serde(default)]
    pub observaciones: Option<String>,
    #[serde(default)]
    pub asesor: Option<AsesorRef>,
    #[serde(default)]
    pub banco: Option<BancoRef>,
    #[serde(default)]
    pub financiera: Option<FinancieraRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumenComision {
    pub periodo: String,
    pub comision_total: f64,
    pub total_asesores: u32,
    pub total_monto: f64,
    pub pendientes: u32,
    pub pagados: u32,
    pub rechazados: u32,
    pub comisiones_bancos: f64,
    pub comisiones_financieras: f64,
}

#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CalcularComisionRequest {
    #[validate(custom(function = "validate_periodo"))]
    pub periodo: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asesor_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SistemaCalculo {
    #[serde(default)]
    pub descripcion: String,
    #[serde(default)]
    pub formula: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagoAutomatico {
    #[serde(default)]
    pub estado: String,
    #[serde(default)]
    pub fecha_pago: String,
    #[serde(default)]
    pub metodo_pago: String,
    #[serde(default)]
    pub observaciones: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArchivoGenerado {
    #[serde(default)]
    pub generado: bool,
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub ruta: String,
    #[serde(rename = "tamaño", default)]
    pub tamano: u64,
    #[serde(default)]
    pub contenido: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalcularComisionResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub periodo: String,
    #[serde(default)]
    pub asesor_id: Option<i64>,
    #[serde(default)]
    pub asesores_con_comision: u32,
    #[serde(default)]
    pub total_comisiones: f64,
    #[serde(default)]
    pub sistema_calculo: SistemaCalculo,
    #[serde(default)]
    pub pago_automatico: PagoAutomatico,
    #[serde(default)]
    pub detalle: Vec<serde_json::Value>,
    #[serde(default)]
    pub comisiones: Vec<Comision>,
    #[serde(default)]
    pub archivo: Option<ArchivoGenerado>,
}

#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_update_comision"))]
pub struct UpdateComisionRequest {
    pub estado: EstadoComision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha_pago: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metodo_pago: Option<MetodoPago>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numero_transferencia: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0))]
    pub bonificaciones: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0))]
    pub deducciones: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observaciones: Option<String>,
}

/// A commission can only move out of `Pendiente`.
fn validate_update_comision(
    request: &UpdateComisionRequest,
) -> Result<(), validator::ValidationError> {
    if request.estado == EstadoComision::Pendiente {
        let mut err = validator::ValidationError::new("estado");
        err.message = Some("estado must be Pagado or Rechazado".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct ComisionFilter {
    pub periodo: Option<String>,
    pub estado: Option<EstadoComision>,
}

impl ComisionFilter {
    pub(crate) fn query(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(periodo) = &self.periodo {
            params.push(("periodo", periodo.clone()));
        }
        if let Some(estado) = self.estado {
            params.push(("estado", estado.as_str().to_string()));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_comision_from_backend() {
        let comision: Comision = serde_json::from_value(json!({
            "id": 11,
            "asesorId": 4,
            "bancoid": 2,
            "tipoEntidad": "Banco",
            "periodo": "2024-07",
            "creditosAprobados": 5,
            "montoTotalGestionado": 125000.0,
            "comisionBase": 1250.0,
            "bonificaciones": 100.0,
            "deducciones": 0.0,
            "comisionTotal": 1350.0,
            "estado": "Pendiente",
            "fechaCalculo": "2024-08-01"
        }))
        .unwrap();
        assert_eq!(comision.banco_id, Some(2));
        assert_eq!(comision.estado, EstadoComision::Pendiente);
    }

    #[test]
    fn test_update_cannot_return_to_pending() {
        let request = UpdateComisionRequest {
            estado: EstadoComision::Pendiente,
            fecha_pago: None,
            metodo_pago: None,
            numero_transferencia: None,
            bonificaciones: None,
            deducciones: None,
            observaciones: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_calcular_rejects_bad_period() {
        let request = CalcularComisionRequest {
            periodo: "07-2024".into(),
            asesor_id: None,
        };
        assert!(request.validate().is_err());

        let request = CalcularComisionRequest {
            periodo: "2024-07".into(),
            asesor_id: Some(3),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_filter_query() {
        let filter = ComisionFilter {
            periodo: Some("2024-07".into()),
            estado: Some(EstadoComision::Pagado),
        };
        assert_eq!(
            filter.query(),
            vec![("periodo", "2024-07".to_string()), ("estado", "Pagado".to_string())]
        );
    }
}
