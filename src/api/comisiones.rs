use reqwest::Method;
use validator::Validate;

use super::ApiClient;
use crate::error::Result;
use crate::models::{
    CalcularComisionRequest, CalcularComisionResponse, Comision, ComisionFilter,
    ResumenComision, UpdateComisionRequest,
};
use crate::utils::validate_periodo;

/// `/api/comisiones`
pub struct ComisionesApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ComisionesApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, filter: &ComisionFilter) -> Result<Vec<Comision>> {
        self.client.get_json("/api/comisiones", &filter.query()).await
    }

    /// Runs the commission calculation for a month, optionally for one
    /// advisor only.
    pub async fn calcular(&self, request: &CalcularComisionRequest) -> Result<CalcularComisionResponse> {
        request.validate()?;
        self.client
            .send_json(Method::POST, "/api/comisiones/calcular", request)
            .await
    }

    pub async fn update(&self, id: i64, request: &UpdateComisionRequest) -> Result<Comision> {
        request.validate()?;
        self.client
            .send_json(Method::PUT, &format!("/api/comisiones/{}", id), request)
            .await
    }

    /// One summary row per period, as stored by the backend.
    pub async fn resumen(&self) -> Result<Vec<ResumenComision>> {
        self.client.get_json("/api/comisiones/resumen", &[]).await
    }

    pub async fn by_asesor(&self, asesor_id: i64, filter: &ComisionFilter) -> Result<Vec<Comision>> {
        self.client
            .get_json(&format!("/api/comisiones/asesor/{}", asesor_id), &filter.query())
            .await
    }

    pub async fn by_periodo(&self, periodo: &str, filter: &ComisionFilter) -> Result<Vec<Comision>> {
        check_periodo(periodo)?;
        let query: Vec<_> = filter
            .query()
            .into_iter()
            .filter(|(key, _)| *key != "periodo")
            .collect();
        self.client
            .get_json(&format!("/api/comisiones/periodo/{}", periodo), &query)
            .await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.client.delete(&format!("/api/comisiones/{}", id)).await?;
        Ok(())
    }
}

fn check_periodo(periodo: &str) -> Result<()> {
    validate_periodo(periodo).map_err(|e| {
        crate::error::AppError::Validation(
            e.message
                .map(|m| m.into_owned())
                .unwrap_or_else(|| format!("invalid periodo {}", periodo)),
        )
    })
}
