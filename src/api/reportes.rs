use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde::Deserialize;
use tracing::{info, warn};

use super::ApiClient;
use crate::error::Result;
use crate::models::{
    ExportFormat, ReporteAsesor, ReporteCredito, ReportePeriodo, ResumenBanco, ResumenEstado,
    ResumenFinanciera,
};
use crate::utils::DateRange;

/// Binary report as returned by `/api/reportes/exportar/{pdf|excel}`.
#[derive(Debug, Clone)]
pub struct ExportedReport {
    pub format: ExportFormat,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
    pub file_name: String,
}

impl ExportedReport {
    /// `reporte_creditos_<date>.<pdf|xlsx>`
    pub fn suggested_file_name(format: ExportFormat, date: NaiveDate) -> String {
        format!(
            "reporte_creditos_{}.{}",
            date.format("%Y-%m-%d"),
            format.extension()
        )
    }

    pub async fn save_to(&self, dir: &Path) -> Result<PathBuf> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(&self.file_name);
        tokio::fs::write(&path, &self.bytes).await?;
        info!(path = %path.display(), bytes = self.bytes.len(), "report saved");
        Ok(path)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> From<OneOrMany<T>> for Vec<T> {
    fn from(value: OneOrMany<T>) -> Self {
        match value {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

/// `/api/reportes`
pub struct ReportesApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ReportesApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn periodo(&self, range: &DateRange) -> Result<ReportePeriodo> {
        self.client
            .get_json("/api/reportes/periodo", &range.query())
            .await
    }

    pub async fn ranking_asesores(&self) -> Result<Vec<ReporteAsesor>> {
        self.client
            .get_json("/api/reportes/asesores/rankingasesores", &[])
            .await
    }

    /// Credit counts per month of `year`. Older backends answer with a
    /// single row instead of a list.
    pub async fn creditos_por_mes(&self, year: i32) -> Result<Vec<ReporteCredito>> {
        let rows: OneOrMany<ReporteCredito> = self
            .client
            .get_json("/api/reportes/creditos/meses", &[("year", year.to_string())])
            .await?;
        Ok(rows.into())
    }

    pub async fn resumen_bancos(&self) -> Result<Vec<ResumenBanco>> {
        self.client.get_json("/api/reportes/resumen/bancos", &[]).await
    }

    pub async fn resumen_financieras(&self) -> Result<Vec<ResumenFinanciera>> {
        self.client
            .get_json("/api/reportes/resumen/financieras", &[])
            .await
    }

    pub async fn resumen_estados(&self) -> Result<Vec<ResumenEstado>> {
        self.client.get_json("/api/reportes/resumen/estados", &[]).await
    }

    pub async fn exportar(&self, format: ExportFormat, range: &DateRange) -> Result<ExportedReport> {
        let path = format!("/api/reportes/exportar/{}", format.path_segment());
        let request = self.client.request(Method::POST, &path)?.json(range);
        let response = self.client.execute(request).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        if let Some(ct) = content_type.as_deref() {
            if !format.matches_content_type(ct) {
                warn!(%format, content_type = ct, "unexpected export content type");
            }
        }

        let bytes = response.bytes().await?.to_vec();
        info!(%format, bytes = bytes.len(), "report exported");
        Ok(ExportedReport {
            format,
            content_type,
            bytes,
            file_name: ExportedReport::suggested_file_name(format, Utc::now().date_naive()),
        })
    }
}
