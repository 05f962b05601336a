use reqwest::multipart::{Form, Part};
use reqwest::Method;
use validator::Validate;

use super::ApiClient;
use crate::error::Result;
use crate::models::{Cliente, ClienteUpdate, ImportSummary};

const EXCEL_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// `/api/clientes`
pub struct ClientesApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ClientesApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<Cliente>> {
        self.client.get_json("/api/clientes", &[]).await
    }

    pub async fn get(&self, id: &str) -> Result<Cliente> {
        self.client.get_json(&format!("/api/clientes/{}", id), &[]).await
    }

    pub async fn search(&self, term: &str) -> Result<Vec<Cliente>> {
        self.client
            .get_json("/api/clientes/search", &[("term", term.trim().to_string())])
            .await
    }

    pub async fn create(&self, cliente: &Cliente) -> Result<Cliente> {
        cliente.validate()?;
        self.client
            .send_json(Method::POST, "/api/clientes", cliente)
            .await
    }

    pub async fn update(&self, id: &str, changes: &ClienteUpdate) -> Result<Cliente> {
        self.client
            .send_json(Method::PUT, &format!("/api/clientes/{}", id), changes)
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.client.delete(&format!("/api/clientes/{}", id)).await?;
        Ok(())
    }

    /// Blank Excel template for bulk import.
    pub async fn template(&self) -> Result<Vec<u8>> {
        let request = self.client.request(Method::GET, "/api/clientes/template")?;
        let bytes = self.client.execute(request).await?.bytes().await?;
        Ok(bytes.to_vec())
    }

    pub async fn upload_excel(&self, file_name: &str, contents: Vec<u8>) -> Result<ImportSummary> {
        let part = Part::bytes(contents)
            .file_name(file_name.to_string())
            .mime_str(EXCEL_MIME)?;
        let form = Form::new().part("excel", part);
        let request = self
            .client
            .request(Method::POST, "/api/clientes/upload-excel")?
            .multipart(form);
        Ok(self.client.execute(request).await?.json().await?)
    }
}
