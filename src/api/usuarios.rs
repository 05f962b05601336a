use reqwest::Method;
use validator::Validate;

use super::ApiClient;
use crate::error::Result;
use crate::models::{
    Ack, CreateUsuarioRequest, Envelope, UpdateUsuarioRequest, Usuario, UsuarioFilters,
    UsuarioPage, UsuarioStats,
};

/// `/api/users`, the account management screen.
pub struct UsuariosApi<'a> {
    client: &'a ApiClient,
}

impl<'a> UsuariosApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, filters: &UsuarioFilters, page: u32, limit: u32) -> Result<UsuarioPage> {
        let body: Envelope<UsuarioPage> = self
            .client
            .get_json("/api/users", &filters.query(page.max(1), limit.max(1)))
            .await?;
        body.into_result()
    }

    pub async fn get(&self, id: i64) -> Result<Usuario> {
        let body: Envelope<Usuario> = self
            .client
            .get_json(&format!("/api/users/{}", id), &[])
            .await?;
        body.into_result()
    }

    pub async fn create(&self, request: &CreateUsuarioRequest) -> Result<Usuario> {
        request.validate()?;
        let body: Envelope<Usuario> = self
            .client
            .send_json(Method::POST, "/api/users", request)
            .await?;
        body.into_result()
    }

    pub async fn update(&self, id: i64, request: &UpdateUsuarioRequest) -> Result<Usuario> {
        request.validate()?;
        let body: Envelope<Usuario> = self
            .client
            .send_json(Method::PUT, &format!("/api/users/{}", id), request)
            .await?;
        body.into_result()
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let ack: Ack = self
            .client
            .delete(&format!("/api/users/{}", id))
            .await?
            .json()
            .await?;
        ack.into_result()
    }

    pub async fn stats(&self) -> Result<UsuarioStats> {
        let body: Envelope<UsuarioStats> = self.client.get_json("/api/users/stats", &[]).await?;
        body.into_result()
    }
}
