//! Typed client for the CreditPro REST backend.
//!
//! Every call goes through [`ApiClient::execute`], which maps a 401 to
//! [`AppError::SessionExpired`] and any other non-success status to
//! [`AppError::Http`] carrying the backend's `message`.

use std::sync::Arc;

use reqwest::cookie::Jar;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::error::{AppError, Result};

mod auth;
mod chat;
mod clientes;
mod comisiones;
mod reportes;
mod usuarios;

pub use auth::AuthApi;
pub use chat::ChatApi;
pub use clientes::ClientesApi;
pub use comisiones::ComisionesApi;
pub use reportes::{ExportedReport, ReportesApi};
pub use usuarios::UsuariosApi;

/// Cookie-session HTTP client. Cloning shares the connection pool and the
/// cookie jar.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base: Url,
    cookies: Arc<Jar>,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let base = config.api_base()?;
        let cookies = Arc::new(Jar::default());
        let http = Client::builder()
            .cookie_provider(Arc::clone(&cookies))
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            http,
            base,
            cookies,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// The jar holding the session cookie, shared with the realtime
    /// handshake.
    pub fn cookie_jar(&self) -> Arc<Jar> {
        Arc::clone(&self.cookies)
    }

    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(self)
    }

    pub fn chat(&self) -> ChatApi<'_> {
        ChatApi::new(self)
    }

    pub fn clientes(&self) -> ClientesApi<'_> {
        ClientesApi::new(self)
    }

    pub fn comisiones(&self) -> ComisionesApi<'_> {
        ComisionesApi::new(self)
    }

    pub fn reportes(&self) -> ReportesApi<'_> {
        ReportesApi::new(self)
    }

    pub fn usuarios(&self) -> UsuariosApi<'_> {
        UsuariosApi::new(self)
    }

    pub(crate) fn url(&self, path: &str) -> Result<Url> {
        let base = self.base.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{}{}", base, path))?)
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        Ok(self.http.request(method, self.url(path)?))
    }

    /// Sends the request and turns non-success statuses into errors.
    pub(crate) async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        debug!(url = %response.url(), %status, "api response");
        if status.is_success() {
            return Ok(response);
        }
        Err(error_from_response(response).await)
    }

    pub(crate) async fn get_json<T>(&self, path: &str, query: &[(&str, String)]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let request = self.request(Method::GET, path)?.query(query);
        Ok(self.execute(request).await?.json().await?)
    }

    pub(crate) async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(method, path)?.json(body);
        Ok(self.execute(request).await?.json().await?)
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<Response> {
        let request = self.request(Method::DELETE, path)?;
        self.execute(request).await
    }
}

/// Builds the error for a non-success response. The body's `message` wins
/// over the status reason.
pub(crate) async fn error_from_response(response: Response) -> AppError {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return AppError::SessionExpired;
    }
    let body = response.text().await.unwrap_or_default();
    AppError::Http {
        status,
        message: backend_message(status, &body),
    }
}

pub(crate) fn backend_message(status: StatusCode, body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| v.get("message").or_else(|| v.get("error")))
        .and_then(|m| m.as_str())
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected response")
                .to_string()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_path_without_double_slash() {
        let client = ApiClient::new(&Config::for_base_url("http://localhost:3000/")).unwrap();
        assert_eq!(
            client.url("/api/clientes").unwrap().as_str(),
            "http://localhost:3000/api/clientes"
        );
    }

    #[test]
    fn test_backend_message_prefers_body() {
        assert_eq!(
            backend_message(StatusCode::CONFLICT, r#"{"message":"DNI duplicado"}"#),
            "DNI duplicado"
        );
        assert_eq!(
            backend_message(StatusCode::BAD_GATEWAY, "<html>"),
            "Bad Gateway"
        );
        assert_eq!(
            backend_message(StatusCode::BAD_REQUEST, r#"{"error":"Periodo inválido"}"#),
            "Periodo inválido"
        );
    }
}
