use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};
use validator::Validate;

use super::{backend_message, ApiClient};
use crate::error::{AppError, Result};
use crate::models::{Ack, Credentials, PasswordChange, ProfileUpdate, Theme, User};

#[derive(Debug, Deserialize)]
struct UserResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    user: Option<User>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ThemeResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    theme: Option<Theme>,
    #[serde(default)]
    message: Option<String>,
}

/// `/api/auth/*`
pub struct AuthApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AuthApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Opens a cookie session. A 401 here means bad credentials, not an
    /// expired session.
    pub async fn login(&self, credentials: &Credentials) -> Result<User> {
        credentials.validate()?;
        let request = self
            .client
            .request(Method::POST, "/api/auth/login")?
            .json(credentials);
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            let message = backend_message(status, &body);
            warn!(username = %credentials.username, "login rejected");
            return Err(AppError::InvalidCredentials(message));
        }
        if !status.is_success() {
            return Err(super::error_from_response(response).await);
        }

        let body: UserResponse = response.json().await?;
        match body.user {
            Some(user) if body.success => {
                info!(user_id = user.id, role = %user.role.as_str(), "login succeeded");
                Ok(user)
            }
            _ => Err(AppError::InvalidCredentials(
                body.message
                    .unwrap_or_else(|| "authentication failed".to_string()),
            )),
        }
    }

    pub async fn logout(&self) -> Result<()> {
        let request = self.client.request(Method::POST, "/api/auth/logout")?;
        self.client.execute(request).await?;
        Ok(())
    }

    /// Current session user; `None` when the backend answers without one.
    pub async fn profile(&self) -> Result<Option<User>> {
        let body: UserResponse = self.client.get_json("/api/auth/perfil", &[]).await?;
        Ok(body.user.filter(|_| body.success))
    }

    /// Extends the session. `false` when the backend declines.
    pub async fn refresh_token(&self) -> Result<bool> {
        let request = self.client.request(Method::POST, "/api/auth/refresh-token")?;
        let ack: Ack = self.client.execute(request).await?.json().await?;
        Ok(ack.success)
    }

    pub async fn update_profile(&self, profile: ProfileUpdate) -> Result<User> {
        let profile = profile.normalized();
        profile.validate()?;
        let body: UserResponse = self
            .client
            .send_json(Method::PUT, "/api/auth/perfil", &profile)
            .await?;
        match body.user {
            Some(user) if body.success => Ok(user),
            _ => Err(AppError::Rejected(
                body.message
                    .unwrap_or_else(|| "profile update rejected".to_string()),
            )),
        }
    }

    pub async fn update_theme(&self, theme: Theme) -> Result<Theme> {
        let body: ThemeResponse = self
            .client
            .send_json(Method::PUT, "/api/auth/tema", &json!({ "theme": theme }))
            .await?;
        if !body.success {
            return Err(AppError::Rejected(
                body.message
                    .unwrap_or_else(|| "theme update rejected".to_string()),
            ));
        }
        Ok(body.theme.unwrap_or(theme))
    }

    pub async fn change_password(&self, user_id: i64, change: &PasswordChange) -> Result<()> {
        change.validate()?;
        let ack: Ack = self
            .client
            .send_json(
                Method::POST,
                "/api/auth/cambiar-password",
                &json!({
                    "userId": user_id,
                    "oldPassword": change.current_password,
                    "newPassword": change.new_password,
                }),
            )
            .await?;
        ack.into_result()
    }
}
