use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{
    Credentials, PasswordChange, PermissionAction, PermissionModule, ProfileUpdate, Theme, User,
    UserPatch,
};
use crate::realtime::{ChatRelay, WsTransport};
use crate::services::navigation::{visible_sections, Section};
use crate::services::PermissionEvaluator;

/// Holds the logged-in user and ties the realtime relay to its lifetime.
pub struct AuthSession {
    api: ApiClient,
    relay: Arc<ChatRelay>,
    user: RwLock<Option<User>>,
}

impl AuthSession {
    pub fn new(api: ApiClient, relay: Arc<ChatRelay>) -> Self {
        Self {
            api,
            relay,
            user: RwLock::new(None),
        }
    }

    /// REST client plus a WebSocket relay that reuses its cookie jar.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api = ApiClient::new(config)?;
        let transport = WsTransport::new(config.socket_endpoint()?)
            .with_cookies(api.cookie_jar(), api.base_url().clone());
        let relay = Arc::new(ChatRelay::new(Arc::new(transport)));
        Ok(Self::new(api, relay))
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn relay(&self) -> &Arc<ChatRelay> {
        &self.relay
    }

    pub async fn login(&self, credentials: Credentials) -> Result<User> {
        let user = self.api.auth().login(&credentials).await?;
        self.start_session(user.clone()).await;
        Ok(user)
    }

    /// Restores a session from the cookie jar. `Ok(None)` when there is no
    /// valid session.
    pub async fn check_auth(&self) -> Result<Option<User>> {
        match self.api.auth().profile().await {
            Ok(Some(user)) => {
                self.start_session(user.clone()).await;
                Ok(Some(user))
            }
            Ok(None) | Err(AppError::SessionExpired) => {
                self.end_session().await;
                Ok(None)
            }
            Err(e) => {
                self.end_session().await;
                Err(e)
            }
        }
    }

    pub async fn logout(&self) {
        if let Err(e) = self.api.auth().logout().await {
            warn!(error = %e, "logout request failed");
        }
        self.end_session().await;
        info!("logged out");
    }

    pub fn current_user(&self) -> Option<User> {
        self.user.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.read().is_some()
    }

    /// Shallow merge into the current user; ignored when logged out.
    pub fn update_user(&self, patch: UserPatch) {
        if let Some(user) = self.user.write().as_mut() {
            user.apply(patch);
        }
    }

    /// Runs `f` with an evaluator over the current user.
    pub fn permissions<R>(&self, f: impl FnOnce(&PermissionEvaluator<'_>) -> R) -> R {
        let user = self.user.read();
        f(&PermissionEvaluator::new(user.as_ref()))
    }

    pub fn has_permission(&self, module: PermissionModule, action: PermissionAction) -> bool {
        self.permissions(|p| p.has_permission(module, action))
    }

    pub fn require(&self, module: PermissionModule, action: PermissionAction) -> Result<()> {
        self.permissions(|p| p.require(module, action))
    }

    pub fn visible_sections(&self) -> Vec<Section> {
        self.permissions(visible_sections)
    }

    /// Passes `result` through, ending the session first when it carries
    /// [`AppError::SessionExpired`].
    pub async fn guard<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if e.is_session_expired() {
                warn!("session expired, clearing local session");
                self.end_session().await;
            }
        }
        result
    }

    pub async fn update_profile(&self, profile: ProfileUpdate) -> Result<User> {
        let result = self.api.auth().update_profile(profile).await;
        let updated = self.guard(result).await?;
        let patch = UserPatch {
            nombres: updated.nombres.clone(),
            apellidos: updated.apellidos.clone(),
            correo: updated.correo.clone(),
            telefono: updated.telefono.clone(),
            cargo: updated.cargo.clone(),
            ..Default::default()
        };
        self.update_user(patch);
        Ok(updated)
    }

    pub async fn update_theme(&self, theme: Theme) -> Result<Theme> {
        let result = self.api.auth().update_theme(theme).await;
        let theme = self.guard(result).await?;
        self.update_user(UserPatch {
            theme: Some(theme),
            ..Default::default()
        });
        Ok(theme)
    }

    pub async fn change_password(&self, change: &PasswordChange) -> Result<()> {
        let user_id = self
            .user
            .read()
            .as_ref()
            .map(|u| u.id)
            .ok_or(AppError::NotAuthenticated)?;
        let result = self.api.auth().change_password(user_id, change).await;
        self.guard(result).await
    }

    async fn start_session(&self, user: User) {
        let user_id = user.id;
        *self.user.write() = Some(user);
        if let Err(e) = self.relay.connect(user_id).await {
            warn!(user_id, error = %e, "chat relay unavailable");
        }
    }

    async fn end_session(&self) {
        self.relay.disconnect().await;
        *self.user.write() = None;
    }
}
