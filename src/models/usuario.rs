use serde::{Deserialize, Serialize};
use validator::Validate;

use super::permission::Permissions;
use super::user::{BackendRole, Role, Theme};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstadoUsuario {
    Activo,
    Inactivo,
    Suspendido,
}

impl EstadoUsuario {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstadoUsuario::Activo => "activo",
            EstadoUsuario::Inactivo => "inactivo",
            EstadoUsuario::Suspendido => "suspendido",
        }
    }
}

/// Account row from the user management screens (`/api/users`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usuario {
    pub id: i64,
    pub nombre: String,
    pub apellido: String,
    pub email: String,
    #[serde(default)]
    pub username: Option<String>,
    pub rol: Role,
    pub estado: EstadoUsuario,
    #[serde(default)]
    pub fecha_creacion: String,
    #[serde(default)]
    pub ultimo_acceso: String,
    #[serde(default)]
    pub telefono: String,
    #[serde(default)]
    pub sucursal: String,
    #[serde(default)]
    pub tema: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub permisos: Permissions,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct CreateUsuarioRequest {
    #[validate(length(min = 1, message = "nombres is required"))]
    pub nombres: String,
    #[validate(length(min = 1, message = "apellidos is required"))]
    pub apellidos: String,
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    #[validate(email(message = "invalid email format"))]
    pub correo: String,
    #[validate(length(min = 8, message = "password must have at least 8 characters"))]
    pub password: String,
    pub role: BackendRole,
    pub telefono: String,
    pub sucursal: String,
    pub theme: Theme,
    pub estado: EstadoUsuario,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permisos: Option<Permissions>,
}

impl CreateUsuarioRequest {
    /// Builds a request the way the management screen does: username is the
    /// local part of the email and permissions start from the role preset.
    pub fn for_role(
        nombres: &str,
        apellidos: &str,
        correo: &str,
        password: &str,
        role: &Role,
    ) -> Self {
        let correo = correo.trim().to_string();
        let username = correo.split('@').next().unwrap_or_default().to_string();
        Self {
            nombres: nombres.trim().to_string(),
            apellidos: apellidos.trim().to_string(),
            username,
            correo,
            password: password.to_string(),
            role: role.to_backend(),
            telefono: String::new(),
            sucursal: String::new(),
            theme: Theme::System,
            estado: EstadoUsuario::Activo,
            permisos: Some(role.default_permissions()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_password_update"))]
pub struct UpdateUsuarioRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nombres: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apellidos: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(email(message = "invalid email format"))]
    pub correo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<BackendRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telefono: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sucursal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estado: Option<EstadoUsuario>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permisos: Option<Permissions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 8, message = "new password must have at least 8 characters"))]
    pub new_password: Option<String>,
}

/// Changing a password requires the current one.
fn validate_password_update(
    request: &UpdateUsuarioRequest,
) -> Result<(), validator::ValidationError> {
    let has_new = request
        .new_password
        .as_deref()
        .is_some_and(|p| !p.is_empty());
    let has_current = request
        .current_password
        .as_deref()
        .is_some_and(|p| !p.is_empty());
    if has_new && !has_current {
        let mut err = validator::ValidationError::new("current_password");
        err.message = Some("current password is required to change it".into());
        return Err(err);
    }
    Ok(())
}

/// List filters. `todos` in the UI means "no filter" and maps to `None`.
#[derive(Debug, Clone, Default)]
pub struct UsuarioFilters {
    pub search: Option<String>,
    pub role: Option<String>,
    pub estado: Option<String>,
    pub sucursal: Option<String>,
}

impl UsuarioFilters {
    pub(crate) fn query(&self, page: u32, limit: u32) -> Vec<(&'static str, String)> {
        let mut params = vec![("page", page.to_string()), ("limit", limit.to_string())];
        let wanted = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty() && *v != "todos")
                .map(str::to_string)
        };
        if let Some(search) = wanted(&self.search) {
            params.push(("search", search));
        }
        if let Some(role) = wanted(&self.role) {
            params.push(("role", role));
        }
        if let Some(estado) = wanted(&self.estado) {
            params.push(("estado", estado));
        }
        if let Some(sucursal) = wanted(&self.sucursal) {
            params.push(("sucursal", sucursal));
        }
        params
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub items_per_page: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UsuarioPage {
    pub users: Vec<Usuario>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UsuarioStats {
    pub total: u64,
    pub activos: u64,
    pub administradores: u64,
    pub asesores: u64,
    pub inactivos: u64,
}

/// `{ success, data, message }` envelope used by `/api/users`. Rejections
/// usually come without `data`.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl Ack {
    pub fn into_result(self) -> crate::error::Result<()> {
        if self.success {
            Ok(())
        } else {
            Err(crate::error::AppError::Rejected(
                self.message.unwrap_or_else(|| "request rejected".to_string()),
            ))
        }
    }
}

impl<T> Envelope<T> {
    pub fn into_result(self) -> crate::error::Result<T> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err(crate::error::AppError::Rejected(
                self.message.unwrap_or_else(|| "response carried no data".to_string()),
            )),
            (false, _) => Err(crate::error::AppError::Rejected(
                self.message.unwrap_or_else(|| "request rejected".to_string()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_from_role() {
        let request = CreateUsuarioRequest::for_role(
            " Luis ",
            "Paredes",
            "lparedes@creditpro.app",
            "s3cret-pass",
            &Role::Asesor,
        );
        assert_eq!(request.username, "lparedes");
        assert_eq!(request.role, BackendRole::User);
        assert_eq!(request.permisos, Some(Permissions::asesor()));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_create_request_rejects_short_password() {
        let request = CreateUsuarioRequest::for_role(
            "Luis",
            "Paredes",
            "lparedes@creditpro.app",
            "corta",
            &Role::Asesor,
        );
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_update_requires_current_password() {
        let request = UpdateUsuarioRequest {
            new_password: Some("nueva-clave-123".into()),
            ..Default::default()
        };
        assert!(request.validate().is_err());

        let request = UpdateUsuarioRequest {
            current_password: Some("vieja-clave".into()),
            new_password: Some("nueva-clave-123".into()),
            ..Default::default()
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_filters_skip_todos() {
        let filters = UsuarioFilters {
            search: Some("ana".into()),
            role: Some("todos".into()),
            estado: Some("activo".into()),
            sucursal: None,
        };
        assert_eq!(
            filters.query(2, 10),
            vec![
                ("page", "2".to_string()),
                ("limit", "10".to_string()),
                ("search", "ana".to_string()),
                ("estado", "activo".to_string()),
            ]
        );
    }

    #[test]
    fn test_rejection_without_data_is_rejected() {
        let body: Envelope<Usuario> = serde_json::from_value(serde_json::json!({
            "success": false,
            "message": "El correo ya está registrado"
        }))
        .unwrap();
        assert!(body.data.is_none());
        assert!(matches!(
            body.into_result(),
            Err(crate::error::AppError::Rejected(ref m)) if m == "El correo ya está registrado"
        ));

        let body: Envelope<UsuarioStats> = serde_json::from_value(serde_json::json!({
            "success": true
        }))
        .unwrap();
        assert!(matches!(
            body.into_result(),
            Err(crate::error::AppError::Rejected(_))
        ));
    }
}
