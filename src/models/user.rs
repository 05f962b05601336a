use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use validator::Validate;

use super::permission::{deserialize_optional_permissions, Permissions};

/// Role string as stored by the backend. Two vocabularies coexist:
/// `admin`/`user` on the wire and `administrador`/`asesor` in the UI.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Role {
    Admin,
    SuperAdmin,
    Administrador,
    Asesor,
    #[default]
    User,
    Other(String),
}

impl Role {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Role::Admin,
            "superadmin" | "super_admin" => Role::SuperAdmin,
            "administrador" => Role::Administrador,
            "asesor" => Role::Asesor,
            "user" => Role::User,
            _ => Role::Other(value.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::SuperAdmin => "superadmin",
            Role::Administrador => "administrador",
            Role::Asesor => "asesor",
            Role::User => "user",
            Role::Other(value) => value,
        }
    }

    /// Roles that bypass the permission map.
    pub fn is_admin_equivalent(&self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin | Role::Administrador)
    }

    /// Role value expected by `/api/users` writes.
    pub fn to_backend(&self) -> BackendRole {
        if self.is_admin_equivalent() {
            BackendRole::Admin
        } else {
            BackendRole::User
        }
    }

    /// Permission preset matching this role, used when creating accounts.
    pub fn default_permissions(&self) -> Permissions {
        if self.is_admin_equivalent() {
            Permissions::administrador()
        } else {
            Permissions::asesor()
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Role::parse(&value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendRole {
    Admin,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl Theme {
    /// Maps the Spanish UI values (`claro`, `oscuro`, `sistema`).
    pub fn from_ui(value: &str) -> Option<Self> {
        match value {
            "claro" | "light" => Some(Theme::Light),
            "oscuro" | "dark" => Some(Theme::Dark),
            "sistema" | "system" => Some(Theme::System),
            _ => None,
        }
    }

    pub fn to_ui(&self) -> &'static str {
        match self {
            Theme::Light => "claro",
            Theme::Dark => "oscuro",
            Theme::System => "sistema",
        }
    }
}

/// Authenticated user as returned by login and `/api/auth/perfil`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawUser")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    #[serde(rename = "permisos", skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Permissions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nombres: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apellidos: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telefono: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cargo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
}

/// Wire shape of a user. Older endpoints send `rol`/`nombre`/`apellido`,
/// newer ones `role`/`nombres`/`apellidos`; some send both.
#[derive(Deserialize)]
struct RawUser {
    id: i64,
    #[serde(default)]
    username: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    role: Option<Role>,
    #[serde(default)]
    rol: Option<Role>,
    #[serde(default, deserialize_with = "deserialize_optional_permissions")]
    permisos: Option<Permissions>,
    #[serde(default)]
    nombres: Option<String>,
    #[serde(default)]
    nombre: Option<String>,
    #[serde(default)]
    apellidos: Option<String>,
    #[serde(default)]
    apellido: Option<String>,
    #[serde(default)]
    correo: Option<String>,
    #[serde(default)]
    telefono: Option<String>,
    #[serde(default)]
    cargo: Option<String>,
    #[serde(default)]
    theme: Option<Theme>,
}

impl From<RawUser> for User {
    fn from(raw: RawUser) -> Self {
        Self {
            id: raw.id,
            username: raw.username,
            email: raw.email.or_else(|| raw.correo.clone()).unwrap_or_default(),
            role: raw.role.or(raw.rol).unwrap_or_default(),
            permissions: raw.permisos,
            nombres: raw.nombres.or(raw.nombre),
            apellidos: raw.apellidos.or(raw.apellido),
            correo: raw.correo,
            telefono: raw.telefono,
            cargo: raw.cargo,
            theme: raw.theme,
        }
    }
}

impl User {
    pub fn display_name(&self) -> String {
        match (&self.nombres, &self.apellidos) {
            (Some(n), Some(a)) => format!("{} {}", n, a),
            (Some(n), None) => n.clone(),
            _ => self.username.clone(),
        }
    }

    /// Shallow merge; fields absent from the patch keep their value.
    pub fn apply(&mut self, patch: UserPatch) {
        if let Some(v) = patch.username {
            self.username = v;
        }
        if let Some(v) = patch.email {
            self.email = v;
        }
        if let Some(v) = patch.role {
            self.role = v;
        }
        if let Some(v) = patch.permissions {
            self.permissions = Some(v);
        }
        if let Some(v) = patch.nombres {
            self.nombres = Some(v);
        }
        if let Some(v) = patch.apellidos {
            self.apellidos = Some(v);
        }
        if let Some(v) = patch.correo {
            self.correo = Some(v);
        }
        if let Some(v) = patch.telefono {
            self.telefono = Some(v);
        }
        if let Some(v) = patch.cargo {
            self.cargo = Some(v);
        }
        if let Some(v) = patch.theme {
            self.theme = Some(v);
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub permissions: Option<Permissions>,
    pub nombres: Option<String>,
    pub apellidos: Option<String>,
    pub correo: Option<String>,
    pub telefono: Option<String>,
    pub cargo: Option<String>,
    pub theme: Option<Theme>,
}

impl From<ProfileUpdate> for UserPatch {
    fn from(profile: ProfileUpdate) -> Self {
        Self {
            email: Some(profile.correo.clone()),
            nombres: Some(profile.nombres),
            apellidos: Some(profile.apellidos),
            correo: Some(profile.correo),
            telefono: profile.telefono,
            cargo: profile.cargo,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct Credentials {
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into().trim().to_string(),
            password: password.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct ProfileUpdate {
    #[validate(length(min = 1, message = "nombres is required"))]
    pub nombres: String,
    #[validate(length(min = 1, message = "apellidos is required"))]
    pub apellidos: String,
    #[validate(email(message = "invalid email format"))]
    pub correo: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telefono: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cargo: Option<String>,
}

impl ProfileUpdate {
    /// Trims every field and lower-cases the email, as the backend expects.
    pub fn normalized(self) -> Self {
        Self {
            nombres: self.nombres.trim().to_string(),
            apellidos: self.apellidos.trim().to_string(),
            correo: self.correo.trim().to_lowercase(),
            telefono: self.telefono.map(|t| t.trim().to_string()),
            cargo: self.cargo,
        }
    }
}

#[derive(Debug, Clone, Validate)]
#[validate(schema(function = "validate_password_confirmation"))]
pub struct PasswordChange {
    #[validate(length(min = 1, message = "current password is required"))]
    pub current_password: String,
    #[validate(length(min = 6, message = "new password must have at least 6 characters"))]
    pub new_password: String,
    pub confirm_password: String,
}

fn validate_password_confirmation(
    change: &PasswordChange,
) -> Result<(), validator::ValidationError> {
    if change.new_password != change.confirm_password {
        let mut err = validator::ValidationError::new("password_mismatch");
        err.message = Some("passwords do not match".into());
        return Err(err);
    }
    Ok(())
}
