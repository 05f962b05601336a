use reqwest::StatusCode;

use crate::models::{PermissionAction, PermissionModule};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("connection error: {0}")]
    Network(String),

    #[error("session expired")]
    SessionExpired,

    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("request failed ({status}): {message}")]
    Http { status: StatusCode, message: String },

    #[error("validation failed: {0}")]
    Validation(String),

    /// The backend answered 2xx with `success: false`.
    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("access denied: {action} on {module}")]
    Forbidden {
        module: PermissionModule,
        action: PermissionAction,
    },

    #[error("not authenticated")]
    NotAuthenticated,

    #[error("realtime relay is not connected")]
    NotConnected,

    #[error("socket protocol error: {0}")]
    Protocol(String),

    #[error("socket transport error: {0}")]
    Transport(String),

    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// A response arrived but its body did not match the expected shape.
    #[error("invalid response body: {0}")]
    ResponseBody(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Whether the backend rejected the cookie session.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, AppError::SessionExpired)
    }

    /// HTTP status attached to the error, when the backend answered.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            AppError::Http { status, .. } => Some(*status),
            AppError::SessionExpired | AppError::InvalidCredentials(_) => {
                Some(StatusCode::UNAUTHORIZED)
            }
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            return AppError::ResponseBody(e.to_string());
        }
        AppError::Network(e.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(e: config::ConfigError) -> Self {
        AppError::Config(e.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(e: url::ParseError) -> Self {
        AppError::Config(format!("invalid url: {}", e))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for AppError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        AppError::Transport(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_expired_reports_unauthorized() {
        let err = AppError::SessionExpired;
        assert!(err.is_session_expired());
        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn test_forbidden_message_names_module_and_action() {
        let err = AppError::Forbidden {
            module: PermissionModule::Comisiones,
            action: PermissionAction::Eliminar,
        };
        assert_eq!(err.to_string(), "access denied: eliminar on comisiones");
    }

    #[test]
    fn test_http_error_carries_backend_message() {
        let err = AppError::Http {
            status: StatusCode::CONFLICT,
            message: "El DNI ya está registrado".to_string(),
        };
        assert_eq!(err.status(), Some(StatusCode::CONFLICT));
        assert!(err.to_string().contains("El DNI ya está registrado"));
    }
}
