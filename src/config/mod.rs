use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub realtime: RealtimeConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    /// Socket.IO server; the API base URL is used when unset.
    #[serde(default)]
    pub socket_url: Option<String>,
    #[serde(default = "default_socket_path")]
    pub socket_path: String,
}

/// Credentials used by the operator binary. The library never reads them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_socket_path() -> String {
    "/socket.io/".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Config {
    /// Loads defaults, then an optional `creditpro.toml`, then `CREDITPRO__*`
    /// environment variables (e.g. `CREDITPRO__API__BASE_URL`).
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .set_default("api.base_url", "http://localhost:3000")?
            .set_default("api.request_timeout_secs", 30)?
            .set_default("realtime.socket_path", "/socket.io/")?
            .set_default("export.output_dir", ".")?
            .add_source(config::File::with_name("creditpro").required(false))
            .add_source(config::Environment::with_prefix("CREDITPRO").separator("__"))
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Configuration pointing every endpoint at `base_url`.
    pub fn for_base_url(base_url: &str) -> Self {
        Self {
            api: ApiConfig {
                base_url: base_url.to_string(),
                request_timeout_secs: default_request_timeout_secs(),
            },
            realtime: RealtimeConfig {
                socket_url: None,
                socket_path: default_socket_path(),
            },
            auth: AuthConfig::default(),
            export: ExportConfig {
                output_dir: default_output_dir(),
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.api_base()?;
        self.socket_endpoint()?;
        if self.api.request_timeout_secs == 0 {
            return Err(AppError::Config(
                "api.request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_secs)
    }

    pub fn api_base(&self) -> Result<Url> {
        let url = Url::parse(self.api.base_url.trim_end_matches('/'))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(AppError::Config(format!(
                "api.base_url must be http(s), got {}",
                other
            ))),
        }
    }

    /// WebSocket URL of the Socket.IO endpoint (Engine.IO v4, websocket transport).
    pub fn socket_endpoint(&self) -> Result<Url> {
        let base = self
            .realtime
            .socket_url
            .as_deref()
            .unwrap_or(&self.api.base_url);
        let mut url = Url::parse(base)?;

        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(AppError::Config(format!(
                    "unsupported socket scheme: {}",
                    other
                )))
            }
        };
        url.set_scheme(scheme)
            .map_err(|_| AppError::Config(format!("cannot use scheme {}", scheme)))?;
        url.set_path(&self.realtime.socket_path);
        url.query_pairs_mut()
            .clear()
            .append_pair("EIO", "4")
            .append_pair("transport", "websocket");
        Ok(url)
    }
}
