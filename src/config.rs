//! Environment configuration
//!
//! Values are read once at start-up (after `dotenvy::dotenv()`) into plain
//! structs that are handed to constructors. Nothing here is global.

use std::env;
use std::time::Duration;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Deployment environment name (`APP_ENV`, default `sandbox`)
pub fn get_environment() -> String {
    env::var("APP_ENV").unwrap_or_else(|_| "sandbox".to_string())
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn parse_url(name: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })
}

/// A `user:password` pair for the data store
#[derive(Clone, PartialEq, Eq)]
pub struct StoreCredentials {
    pub user: String,
    pub password: String,
}

// Keeps passwords out of logs.
impl std::fmt::Debug for StoreCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreCredentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

impl StoreCredentials {
    pub fn parse(name: &'static str, raw: &str) -> Result<Self, ConfigError> {
        let (user, password) = raw.split_once(':').ok_or_else(|| ConfigError::Invalid {
            name,
            reason: "expected user:password".to_string(),
        })?;
        if user.is_empty() {
            return Err(ConfigError::Invalid {
                name,
                reason: "user must not be empty".to_string(),
            });
        }
        Ok(Self {
            user: user.to_string(),
            password: password.to_string(),
        })
    }

    fn from_env(name: &'static str) -> Result<Self, ConfigError> {
        Self::parse(name, &required(name)?)
    }
}

/// Which job store implementation to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl StoreBackend {
    fn from_env() -> Result<Self, ConfigError> {
        match env::var("STORE_BACKEND").as_deref() {
            Err(_) | Ok("postgres") => Ok(StoreBackend::Postgres),
            Ok("memory") => Ok(StoreBackend::Memory),
            Ok(other) => Err(ConfigError::Invalid {
                name: "STORE_BACKEND",
                reason: format!("expected 'postgres' or 'memory', got '{}'", other),
            }),
        }
    }
}

/// Store endpoint plus one credential
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub url: Url,
    pub credentials: StoreCredentials,
}

impl StoreConfig {
    /// Builds the connection string with the credentials spliced into the URL.
    pub fn connection_string(&self) -> Result<String, ConfigError> {
        let mut url = self.url.clone();
        let invalid = |_| ConfigError::Invalid {
            name: "STORE_URL",
            reason: "URL cannot carry credentials".to_string(),
        };
        url.set_username(&self.credentials.user).map_err(invalid)?;
        url.set_password(Some(&self.credentials.password))
            .map_err(invalid)?;
        Ok(url.to_string())
    }

    fn from_env(credentials_var: &'static str) -> Result<Self, ConfigError> {
        let url = parse_url("STORE_URL", &required("STORE_URL")?)?;
        Ok(Self {
            url,
            credentials: StoreCredentials::from_env(credentials_var)?,
        })
    }
}

/// Configuration for the fan-out API server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub backend: StoreBackend,
    /// Elevated credential; absent for the memory backend.
    pub store: Option<StoreConfig>,
    pub worker_url: Url,
    pub worker_wake_timeout: Duration,
    pub access_code_hash: String,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match env::var("PORT") {
            Ok(p) => p.parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                reason: format!("'{}' is not a port number", p),
            })?,
            Err(_) => 8080,
        };

        let backend = StoreBackend::from_env()?;
        let store = match backend {
            StoreBackend::Postgres => Some(StoreConfig::from_env("STORE_SERVICE_CREDENTIALS")?),
            StoreBackend::Memory => None,
        };

        let worker_url = parse_url("WORKER_URL", &required("WORKER_URL")?)?;

        let worker_wake_timeout = match env::var("WORKER_WAKE_TIMEOUT_SECONDS") {
            Ok(s) => Duration::from_secs(s.parse().map_err(|_| ConfigError::Invalid {
                name: "WORKER_WAKE_TIMEOUT_SECONDS",
                reason: format!("'{}' is not a whole number of seconds", s),
            })?),
            Err(_) => Duration::from_secs(10),
        };

        Ok(Self {
            port,
            backend,
            store,
            worker_url,
            worker_wake_timeout,
            access_code_hash: required("ACCESS_CODE_HASH")?,
        })
    }
}

/// Configuration for the terminal dashboard
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub api_url: Url,
    /// Restricted read credential.
    pub store: StoreConfig,
}

impl DashboardConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = env::var("TRADE_API_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8080".to_string());
        Ok(Self {
            api_url: parse_url("TRADE_API_URL", &api_url)?,
            store: StoreConfig::from_env("STORE_READ_CREDENTIALS")?,
        })
    }
}
