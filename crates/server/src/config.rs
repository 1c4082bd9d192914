use crate::model::types::Catalog;
use axum::http::{HeaderName, HeaderValue, Method};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::time::Duration;
use vcloud_common::prelude::{Error, Result};

/// Represents the application's configuration.
///
#[derive(Debug, Deserialize)]
pub struct Config {
    application: Application,
    pub token: TokenEnv,
    #[serde(default)]
    pub vcloud: VcloudEnv,
    pub cors: Cors,
    #[serde(default)]
    pub catalog: Catalog,
}

impl Config {
    /// Loads the configuration from the YAML files of the configuration
    /// directory, then from `APP__`-prefixed environment variables.
    ///
    pub fn from_env() -> Result<Self> {
        if dotenv::dotenv().is_ok() {
            tracing::info!(target: "config", ".env loaded.");
        }

        let config_dir = std::env::var("APP_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("configuration"));
        let env_filename = std::env::var("APP_ENVIRONMENT")
            .map(|value| Environment::from(value.as_str()))
            .unwrap_or(Environment::Local)
            .as_filename();

        let config = config::Config::builder()
            .add_source(config::File::from(config_dir.join("base.yaml")))
            .add_source(config::File::from(config_dir.join(env_filename)).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?
            .try_deserialize::<Config>()?;

        tracing::info!(
            target: "config",
            application = ?config.application,
            vcloud = ?config.vcloud,
            nodes = config.catalog.nodes.len(),
            "Configuration loaded."
        );

        Ok(config)
    }

    /// Returns the socket address for the application server to bind to.
    ///
    pub fn get_address(&self) -> Result<SocketAddr> {
        self.application.get_address()
    }
}

// -----------------------------------------------------------------------------

/// Configuration, specific to the application server.
///
#[derive(Debug, Deserialize)]
pub struct Application {
    host: String,
    port: u16,
}

impl Application {
    /// Constructs a `SocketAddr` from the configured host and port.
    ///
    pub fn get_address(&self) -> Result<SocketAddr> {
        let (host, port) = (self.host.as_str(), self.port);
        (host, port)
            .to_socket_addrs()?
            .next()
            .ok_or(Error::NotFound(format!("IP Address for {}:{}", host, port)))
    }
}

// -----------------------------------------------------------------------------

/// All settings required to work with JWT.
///
#[derive(Debug, Clone, Deserialize)]
pub struct TokenEnv {
    pub secret: SecretString,
    pub duration_sec: u64,
}

/// Settings of the outbound vCloud client.
///
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VcloudEnv {
    /// Additional login attempts after a first failure.
    pub auth_retries: u32,
    pub auth_timeout_ms: u64,
    /// Bound of every other outbound request.
    pub request_timeout_ms: u64,
    /// Accepts self-signed vCloud certificates.
    pub accept_invalid_certs: bool,
    /// Public download index scanned for the latest vCloud suite version.
    pub last_version_url: String,
}

impl VcloudEnv {
    pub fn auth_timeout(&self) -> Duration {
        Duration::from_millis(self.auth_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for VcloudEnv {
    fn default() -> Self {
        Self {
            auth_retries: 2,
            auth_timeout_ms: 5000,
            request_timeout_ms: 30000,
            accept_invalid_certs: false,
            last_version_url: "https://my.vmware.com/web/vmware/downloads?p_p_id=ProductIndexPortlet_WAR_itdownloadsportlet&p_p_lifecycle=2&p_p_resource_id=allProducts".to_owned(),
        }
    }
}

// -----------------------------------------------------------------------------

/// Represents the different environments the application can run in.
///
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    /// Returns the filename for the environment-specific configuration file.
    ///
    pub fn as_filename(&self) -> String {
        match self {
            Self::Local => "local.yaml",
            Self::Production => "production.yaml",
        }
        .to_owned()
    }
}

impl From<&str> for Environment {
    fn from(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "local" => Self::Local,
            "production" => Self::Production,
            _ => {
                tracing::warn!(target: "config", value, "Incorrect environment format. Use either `local` or `production`.");
                Self::Local
            }
        }
    }
}

// -----------------------------------------------------------------------------

/// Configuration for Cross-Origin Resource Sharing (CORS).
///
#[derive(Debug, Clone, Deserialize)]
pub struct Cors {
    origin: String,
    methods: String,
    headers: String,
}

impl Cors {
    /// Parses the configured origin into a `HeaderValue`, an empty value when
    /// it cannot be parsed.
    ///
    pub fn allow_origin(&self) -> HeaderValue {
        self.origin.parse().unwrap_or(HeaderValue::from_static(""))
    }

    /// Parses the comma-separated methods string. Invalid methods are ignored.
    ///
    pub fn allow_methods(&self) -> Vec<Method> {
        self.methods
            .split(',')
            .filter_map(|method| method.trim().parse().ok())
            .collect()
    }

    /// Parses the comma-separated headers string. Invalid headers are ignored.
    ///
    pub fn allow_headers(&self) -> Vec<HeaderName> {
        self.headers
            .split(',')
            .filter_map(|header| header.trim().parse().ok())
            .collect()
    }
}
