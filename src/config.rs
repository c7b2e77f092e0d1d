use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::error::DashboardError;
use crate::graph::GraphOptions;
use crate::login::{Credentials, default_users};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub data: DataConfig,
    pub auth: AuthConfig,
    pub session: SessionConfig,
    pub chart: GraphOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Where the flat files live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub catalog_path: String,
    pub images_dir: String,
    pub static_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// username → plaintext password
    pub users: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub ttl_hours: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            catalog_path: "fashion.csv".to_string(),
            images_dir: "images".to_string(),
            static_dir: "static".to_string(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            users: default_users(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { ttl_hours: 24 }
    }
}

impl AppConfig {
    /// Load configuration from defaults, an optional `explorer.*` file and
    /// `EXPLORER__`-prefixed environment variables, in that order
    pub fn load() -> Result<Self, DashboardError> {
        let config = ::config::Config::builder()
            .add_source(::config::Config::try_from(&AppConfig::default())?)
            .add_source(::config::File::with_name("explorer").required(false))
            .add_source(
                ::config::Environment::with_prefix("EXPLORER")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.auth.users.clone())
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session.ttl_hours * 60 * 60)
    }

    /// Get the server bind address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
