//! Tally API configuration module.
//!
//! Configuration is layered, later sources overriding earlier ones:
//!
//! ```text
//! built-in defaults  →  tally.toml (optional)  →  TALLY__* environment
//! ```
//!
//! Environment keys use `__` between sections, e.g.
//! `TALLY__SERVER__PORT=9000` or `TALLY__DATABASE__PATH=/var/lib/tally.db`.

use config::{Config, Environment, File, Source};
use serde::{Deserialize, Serialize};
use tally_core::validation::validate_credit_term_days;
use tally_core::DEFAULT_CREDIT_TERM_DAYS;

/// Tally API configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub ledger: LedgerConfig,

    /// `tracing_subscriber::EnvFilter` directives, used when `RUST_LOG`
    /// is unset.
    pub log_filter: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,

    /// HTTP port
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file path, or `:memory:`
    pub path: String,

    /// Pool size
    pub max_connections: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Days until a credit sale is due when the till doesn't say
    pub default_credit_term_days: i64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                path: "./tally.db".to_string(),
                max_connections: 5,
            },
            ledger: LedgerConfig {
                default_credit_term_days: DEFAULT_CREDIT_TERM_DAYS,
            },
            log_filter: "info,tally=debug,sqlx=warn".to_string(),
        }
    }
}

impl ApiConfig {
    /// Load configuration from defaults, `tally.toml` and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::layered(File::with_name("tally").required(false))
    }

    fn layered<S>(file: S) -> Result<Self, ConfigError>
    where
        S: Source + Send + Sync + 'static,
    {
        let config: ApiConfig = Config::builder()
            .add_source(Config::try_from(&ApiConfig::default())?)
            .add_source(file)
            .add_source(
                Environment::with_prefix("TALLY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would only fail later, at bind or first request.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::InvalidValue("server.host".to_string()));
        }

        if self.database.path.trim().is_empty() {
            return Err(ConfigError::InvalidValue("database.path".to_string()));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "database.max_connections".to_string(),
            ));
        }

        validate_credit_term_days(self.ledger.default_credit_term_days)
            .map_err(|e| ConfigError::InvalidValue(format!("ledger.{}", e)))?;

        Ok(())
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
