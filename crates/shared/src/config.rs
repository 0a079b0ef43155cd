//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Exchange-rate configuration.
    #[serde(default)]
    pub currency: CurrencyConfig,
    /// Log output configuration.
    #[serde(default)]
    pub log: LogConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum accepted request body, in bytes.
    #[serde(default = "default_request_body_limit")]
    pub request_body_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_body_limit: default_request_body_limit(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_body_limit() -> usize {
    4096
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// How long to wait for a pooled connection.
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    /// Deadline for one atomic mutation scope, begin to commit.
    #[serde(default = "default_mutation_timeout")]
    pub mutation_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_acquire_timeout() -> u64 {
    5
}

fn default_mutation_timeout() -> u64 {
    10
}

/// Exchange-rate provider and cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrencyConfig {
    /// API key for the rate provider.
    #[serde(default)]
    pub api_key: String,
    /// Endpoint returning the latest rates.
    #[serde(default = "default_rates_url")]
    pub base_url: String,
    /// How long fetched rates stay fresh.
    #[serde(default = "default_rates_ttl")]
    pub ttl_secs: u64,
    /// Timeout for one provider request.
    #[serde(default = "default_rates_timeout")]
    pub request_timeout_secs: u64,
    /// Idle keep-alive connections kept per provider host.
    #[serde(default = "default_max_idle_connections")]
    pub max_idle_connections: usize,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_rates_url(),
            ttl_secs: default_rates_ttl(),
            request_timeout_secs: default_rates_timeout(),
            max_idle_connections: default_max_idle_connections(),
        }
    }
}

fn default_rates_url() -> String {
    "https://freecurrencyapi.net/api/v2/latest".to_string()
}

fn default_rates_ttl() -> u64 {
    600 // 10 minutes
}

fn default_rates_timeout() -> u64 {
    5
}

fn default_max_idle_connections() -> usize {
    128
}

/// Log output configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            json: false,
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "moneta=debug,tower_http=debug".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("MONETA").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
