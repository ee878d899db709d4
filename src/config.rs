use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Server address (e.g., "0.0.0.0:8080")
    #[serde(default = "default_addr")]
    pub addr: String,
    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Credential handling
    #[serde(default)]
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Database host
    #[serde(default = "default_db_host")]
    pub host: String,
    /// Database port
    #[serde(default = "default_db_port")]
    pub port: u16,
    /// Database name
    #[serde(default = "default_db_name", rename = "database")]
    pub name: String,
    /// Database user
    #[serde(default = "default_db_user", rename = "username")]
    pub user: String,
    /// Database password
    #[serde(default)]
    pub password: String,
    /// Full connection URL; takes precedence over the fields above
    #[serde(default)]
    pub url: Option<String>,
    /// Maximum pool size
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SecurityConfig {
    /// bcrypt work factor for stored passwords
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

// Default value functions
fn default_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_db_name() -> String {
    "orgadmin".to_string()
}

fn default_db_user() -> String {
    "postgres".to_string()
}

fn default_max_connections() -> u32 {
    20
}

fn default_bcrypt_cost() -> u32 {
    12
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            log: LogConfig::default(),
            database: DatabaseConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_db_host(),
            port: default_db_port(),
            name: default_db_name(),
            user: default_db_user(),
            password: String::new(),
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    /// Generate database connection URL. Only the postgres driver is compiled
    /// in, so the composed form is always a postgres URL.
    pub fn connection_url(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.name
        )
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
