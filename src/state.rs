use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::config::Config;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool, owned by the composing application
    pub db: DatabaseConnection,
    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Database handle passed to every service call
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// bcrypt cost for newly stored passwords
    pub fn bcrypt_cost(&self) -> u32 {
        self.config.security.bcrypt_cost
    }
}
