//! Service configuration

use anyhow::Result;
use fare_lib::DbConfig;
use serde::Deserialize;

/// Fare service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// HTTP port for the fare API
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Ride database host
    #[serde(default = "default_db_host")]
    pub db_host: String,

    /// Ride database port
    #[serde(default = "default_db_port")]
    pub db_port: u16,

    /// Ride database name
    #[serde(default = "default_db_name")]
    pub db_name: String,

    /// Ride database user
    #[serde(default = "default_db_user")]
    pub db_user: String,

    /// Ride database password
    #[serde(default = "default_db_password")]
    pub db_password: String,
}

fn default_http_port() -> u16 {
    5000
}

fn default_db_host() -> String {
    std::env::var("DB_HOST").unwrap_or_else(|_| "postgres".to_string())
}

fn default_db_port() -> u16 {
    5432
}

fn default_db_name() -> String {
    "rides_db".to_string()
}

fn default_db_user() -> String {
    "rides".to_string()
}

fn default_db_password() -> String {
    "rides".to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            http_port: default_http_port(),
            db_host: default_db_host(),
            db_port: default_db_port(),
            db_name: default_db_name(),
            db_user: default_db_user(),
            db_password: default_db_password(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from the environment (prefix `FARE_`)
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("FARE"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_default())
    }

    /// Database settings for the ride history supplier
    pub fn db_config(&self) -> DbConfig {
        DbConfig {
            host: self.db_host.clone(),
            port: self.db_port,
            dbname: self.db_name.clone(),
            user: self.db_user.clone(),
            password: self.db_password.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.http_port, 5000);
        assert_eq!(config.db_port, 5432);
        assert_eq!(config.db_name, "rides_db");
    }

    #[test]
    fn test_db_config_mapping() {
        let config = ServiceConfig {
            db_host: "db.internal".to_string(),
            db_port: 6543,
            ..ServiceConfig::default()
        };
        let db = config.db_config();
        assert_eq!(db.host, "db.internal");
        assert_eq!(db.port, 6543);
        assert_eq!(db.dbname, "rides_db");
    }
}
