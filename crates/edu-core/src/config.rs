//! Configuration types and loading
//!
//! All settings come from environment variables with sensible defaults, so a
//! development instance starts without any configuration file.

use serde::{Deserialize, Serialize};

use crate::error::EduError;

/// Runtime environment, mirrors NODE_ENV-style deployment stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl Environment {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "development" => Some(Self::Development),
            "test" => Some(Self::Test),
            "production" => Some(Self::Production),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Test => "test",
            Self::Production => "production",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Authentication is bypassed outside production
    pub fn bypasses_authentication(&self) -> bool {
        !self.is_production()
    }
}

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseSettings,
    pub storage: StorageSettings,
    pub auth: AuthSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    /// Root directory for the local object store
    pub root: String,
    /// Base URL prefixed to public object URLs
    pub public_base_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthSettings {
    /// JWT secret for token verification
    pub jwt_secret: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 8080,
            },
            database: DatabaseSettings {
                url: "postgres://localhost/edurecords".into(),
                max_connections: 10,
            },
            storage: StorageSettings {
                root: "./storage".into(),
                public_base_url: "http://localhost:8080/files".into(),
            },
            auth: AuthSettings {
                jwt_secret: "dev-secret".into(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, EduError> {
        let defaults = Self::default();

        let environment = match std::env::var("APP_ENV") {
            Ok(value) => Environment::from_str(&value).ok_or_else(|| {
                EduError::Config(format!("unknown APP_ENV value: {value}"))
            })?,
            Err(_) => Environment::Development,
        };

        let config = Self {
            environment,
            server: ServerConfig {
                host: env_or("SERVER_HOST", defaults.server.host),
                port: env_parse("SERVER_PORT", defaults.server.port)?,
            },
            database: DatabaseSettings {
                url: env_or("DATABASE_URL", defaults.database.url),
                max_connections: env_parse("DB_MAX_CONNECTIONS", defaults.database.max_connections)?,
            },
            storage: StorageSettings {
                root: env_or("STORAGE_ROOT", defaults.storage.root),
                public_base_url: env_or("STORAGE_PUBLIC_URL", defaults.storage.public_base_url),
            },
            auth: AuthSettings {
                jwt_secret: env_or("JWT_SECRET", defaults.auth.jwt_secret),
            },
        };

        if config.environment.is_production() && config.auth.jwt_secret == "dev-secret" {
            return Err(EduError::Config(
                "JWT_SECRET must be set in production".into(),
            ));
        }

        Ok(config)
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T, EduError> {
    match std::env::var(key) {
        Ok(value) => value
            .parse()
            .map_err(|_| EduError::Config(format!("invalid value for {key}: {value}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parsing() {
        assert_eq!(
            Environment::from_str("production"),
            Some(Environment::Production)
        );
        assert_eq!(Environment::from_str("staging"), None);
    }

    #[test]
    fn test_bypass_outside_production() {
        assert!(Environment::Development.bypasses_authentication());
        assert!(Environment::Test.bypasses_authentication());
        assert!(!Environment::Production.bypasses_authentication());
    }

    #[test]
    fn test_server_addr() {
        let config = AppConfig::default();
        assert_eq!(config.server_addr(), "127.0.0.1:8080");
    }
}
