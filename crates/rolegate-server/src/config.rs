//! Configuration management

use serde::{Deserialize, Serialize};

// ============================================================================
// Server Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Default database URL for local development.
pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost/rolegate";

/// Default maximum database connections in the business pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

/// Default minimum database connections in the business pool.
pub const DEFAULT_DATABASE_MIN_CONNECTIONS: u32 = 2;

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default database idle timeout in seconds (10 minutes).
pub const DEFAULT_DATABASE_IDLE_TIMEOUT_SECS: u64 = 600;

/// Default size of the dedicated audit pool.
pub const DEFAULT_AUDIT_MAX_CONNECTIONS: u32 = 4;

/// Development-only JWT secret. `validate()` warns when it is still in use.
pub const DEFAULT_JWT_SECRET: &str = "rolegate-dev-secret-change-me";

/// Default token lifetime in minutes (24 hours).
pub const DEFAULT_JWT_EXPIRE_MINUTES: i64 = 1440;

/// Default CORS allowed origin for local development.
pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub audit: AuditConfig,
    pub auth: AuthConfig,
    pub cors: CorsConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    /// Run embedded migrations at startup
    pub auto_migrate: bool,
}

/// Audit trail configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Connections in the pool reserved for audit reads and writes
    pub max_connections: u32,
}

/// Authentication and authorization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expire_minutes: i64,
    /// Enforce role/permission checks on management routes
    pub rbac_enforce: bool,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self::from_env();
        config.validate()?;

        Ok(config)
    }

    /// Read configuration from the current environment without validating
    pub fn from_env() -> Self {
        Config {
            server: ServerConfig {
                host: env_string("ROLEGATE_HOST", DEFAULT_SERVER_HOST),
                port: env_or("ROLEGATE_PORT", DEFAULT_SERVER_PORT),
                shutdown_timeout_secs: env_or(
                    "ROLEGATE_SHUTDOWN_TIMEOUT",
                    DEFAULT_SHUTDOWN_TIMEOUT_SECS,
                ),
            },
            database: DatabaseConfig {
                url: env_string("DATABASE_URL", DEFAULT_DATABASE_URL),
                max_connections: env_or(
                    "DATABASE_MAX_CONNECTIONS",
                    DEFAULT_DATABASE_MAX_CONNECTIONS,
                ),
                min_connections: env_or(
                    "DATABASE_MIN_CONNECTIONS",
                    DEFAULT_DATABASE_MIN_CONNECTIONS,
                ),
                connect_timeout_secs: env_or(
                    "DATABASE_CONNECT_TIMEOUT",
                    DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                ),
                idle_timeout_secs: env_or(
                    "DATABASE_IDLE_TIMEOUT",
                    DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
                ),
                auto_migrate: env_or("DATABASE_AUTO_MIGRATE", true),
            },
            audit: AuditConfig {
                max_connections: env_or("AUDIT_MAX_CONNECTIONS", DEFAULT_AUDIT_MAX_CONNECTIONS),
            },
            auth: AuthConfig {
                jwt_secret: env_string("JWT_SECRET", DEFAULT_JWT_SECRET),
                jwt_expire_minutes: env_or("JWT_EXPIRE_MINUTES", DEFAULT_JWT_EXPIRE_MINUTES),
                rbac_enforce: env_or("RBAC_ENFORCE", false),
            },
            cors: CorsConfig {
                allowed_origins: env_string("CORS_ALLOWED_ORIGINS", DEFAULT_CORS_ALLOWED_ORIGIN)
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                allow_credentials: env_or("CORS_ALLOW_CREDENTIALS", true),
            },
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }

        if self.database.max_connections == 0 {
            anyhow::bail!("Database max_connections must be greater than 0");
        }

        if self.database.min_connections > self.database.max_connections {
            anyhow::bail!(
                "Database min_connections ({}) cannot be greater than max_connections ({})",
                self.database.min_connections,
                self.database.max_connections
            );
        }

        // Audit writes must never wait behind business transactions.
        if self.audit.max_connections == 0 {
            anyhow::bail!("Audit max_connections must be greater than 0");
        }

        if self.auth.jwt_secret.is_empty() {
            anyhow::bail!("JWT secret cannot be empty");
        }

        if self.auth.jwt_expire_minutes <= 0 {
            anyhow::bail!("JWT expiry must be a positive number of minutes");
        }

        if self.auth.jwt_secret == DEFAULT_JWT_SECRET {
            tracing::warn!("JWT_SECRET is not set - using the development secret");
        }

        if self.cors.allowed_origins.is_empty() {
            tracing::warn!("No CORS origins configured - all origins will be allowed");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: DEFAULT_SERVER_PORT,
                shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            },
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
                min_connections: DEFAULT_DATABASE_MIN_CONNECTIONS,
                connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                idle_timeout_secs: DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
                auto_migrate: true,
            },
            audit: AuditConfig {
                max_connections: DEFAULT_AUDIT_MAX_CONNECTIONS,
            },
            auth: AuthConfig {
                jwt_secret: DEFAULT_JWT_SECRET.to_string(),
                jwt_expire_minutes: DEFAULT_JWT_EXPIRE_MINUTES,
                rbac_enforce: false,
            },
            cors: CorsConfig {
                allowed_origins: vec![DEFAULT_CORS_ALLOWED_ORIGIN.to_string()],
                allow_credentials: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.auth.jwt_expire_minutes, 1440);
        assert!(!config.auth.rbac_enforce);
    }

    #[test]
    fn test_rejects_zero_audit_pool() {
        let mut config = Config::default();
        config.audit.max_connections = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_min_above_max_connections() {
        let mut config = Config::default();
        config.database.min_connections = 20;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_positive_expiry() {
        let mut config = Config::default();
        config.auth.jwt_expire_minutes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_from_env_reads_overrides() {
        std::env::set_var("ROLEGATE_PORT", "9100");
        std::env::set_var("AUDIT_MAX_CONNECTIONS", "2");
        std::env::set_var("RBAC_ENFORCE", "true");
        std::env::set_var("CORS_ALLOWED_ORIGINS", "https://a.example, https://b.example");

        let config = Config::from_env();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.audit.max_connections, 2);
        assert!(config.auth.rbac_enforce);
        assert_eq!(
            config.cors.allowed_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );

        std::env::remove_var("ROLEGATE_PORT");
        std::env::remove_var("AUDIT_MAX_CONNECTIONS");
        std::env::remove_var("RBAC_ENFORCE");
        std::env::remove_var("CORS_ALLOWED_ORIGINS");
    }

    #[test]
    #[serial]
    fn test_from_env_ignores_unparseable_values() {
        std::env::set_var("ROLEGATE_PORT", "not-a-port");
        let config = Config::from_env();
        assert_eq!(config.server.port, DEFAULT_SERVER_PORT);
        std::env::remove_var("ROLEGATE_PORT");
    }

    #[test]
    fn test_jwt_secret_not_serialized() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(!json.contains(DEFAULT_JWT_SECRET));
    }
}
