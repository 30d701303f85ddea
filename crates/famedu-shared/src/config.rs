//! Configuration management

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::constants::{
    DEFAULT_ACCESS_TOKEN_EXPIRY, DEFAULT_LOCKOUT_MINUTES, DEFAULT_LOCKOUT_SWEEP_SECS,
    DEFAULT_MAX_FAILED_ATTEMPTS, DEFAULT_REFRESH_TOKEN_EXPIRY,
};
use crate::error::AppError;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
    pub security: SecuritySettings,
    pub audit: AuditSettings,
    pub cors: CorsSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub env: String,
    pub host: String,
    pub port: u16,
    pub name: String,
    /// Directory for rolling log files; stdout only when unset.
    pub log_dir: Option<String>,
    /// Take the client address from `X-Forwarded-For`. Only enable behind a
    /// reverse proxy that overwrites the header.
    #[serde(default)]
    pub trust_forwarded_for: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub run_migrations: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub access_token_expiry: i64,
    pub refresh_token_expiry: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SecuritySettings {
    pub max_failed_attempts: u32,
    pub lockout_duration_minutes: i64,
    pub lockout_sweep_interval_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuditSettings {
    pub queue_capacity: usize,
    pub batch_size: usize,
    pub batch_timeout_ms: u64,
    pub worker_count: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsSettings {
    pub allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, AppError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let config = Config::builder()
            .set_default("app.env", "development")?
            .set_default("app.host", "127.0.0.1")?
            .set_default("app.port", 8080)?
            .set_default("app.name", "famedu-server")?
            .set_default("app.trust_forwarded_for", false)?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 1)?
            .set_default("database.run_migrations", true)?
            .set_default("jwt.access_token_expiry", DEFAULT_ACCESS_TOKEN_EXPIRY)?
            .set_default("jwt.refresh_token_expiry", DEFAULT_REFRESH_TOKEN_EXPIRY)?
            .set_default("security.max_failed_attempts", DEFAULT_MAX_FAILED_ATTEMPTS)?
            .set_default("security.lockout_duration_minutes", DEFAULT_LOCKOUT_MINUTES)?
            .set_default("security.lockout_sweep_interval_secs", DEFAULT_LOCKOUT_SWEEP_SECS)?
            .set_default("audit.queue_capacity", 10_000)?
            .set_default("audit.batch_size", 100)?
            .set_default("audit.batch_timeout_ms", 1000)?
            .set_default("audit.worker_count", 2)?
            .set_default("cors.allowed_origins", vec!["http://localhost:5173"])?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::default()
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins"),
            )
            .build()?;
        let config: AppConfig = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would leave the service misconfigured at runtime.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.jwt.secret.len() < 32 {
            return Err(AppError::InvalidConfig(
                "jwt.secret must be at least 32 bytes".into(),
            ));
        }
        if self.jwt.access_token_expiry <= 0 || self.jwt.refresh_token_expiry <= 0 {
            return Err(AppError::InvalidConfig("jwt expiries must be positive".into()));
        }
        if self.security.max_failed_attempts == 0 {
            return Err(AppError::InvalidConfig(
                "security.max_failed_attempts must be at least 1".into(),
            ));
        }
        if self.security.lockout_duration_minutes <= 0 {
            return Err(AppError::InvalidConfig(
                "security.lockout_duration_minutes must be positive".into(),
            ));
        }
        if self.audit.queue_capacity == 0 || self.audit.batch_size == 0 || self.audit.worker_count == 0 {
            return Err(AppError::InvalidConfig(
                "audit queue, batch and worker sizes must be positive".into(),
            ));
        }
        if self.database.min_connections > self.database.max_connections {
            return Err(AppError::InvalidConfig(
                "database.min_connections exceeds max_connections".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AppConfig {
        AppConfig {
            app: AppSettings {
                env: "test".into(),
                host: "127.0.0.1".into(),
                port: 8080,
                name: "famedu-server".into(),
                log_dir: None,
                trust_forwarded_for: false,
            },
            database: DatabaseSettings {
                url: "postgres://localhost/famedu".into(),
                max_connections: 10,
                min_connections: 1,
                run_migrations: false,
            },
            jwt: JwtSettings {
                secret: "0123456789abcdef0123456789abcdef".into(),
                access_token_expiry: 900,
                refresh_token_expiry: 3600,
            },
            security: SecuritySettings {
                max_failed_attempts: 5,
                lockout_duration_minutes: 15,
                lockout_sweep_interval_secs: 300,
            },
            audit: AuditSettings {
                queue_capacity: 100,
                batch_size: 10,
                batch_timeout_ms: 100,
                worker_count: 1,
            },
            cors: CorsSettings { allowed_origins: vec![] },
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut cfg = sample();
        cfg.security.max_failed_attempts = 0;
        assert!(matches!(cfg.validate(), Err(AppError::InvalidConfig(_))));
    }

    #[test]
    fn test_short_secret_rejected() {
        let mut cfg = sample();
        cfg.jwt.secret = "short".into();
        assert!(cfg.validate().is_err());
    }
}
