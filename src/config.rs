//! Process configuration, read once at startup from the environment.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - PostgreSQL connection string
//! - `JWT_SECRET` - token signing key, at least 32 bytes
//!
//! ## Optional
//! - `HOST` - bind address (default: 127.0.0.1)
//! - `PORT` - listen port (default: 8080)
//! - `TOKEN_TTL_SECS` - bearer token lifetime (default: 86400)
//! - `DB_MAX_CONNECTIONS` - pool size (default: 10)
//! - `LOG_FORMAT` - `json` for JSON log lines, anything else for plain text
//! - `ADMIN_EMAIL`, `ADMIN_PASSWORD` - administrator ensured at startup; set both or neither
//! - `ADMIN_NAME` - display name for a newly created administrator (default: Administrator)

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(&'static str, String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

/// Administrator account provisioned at startup.
#[derive(Debug, Clone)]
pub struct AdminAccount {
    pub name: String,
    pub email: String,
    pub password: SecretString,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: SecretString,
    pub jwt_secret: SecretString,
    pub host: IpAddr,
    pub port: u16,
    pub token_ttl: Duration,
    pub db_max_connections: u32,
    pub log_format: LogFormat,
    pub admin: Option<AdminAccount>,
}

impl AppConfig {
    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::MissingEnvVar(key))
        };

        let database_url = SecretString::from(required("DATABASE_URL")?);
        let jwt_secret = SecretString::from(required("JWT_SECRET")?);
        if jwt_secret.expose_secret().len() < MIN_JWT_SECRET_LENGTH {
            return Err(ConfigError::InvalidEnvVar(
                "JWT_SECRET",
                format!("must be at least {MIN_JWT_SECRET_LENGTH} bytes"),
            ));
        }

        let log_format = match lookup("LOG_FORMAT").as_deref().map(str::trim) {
            Some(format) if format.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Plain,
        };

        let present = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let admin = match (present("ADMIN_EMAIL"), present("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminAccount {
                name: present("ADMIN_NAME").unwrap_or_else(|| "Administrator".to_string()),
                email,
                password: SecretString::from(password),
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::MissingEnvVar("ADMIN_PASSWORD")),
            (None, Some(_)) => return Err(ConfigError::MissingEnvVar("ADMIN_EMAIL")),
        };

        Ok(Self {
            database_url,
            jwt_secret,
            host: parse_or(&lookup, "HOST", IpAddr::V4(Ipv4Addr::LOCALHOST))?,
            port: parse_or(&lookup, "PORT", 8080)?,
            token_ttl: Duration::from_secs(parse_or(&lookup, "TOKEN_TTL_SECS", 86_400)?),
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            log_format,
            admin,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|err: T::Err| ConfigError::InvalidEnvVar(key, err.to_string())),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const SECRET: &str = "an-adequately-long-signing-key-0123456789";

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_to_optional_values() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/shop"), ("JWT_SECRET", SECRET)]).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8080");
        assert_eq!(config.token_ttl, Duration::from_secs(86_400));
        assert_eq!(config.db_max_connections, 10);
        assert_eq!(config.log_format, LogFormat::Plain);
        assert!(config.admin.is_none());
    }

    #[test]
    fn admin_account_is_read_when_complete() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/shop"),
            ("JWT_SECRET", SECRET),
            ("ADMIN_EMAIL", "ops@example.com"),
            ("ADMIN_PASSWORD", "long-enough-password"),
        ])
        .unwrap();
        let admin = config.admin.expect("admin configured");
        assert_eq!(admin.name, "Administrator");
        assert_eq!(admin.email, "ops@example.com");
        assert_eq!(admin.password.expose_secret(), "long-enough-password");
    }

    #[test]
    fn half_configured_admin_is_rejected() {
        let err = load(&[
            ("DATABASE_URL", "postgres://localhost/shop"),
            ("JWT_SECRET", SECRET),
            ("ADMIN_EMAIL", "ops@example.com"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar("ADMIN_PASSWORD")));

        let err = load(&[
            ("DATABASE_URL", "postgres://localhost/shop"),
            ("JWT_SECRET", SECRET),
            ("ADMIN_PASSWORD", "long-enough-password"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar("ADMIN_EMAIL")));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/shop"),
            ("JWT_SECRET", SECRET),
            ("HOST", "0.0.0.0"),
            ("PORT", "9000"),
            ("LOG_FORMAT", "JSON"),
        ])
        .unwrap();
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:9000");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn missing_database_url_is_reported() {
        let err = load(&[("JWT_SECRET", SECRET)]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar("DATABASE_URL")));
    }

    #[test]
    fn short_secret_is_rejected() {
        let err = load(&[("DATABASE_URL", "postgres://localhost/shop"), ("JWT_SECRET", "short")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar("JWT_SECRET", _)));
    }

    #[test]
    fn bad_port_is_reported() {
        let err = load(&[
            ("DATABASE_URL", "postgres://localhost/shop"),
            ("JWT_SECRET", SECRET),
            ("PORT", "eighty"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar("PORT", _)));
    }
}
