//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `FORNO_DATABASE_URL` - `PostgreSQL` connection string
//!
//! ## Optional
//! - `FORNO_HOST` - Bind address (default: 127.0.0.1)
//! - `FORNO_PORT` - Listen port (default: 8000)
//! - `FORNO_COOKIE_SECURE` - Mark the session cookie Secure (default: false)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Tracing sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// API application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Whether the session cookie carries the Secure attribute
    pub cookie_secure: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
    /// Sentry performance traces sample rate
    pub sentry_traces_sample_rate: f32,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads `.env` via dotenvy first, so local development can keep
    /// settings in a file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or a
    /// value cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let database_url = SecretString::from(required("FORNO_DATABASE_URL")?);

        let host: IpAddr = optional("FORNO_HOST")
            .unwrap_or_else(|| "127.0.0.1".to_owned())
            .parse()
            .map_err(|e| ConfigError::InvalidEnvVar("FORNO_HOST".to_owned(), format!("{e}")))?;

        let port: u16 = optional("FORNO_PORT")
            .unwrap_or_else(|| "8000".to_owned())
            .parse()
            .map_err(|e| ConfigError::InvalidEnvVar("FORNO_PORT".to_owned(), format!("{e}")))?;

        let cookie_secure = parse_bool("FORNO_COOKIE_SECURE", false)?;

        let sentry_sample_rate = parse_f32("SENTRY_SAMPLE_RATE", 1.0)?;
        let sentry_traces_sample_rate = parse_f32("SENTRY_TRACES_SAMPLE_RATE", 0.0)?;

        Ok(Self {
            database_url,
            host,
            port,
            cookie_secure,
            sentry_dsn: optional("SENTRY_DSN"),
            sentry_environment: optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// The socket address to bind the server to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn required(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_owned()))
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_bool(name: &str, default: bool) -> Result<bool, ConfigError> {
    match optional(name) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            other => Err(ConfigError::InvalidEnvVar(
                name.to_owned(),
                format!("expected a boolean, got {other:?}"),
            )),
        },
    }
}

fn parse_f32(name: &str, default: f32) -> Result<f32, ConfigError> {
    match optional(name) {
        None => Ok(default),
        Some(v) => v
            .parse()
            .map_err(|e| ConfigError::InvalidEnvVar(name.to_owned(), format!("{e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_addr() {
        let config = ApiConfig {
            database_url: SecretString::from("postgres://localhost/forno".to_owned()),
            host: "0.0.0.0".parse().expect("valid ip"),
            port: 8000,
            cookie_secure: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8000");
    }
}
