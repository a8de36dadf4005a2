//! Service configuration, read once at startup and passed to constructors.

use std::time::Duration;

use thiserror::Error;

use crate::domain::order::LifecyclePolicy;

pub const DEFAULT_ORDERS_PORT: u16 = 3002;
pub const DEFAULT_ORCHESTRATOR_PORT: u16 = 3003;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has an invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerRegistryConfig {
    pub base_url: String,
    pub service_token: String,
}

/// Reads from:
/// - `HOST`, `PORT` (default `0.0.0.0` and the binary's own port)
/// - `DATABASE_URL` (orders API only)
/// - `CUSTOMERS_API_BASE`, `SERVICE_TOKEN`
/// - `ORDERS_API_BASE`
/// - `HTTP_TIMEOUT_MS` (default 5000)
/// - `CANCEL_WINDOW_MINUTES` (default 10), `IDEMPOTENCY_TTL_HOURS` (default 24)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub customers: CustomerRegistryConfig,
    pub orders_api_base: String,
    pub http_timeout: Duration,
    pub lifecycle: LifecyclePolicy,
}

impl Config {
    pub fn from_env(default_port: u16) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok(), default_port)
    }

    pub fn from_lookup<F>(lookup: F, default_port: u16) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = LifecyclePolicy::default();
        let cancel_window_minutes: i64 = parse_or(
            &lookup,
            "CANCEL_WINDOW_MINUTES",
            defaults.cancel_window.num_minutes(),
        )?;
        let idempotency_ttl_hours: i64 = parse_or(
            &lookup,
            "IDEMPOTENCY_TTL_HOURS",
            defaults.idempotency_ttl.num_hours(),
        )?;

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", default_port)?,
            database_url: lookup("DATABASE_URL"),
            customers: CustomerRegistryConfig {
                base_url: lookup("CUSTOMERS_API_BASE")
                    .unwrap_or_else(|| "http://localhost:3001".to_string()),
                service_token: lookup("SERVICE_TOKEN").unwrap_or_default(),
            },
            orders_api_base: lookup("ORDERS_API_BASE")
                .unwrap_or_else(|| format!("http://localhost:{DEFAULT_ORDERS_PORT}")),
            http_timeout: Duration::from_millis(parse_or(&lookup, "HTTP_TIMEOUT_MS", 5000)?),
            lifecycle: LifecyclePolicy {
                cancel_window: chrono::Duration::minutes(cancel_window_minutes),
                idempotency_ttl: chrono::Duration::hours(idempotency_ttl_hours),
            },
        })
    }

    pub fn database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or(ConfigError::Missing("DATABASE_URL"))
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => {
            let parsed = value.trim().parse();
            parsed.map_err(|_| ConfigError::Invalid { key, value })
        }
    }
}
