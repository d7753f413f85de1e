//! Runtime configuration from environment variables.
//!
//! `.env` is loaded first when present, then the process environment wins.

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub database_max_connections: u32,
    pub cache: CacheConfig,
}

/// Rule cache sizing
#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    pub rule_ttl: Duration,
    pub rule_capacity: u64,
    pub warm_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            rule_ttl: Duration::from_secs(300),
            rule_capacity: 1_000,
            warm_interval: Duration::from_secs(10 * 60),
        }
    }
}

impl Config {
    /// Load from `.env` and the environment
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is normal in production
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let defaults = CacheConfig::default();

        Ok(Self {
            database_url,
            bind_addr: parse_or(&lookup, "BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 8080)))?,
            database_max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            cache: CacheConfig {
                rule_ttl: Duration::from_secs(parse_or(
                    &lookup,
                    "RULE_CACHE_TTL_SECS",
                    defaults.rule_ttl.as_secs(),
                )?),
                rule_capacity: parse_or(&lookup, "RULE_CACHE_CAPACITY", defaults.rule_capacity)?,
                warm_interval: Duration::from_secs(parse_or(
                    &lookup,
                    "RULE_CACHE_WARM_SECS",
                    defaults.warm_interval.as_secs(),
                )?),
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}
