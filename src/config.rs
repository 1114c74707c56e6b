use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use crate::error::ConfigError;

// --- CONFIG AGGREGATOR ---

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub redis: RedisConfig,
}

impl Config {
    /// Reads `.env` (if present) and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Ok(Self {
            server: ServerConfig::load()?,
            redis: RedisConfig::load()?,
        })
    }
}

// --- MODULES ---

// SERVER
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

impl ServerConfig {
    fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            host:      get_env("SERVER_HOST", "0.0.0.0")?,
            port:      get_env("SERVER_PORT", "8000")?,
            log_level: get_env("KEYSCOPE_LOG", "info")?,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Filter for the tracing subscriber. Only valid after `Config::load` has read `.env`.
    pub fn log_filter(&self) -> EnvFilter {
        EnvFilter::new(&self.log_level)
    }
}

// REDIS
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub db: i64,
    /// COUNT hint per SCAN iteration while enumerating keys.
    pub scan_count: usize,
    pub batch_timeout_ms: u64,
    pub connect_timeout_ms: u64,
}

impl RedisConfig {
    fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            host:               get_env("REDIS_HOST", "127.0.0.1")?,
            port:               get_env("REDIS_PORT", "6379")?,
            username:           get_env_opt("REDIS_USERNAME"),
            password:           get_env_opt("REDIS_PASSWORD"),
            db:                 get_env("REDIS_DB", "0")?,
            scan_count:         get_env("REDIS_SCAN_COUNT", "1000")?,
            batch_timeout_ms:   get_env("REDIS_BATCH_TIMEOUT_MS", "5000")?,
            connect_timeout_ms: get_env("REDIS_CONNECT_TIMEOUT_MS", "3000")?,
        })
    }

    pub fn batch_timeout(&self) -> Duration {
        Duration::from_millis(self.batch_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            username: None,
            password: None,
            db: 0,
            scan_count: 1000,
            batch_timeout_ms: 5000,
            connect_timeout_ms: 3000,
        }
    }
}

// --- PRIVATE HELPERS ---

fn get_env<T: FromStr>(key: &str, default: &str) -> Result<T, ConfigError> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    parse_value(key, &raw)
}

fn get_env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Invalid {
        key: key.to_string(),
        value: raw.to_string(),
    })
}
