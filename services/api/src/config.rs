//! Server configuration loaded from the environment

use anyhow::Result;
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::jwt::JwtConfig;

/// Which document store backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(anyhow::anyhow!("Unknown STORE_BACKEND `{}`", other)),
        }
    }
}

/// Parse an optional setting; unset or empty falls back to `default`
pub(crate) fn env_or<T: FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid value `{}` for {}", value, key)),
        _ => Ok(default),
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub backend: StoreBackend,
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Create a new ServerConfig from environment variables
    ///
    /// # Environment Variables
    /// - `SERVER_HOST`: Bind address (default: 0.0.0.0)
    /// - `PORT`: Listen port (default: 8000)
    /// - `STORE_BACKEND`: `postgres` or `memory` (default: postgres)
    /// - `ACCESS_TOKEN_SECRET`, `ACCESS_TOKEN_EXPIRY`: see [`JwtConfig::from_env`]
    pub fn from_env() -> Result<Self> {
        let host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = env_or("PORT", 8000)?;

        let backend = match env::var("STORE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => StoreBackend::default(),
        };

        Ok(Self {
            host,
            port,
            backend,
            jwt: JwtConfig::from_env()?,
        })
    }

    /// Socket address to bind
    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid listen address: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear() {
        unsafe {
            env::remove_var("SERVER_HOST");
            env::remove_var("PORT");
            env::remove_var("STORE_BACKEND");
            env::remove_var("ACCESS_TOKEN_EXPIRY");
        }
    }

    #[test]
    #[serial]
    fn test_server_config_defaults() {
        clear();
        unsafe {
            env::set_var("ACCESS_TOKEN_SECRET", "secret");
        }

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8000);
        assert_eq!(config.backend, StoreBackend::Postgres);
        assert_eq!(config.jwt.access_token_expiry, 7200);
        assert_eq!(config.addr().unwrap().port(), 8000);

        unsafe {
            env::remove_var("ACCESS_TOKEN_SECRET");
        }
    }

    #[test]
    #[serial]
    fn test_server_config_custom_values() {
        clear();
        unsafe {
            env::set_var("ACCESS_TOKEN_SECRET", "secret");
            env::set_var("SERVER_HOST", "127.0.0.1");
            env::set_var("PORT", "3000");
            env::set_var("STORE_BACKEND", "memory");
        }

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.addr().unwrap().to_string(), "127.0.0.1:3000");
        assert_eq!(config.backend, StoreBackend::Memory);

        unsafe {
            env::set_var("STORE_BACKEND", "mongodb");
        }
        assert!(ServerConfig::from_env().is_err());

        unsafe {
            env::set_var("STORE_BACKEND", "memory");
            env::set_var("PORT", "eighty");
        }
        let err = ServerConfig::from_env().unwrap_err();
        assert_eq!(err.to_string(), "Invalid value `eighty` for PORT");

        unsafe {
            env::set_var("PORT", "");
        }
        assert_eq!(ServerConfig::from_env().unwrap().port, 8000);

        clear();
        unsafe {
            env::remove_var("ACCESS_TOKEN_SECRET");
        }
    }
}
