//! Environment-driven configuration
//!
//! Read once at startup, after `.env` has been loaded.

use std::collections::HashMap;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} must be set")]
    Missing(&'static str),
}

/// Which store backs the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            _ => Err("expected postgres or memory".to_string()),
        }
    }
}

/// How presented API keys are checked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Any non-empty key is accepted
    Permissive,
    /// Only keys listed in `API_KEY_HASHES`
    Static,
}

impl FromStr for AuthMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "permissive" => Ok(AuthMode::Permissive),
            "static" => Ok(AuthMode::Static),
            _ => Err("expected permissive or static".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub environment: String,
    pub storage: StorageBackend,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub run_migrations: bool,
    pub auth_mode: AuthMode,
    pub api_key_hashes: Vec<String>,
}

impl Config {
    /// Loads configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars().collect())
    }

    /// Loads configuration from an explicit variable map
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(&vars, key);

        let port = parse_or("PORT", get("PORT"), 3000)?;
        let environment = get("APP_ENV").unwrap_or("development").to_string();
        let storage = parse_or("STORAGE_BACKEND", get("STORAGE_BACKEND"), StorageBackend::Postgres)?;
        let database_url = get("DATABASE_URL").map(str::to_string);
        let database_max_connections = parse_or("DATABASE_MAX_CONNECTIONS", get("DATABASE_MAX_CONNECTIONS"), 5)?;
        let run_migrations = parse_or("RUN_MIGRATIONS", get("RUN_MIGRATIONS"), true)?;

        let default_auth = if environment == "development" {
            AuthMode::Permissive
        } else {
            AuthMode::Static
        };
        let auth_mode = parse_or("AUTH_MODE", get("AUTH_MODE"), default_auth)?;
        let api_key_hashes: Vec<String> = get("API_KEY_HASHES")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|h| !h.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        if storage == StorageBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }
        if auth_mode == AuthMode::Static && api_key_hashes.is_empty() {
            return Err(ConfigError::Missing("API_KEY_HASHES"));
        }

        Ok(Self {
            port,
            environment,
            storage,
            database_url,
            database_max_connections,
            run_migrations,
            auth_mode,
            api_key_hashes,
        })
    }
}

fn lookup<'a>(vars: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn parse_or<T>(key: &'static str, value: Option<&str>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    match value {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn development_defaults_with_memory_store() {
        let config = Config::from_vars(vars(&[("STORAGE_BACKEND", "memory")])).unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.environment, "development");
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.auth_mode, AuthMode::Permissive);
        assert_eq!(config.database_max_connections, 5);
        assert!(config.run_migrations);
    }

    #[test]
    fn postgres_requires_database_url() {
        assert_eq!(
            Config::from_vars(vars(&[])),
            Err(ConfigError::Missing("DATABASE_URL"))
        );

        let config = Config::from_vars(vars(&[("DATABASE_URL", "postgres://localhost/agentshield")])).unwrap();
        assert_eq!(config.storage, StorageBackend::Postgres);
    }

    #[test]
    fn production_defaults_to_static_keys() {
        let result = Config::from_vars(vars(&[("APP_ENV", "production"), ("STORAGE_BACKEND", "memory")]));
        assert_eq!(result, Err(ConfigError::Missing("API_KEY_HASHES")));

        let config = Config::from_vars(vars(&[
            ("APP_ENV", "production"),
            ("STORAGE_BACKEND", "memory"),
            ("API_KEY_HASHES", "aa, bb,,"),
        ]))
        .unwrap();
        assert_eq!(config.auth_mode, AuthMode::Static);
        assert_eq!(config.api_key_hashes, vec!["aa".to_string(), "bb".to_string()]);
    }

    #[test]
    fn invalid_values_are_reported() {
        let result = Config::from_vars(vars(&[("STORAGE_BACKEND", "memory"), ("PORT", "eighty")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { key: "PORT", .. })));

        let result = Config::from_vars(vars(&[("STORAGE_BACKEND", "sqlite")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { key: "STORAGE_BACKEND", .. })));
    }
}
