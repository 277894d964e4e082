use std::{env, net::SocketAddr};

use crate::error::{AppError, Result};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3050";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub run_migrations: bool,
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick
    /// up a local `.env`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.is_empty())
            .ok_or_else(|| AppError::Config("DATABASE_URL must be set".into()))?;

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| AppError::Config(format!("invalid BIND_ADDR: {e}")))?;

        let max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|e| AppError::Config(format!("invalid DB_MAX_CONNECTIONS: {e}")))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let run_migrations = match lookup("RUN_MIGRATIONS").as_deref() {
            None | Some("1") | Some("true") => true,
            Some("0") | Some("false") => false,
            Some(other) => {
                return Err(AppError::Config(format!("invalid RUN_MIGRATIONS: {other}")));
            }
        };

        Ok(Self {
            database_url,
            bind_addr,
            max_connections,
            run_migrations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let config = config(&[("DATABASE_URL", "postgres://localhost/periods")]).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:3050".parse::<SocketAddr>().unwrap());
        assert_eq!(config.max_connections, 5);
        assert!(config.run_migrations);
    }

    #[test]
    fn missing_database_url_is_an_error() {
        assert!(matches!(config(&[]), Err(AppError::Config(_))));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = config(&[
            ("DATABASE_URL", "postgres://localhost/periods"),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("DB_MAX_CONNECTIONS", "12"),
            ("RUN_MIGRATIONS", "false"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.max_connections, 12);
        assert!(!config.run_migrations);
    }

    #[test]
    fn bad_values_are_rejected() {
        let url = ("DATABASE_URL", "postgres://localhost/periods");
        assert!(config(&[url, ("BIND_ADDR", "nowhere")]).is_err());
        assert!(config(&[url, ("DB_MAX_CONNECTIONS", "-1")]).is_err());
        assert!(config(&[url, ("RUN_MIGRATIONS", "maybe")]).is_err());
    }
}
