use std::net::SocketAddr;

use thiserror::Error;
use tower_cookies::Key;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Runtime settings, read from the environment (and `.env` via dotenvy).
#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub cors_origin: String,
    pub session_key: Key,
    pub run_migrations: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                name: "BIND_ADDR",
                reason: e.to_string(),
            })?;

        let cors_origin = lookup("CORS_ORIGIN").unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string());

        let session_key = match lookup("SESSION_SECRET") {
            Some(secret) => Key::try_from(secret.as_bytes()).map_err(|_| ConfigError::Invalid {
                name: "SESSION_SECRET",
                reason: "must be at least 64 bytes".to_string(),
            })?,
            None => {
                tracing::warn!("SESSION_SECRET not set, sessions will not survive a restart");
                Key::generate()
            }
        };

        let run_migrations = match lookup("RUN_MIGRATIONS").as_deref() {
            None | Some("1") | Some("true") => true,
            Some("0") | Some("false") => false,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "RUN_MIGRATIONS",
                    reason: format!("expected true or false, got {}", other),
                })
            }
        };

        Ok(Self {
            database_url,
            bind_addr,
            cors_origin,
            session_key,
            run_migrations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_only_database_is_set() {
        let cfg = config(&[("DATABASE_URL", "sqlite::memory:")]).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:8000".parse().unwrap());
        assert_eq!(cfg.cors_origin, DEFAULT_CORS_ORIGIN);
        assert!(cfg.run_migrations);
    }

    #[test]
    fn database_url_is_required() {
        assert!(matches!(config(&[]), Err(ConfigError::Missing("DATABASE_URL"))));
    }

    #[test]
    fn short_session_secret_is_rejected() {
        let err = config(&[("DATABASE_URL", "x"), ("SESSION_SECRET", "short")]);
        assert!(matches!(
            err,
            Err(ConfigError::Invalid {
                name: "SESSION_SECRET",
                ..
            })
        ));
    }

    #[test]
    fn overrides_are_parsed() {
        let secret = "s".repeat(64);
        let cfg = config(&[
            ("DATABASE_URL", "x"),
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("SESSION_SECRET", &secret),
            ("RUN_MIGRATIONS", "false"),
        ])
        .unwrap();
        assert_eq!(cfg.bind_addr.port(), 9000);
        assert!(!cfg.run_migrations);
    }
}
