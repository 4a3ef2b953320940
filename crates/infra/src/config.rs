//! Configuration loading.
//!
//! Settings come from a TOML file (`QUILL_CONFIG`, default `quill.toml`; a
//! missing file means "all defaults") and are then overridden by environment
//! variables named `QUILL_<SECTION>__<KEY>`, a double underscore per level:
//!
//! ```text
//! QUILL_DB__URL=postgres://quill@localhost/quill
//! QUILL_INTERNAL_API__JWT_AUTHENTICATION__AUDIENCE=quill-internal
//! ```
//!
//! Override values are read as TOML literals when they parse as one (`60`,
//! `true`, `"0123"`) and as plain strings otherwise.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use quill_auth::JwtAuthenticationOptions;
use quill_observability::LoggingConfig;

pub const ENV_PREFIX: &str = "QUILL_";
pub const CONFIG_PATH_VAR: &str = "QUILL_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "quill.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub db: DbConfig,
    pub api: ApiConfig,
    pub internal_api: InternalApiConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// `postgres://...`, or `memory://` for a process-local store.
    pub url: String,
    pub max_connections: u32,
    /// Upper bound on waiting for a row lock. Unset means wait indefinitely.
    pub lock_timeout_ms: Option<u64>,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "memory://".to_string(),
            max_connections: 5,
            lock_timeout_ms: None,
        }
    }
}

impl DbConfig {
    pub fn is_in_memory(&self) -> bool {
        self.url.starts_with("memory:")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub bind: String,
    pub jwt_authentication: JwtAuthenticationOptions,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
            jwt_authentication: JwtAuthenticationOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InternalApiConfig {
    pub bind: String,
    pub jwt_authentication: JwtAuthenticationOptions,
    /// Agent name (`azp`) the admin panel's tokens carry.
    pub admin_panel_agent_name: String,
}

impl Default for InternalApiConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8001".to_string(),
            jwt_authentication: JwtAuthenticationOptions::default(),
            admin_panel_agent_name: "quill-admin".to_string(),
        }
    }
}

impl Config {
    /// Load from `QUILL_CONFIG` (or `quill.toml`) plus the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_raw(load_raw()?)
    }

    pub fn from_raw(raw: toml::Table) -> Result<Self, ConfigError> {
        toml::Value::Table(raw)
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::Invalid(e.to_string()))
    }

    /// Checks what serving the APIs needs beyond what deserialization guarantees.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, jwt) in [
            ("api", &self.api.jwt_authentication),
            ("internal_api", &self.internal_api.jwt_authentication),
        ] {
            for (field, value) in [
                ("public_key", &jwt.public_key),
                ("audience", &jwt.audience),
                ("issuer", &jwt.issuer),
            ] {
                if value.trim().is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "{name}.jwt_authentication.{field} must be set"
                    )));
                }
            }
        }
        Ok(())
    }
}

fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_PATH_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// The merged settings before they are typed, as `dev print-config --raw` shows them.
pub fn load_raw() -> Result<toml::Table, ConfigError> {
    let mut table = read_file(&config_path())?;
    apply_env_overrides(&mut table, std::env::vars())?;
    Ok(table)
}

fn read_file(path: &Path) -> Result<toml::Table, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(toml::Table::new());
        }
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    content.parse().map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn apply_env_overrides(
    table: &mut toml::Table,
    vars: impl IntoIterator<Item = (String, String)>,
) -> Result<(), ConfigError> {
    for (var, raw) in vars {
        if var == CONFIG_PATH_VAR {
            continue;
        }
        let Some(path) = var.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let keys: Vec<String> = path.split("__").map(str::to_lowercase).collect();
        if keys.iter().any(String::is_empty) {
            return Err(ConfigError::InvalidEnvVar {
                var,
                reason: "empty key segment".to_string(),
            });
        }
        insert(table, &keys, parse_value(&raw)).map_err(|reason| ConfigError::InvalidEnvVar {
            var: var.clone(),
            reason,
        })?;
    }
    Ok(())
}

fn parse_value(raw: &str) -> toml::Value {
    format!("v = {raw}")
        .parse::<toml::Table>()
        .ok()
        .and_then(|mut t| t.remove("v"))
        .unwrap_or_else(|| toml::Value::String(raw.to_string()))
}

fn insert(table: &mut toml::Table, keys: &[String], value: toml::Value) -> Result<(), String> {
    let (last, parents) = keys.split_last().ok_or_else(|| "empty key".to_string())?;
    let mut current = table;
    for key in parents {
        let entry = current
            .entry(key.clone())
            .or_insert_with(|| toml::Value::Table(toml::Table::new()));
        current = match entry {
            toml::Value::Table(t) => t,
            _ => return Err(format!("`{key}` is not a section")),
        };
    }
    current.insert(last.clone(), value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::Algorithm;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply_to_an_empty_table() {
        let config = Config::from_raw(toml::Table::new()).unwrap();
        assert!(config.db.is_in_memory());
        assert_eq!(config.api.jwt_authentication.algorithm, Algorithm::RS256);
        assert_eq!(config.api.jwt_authentication.leeway_secs, 60);
        assert_eq!(config.internal_api.admin_panel_agent_name, "quill-admin");
        assert!(config.validate().is_err());
    }

    #[test]
    fn file_values_and_env_overrides_merge() {
        let mut table: toml::Table = r#"
            [db]
            url = "postgres://localhost/quill"

            [internal_api.jwt_authentication]
            audience = "from-file"
            algorithm = "HS256"
        "#
        .parse()
        .unwrap();

        apply_env_overrides(
            &mut table,
            vars(&[
                ("QUILL_INTERNAL_API__JWT_AUTHENTICATION__AUDIENCE", "quill-internal"),
                ("QUILL_INTERNAL_API__JWT_AUTHENTICATION__LEEWAY_SECS", "5"),
                ("QUILL_DB__LOCK_TIMEOUT_MS", "2500"),
                ("QUILL_API__JWT_AUTHENTICATION__PUBLIC_KEY", "\"0123\""),
                ("HOME", "/root"),
            ]),
        )
        .unwrap();
        let config = Config::from_raw(table).unwrap();

        assert_eq!(config.db.url, "postgres://localhost/quill");
        assert_eq!(config.db.lock_timeout_ms, Some(2500));
        let internal = &config.internal_api.jwt_authentication;
        assert_eq!(internal.audience, "quill-internal");
        assert_eq!(internal.leeway_secs, 5);
        assert_eq!(internal.algorithm, Algorithm::HS256);
        assert_eq!(config.api.jwt_authentication.public_key, "0123");
    }

    #[test]
    fn unquoted_text_stays_a_string() {
        let mut table = toml::Table::new();
        apply_env_overrides(&mut table, vars(&[("QUILL_DB__URL", "memory://")])).unwrap();
        assert_eq!(table["db"]["url"].as_str(), Some("memory://"));
    }

    #[test]
    fn overriding_through_a_scalar_is_rejected() {
        let mut table: toml::Table = "db = 1".parse().unwrap();
        let err = apply_env_overrides(&mut table, vars(&[("QUILL_DB__URL", "x")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar { .. }));
    }

    #[test]
    fn validate_accepts_complete_settings() {
        let jwt = JwtAuthenticationOptions {
            public_key: "secret".into(),
            audience: "aud".into(),
            issuer: "iss".into(),
            ..Default::default()
        };
        let mut config = Config::default();
        config.api.jwt_authentication = jwt.clone();
        config.internal_api.jwt_authentication = jwt;
        assert!(config.validate().is_ok());
    }
}
