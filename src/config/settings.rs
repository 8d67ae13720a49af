//! Runtime settings from the environment (`.env` honoured via dotenvy).

use crate::error::ConfigError;
use std::str::FromStr;

/// Value of `DATABASE_URL` that selects the in-process store instead of PostgreSQL.
pub const MEMORY_DATABASE_URL: &str = "memory";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub max_connections: u32,
    /// PostgreSQL schema holding the resource tables.
    pub schema: String,
    pub default_per_page: u32,
    pub max_per_page: u32,
    pub body_limit_bytes: usize,
    /// Asset version reported in client-bridge page objects.
    pub inertia_version: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_url: "postgres://localhost/catalog".into(),
            bind_addr: "0.0.0.0:3000".into(),
            max_connections: 5,
            schema: "public".into(),
            default_per_page: 15,
            max_per_page: 100,
            body_limit_bytes: 1024 * 1024,
            inertia_version: None,
        }
    }
}

impl AppConfig {
    /// Load `.env` if present, then read every setting, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = AppConfig::default();
        let config = AppConfig {
            database_url: lookup("DATABASE_URL").unwrap_or(d.database_url),
            bind_addr: lookup("BIND_ADDR").unwrap_or(d.bind_addr),
            max_connections: parsed(&lookup, "DATABASE_MAX_CONNECTIONS", d.max_connections)?,
            schema: lookup("CATALOG_SCHEMA").unwrap_or(d.schema),
            default_per_page: parsed(&lookup, "DEFAULT_PER_PAGE", d.default_per_page)?,
            max_per_page: parsed(&lookup, "MAX_PER_PAGE", d.max_per_page)?,
            body_limit_bytes: parsed(&lookup, "BODY_LIMIT_BYTES", d.body_limit_bytes)?,
            inertia_version: lookup("INERTIA_VERSION").filter(|s| !s.is_empty()),
        };
        if config.max_per_page == 0 {
            return Err(ConfigError::InvalidEnv {
                key: "MAX_PER_PAGE",
                value: "0".into(),
            });
        }
        if !is_identifier(&config.schema) {
            return Err(ConfigError::InvalidEnv {
                key: "CATALOG_SCHEMA",
                value: config.schema,
            });
        }
        Ok(config)
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database_url == MEMORY_DATABASE_URL
    }
}

fn parsed<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidEnv { key, value: raw }),
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let env: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn defaults_apply() {
        let c = from(&[]).unwrap();
        assert_eq!(c.default_per_page, 15);
        assert_eq!(c.schema, "public");
        assert!(!c.uses_memory_store());
    }

    #[test]
    fn overrides_and_memory_store() {
        let c = from(&[("DATABASE_URL", "memory"), ("MAX_PER_PAGE", "50"), ("INERTIA_VERSION", "abc")]).unwrap();
        assert!(c.uses_memory_store());
        assert_eq!(c.max_per_page, 50);
        assert_eq!(c.inertia_version.as_deref(), Some("abc"));
    }

    #[test]
    fn rejects_bad_numbers_and_schema_names() {
        assert!(matches!(
            from(&[("DEFAULT_PER_PAGE", "lots")]),
            Err(ConfigError::InvalidEnv { key: "DEFAULT_PER_PAGE", .. })
        ));
        assert!(from(&[("CATALOG_SCHEMA", "public; drop")]).is_err());
    }
}
