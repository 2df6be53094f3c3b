//! Configuration types.

use std::path::PathBuf;

use crate::error::ConfigError;

/// Minimum sign-up password length used when nothing is configured.
pub const DEFAULT_MIN_PASSWORD_LEN: usize = 6;

/// Service configuration, read from `KAJ_LAGBE_*` environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Path of the libSQL database file.
    pub db_path: PathBuf,
    /// Port the HTTP/WebSocket server binds on.
    pub port: u16,
    /// Minimum password length accepted by sign-up.
    pub min_password_len: usize,
    /// Load the bundled worker fixtures into an empty directory on startup.
    pub seed_fixtures: bool,
    /// Directory for rolling log files. Console only when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./data/kaj-lagbe.db"),
            port: 8080,
            min_password_len: DEFAULT_MIN_PASSWORD_LEN,
            seed_fixtures: true,
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Build configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let db_path = lookup("KAJ_LAGBE_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let port = match lookup("KAJ_LAGBE_PORT") {
            Some(raw) => parse_value("KAJ_LAGBE_PORT", &raw)?,
            None => defaults.port,
        };

        let min_password_len = match lookup("KAJ_LAGBE_MIN_PASSWORD_LEN") {
            Some(raw) => {
                let len: usize = parse_value("KAJ_LAGBE_MIN_PASSWORD_LEN", &raw)?;
                if len == 0 {
                    return Err(ConfigError::InvalidValue {
                        key: "KAJ_LAGBE_MIN_PASSWORD_LEN".to_string(),
                        message: "must be at least 1".to_string(),
                    });
                }
                len
            }
            None => defaults.min_password_len,
        };

        let seed_fixtures = match lookup("KAJ_LAGBE_SEED_FIXTURES") {
            Some(raw) => parse_bool("KAJ_LAGBE_SEED_FIXTURES", &raw)?,
            None => defaults.seed_fixtures,
        };

        let log_dir = lookup("KAJ_LAGBE_LOG_DIR")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            db_path,
            port,
            min_password_len,
            seed_fixtures,
            log_dir,
        })
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("{raw:?}: {e}"),
    })
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got {other:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.min_password_len, 6);
        assert!(config.seed_fixtures);
        assert!(config.log_dir.is_none());
        assert_eq!(config.db_path, PathBuf::from("./data/kaj-lagbe.db"));
    }

    #[test]
    fn reads_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("KAJ_LAGBE_DB_PATH", "/tmp/x.db"),
            ("KAJ_LAGBE_PORT", "9000"),
            ("KAJ_LAGBE_MIN_PASSWORD_LEN", "8"),
            ("KAJ_LAGBE_SEED_FIXTURES", "off"),
            ("KAJ_LAGBE_LOG_DIR", "/var/log/kaj"),
        ]))
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.port, 9000);
        assert_eq!(config.min_password_len, 8);
        assert!(!config.seed_fixtures);
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/kaj")));
    }

    #[test]
    fn rejects_bad_port() {
        let err = AppConfig::from_lookup(lookup_from(&[("KAJ_LAGBE_PORT", "eighty")])).unwrap_err();
        match err {
            ConfigError::InvalidValue { key, .. } => assert_eq!(key, "KAJ_LAGBE_PORT"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_zero_password_len() {
        assert!(
            AppConfig::from_lookup(lookup_from(&[("KAJ_LAGBE_MIN_PASSWORD_LEN", "0")])).is_err()
        );
    }

    #[test]
    fn rejects_garbage_bool() {
        assert!(AppConfig::from_lookup(lookup_from(&[("KAJ_LAGBE_SEED_FIXTURES", "maybe")])).is_err());
    }

    #[test]
    fn blank_log_dir_is_none() {
        let config = AppConfig::from_lookup(lookup_from(&[("KAJ_LAGBE_LOG_DIR", "  ")])).unwrap();
        assert!(config.log_dir.is_none());
    }
}
