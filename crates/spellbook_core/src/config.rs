//! Configuration loading from environment variables.

use crate::constants::{DEFAULT_MAX_BODY_SIZE, DEFAULT_PORT};
use crate::error::AppError;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Storage implementation selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// `spells.json` / `trash.json` in the data directory.
    JsonFile,
    /// Embedded redb tables in the data directory.
    Table,
}

impl StoreBackend {
    /// Stable name used in config values and log lines.
    pub fn as_str(self) -> &'static str {
        match self {
            StoreBackend::JsonFile => "json",
            StoreBackend::Table => "table",
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreBackend {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" | "file" => Ok(StoreBackend::JsonFile),
            "table" | "redb" => Ok(StoreBackend::Table),
            other => Err(AppError::Config(format!(
                "Unknown SPELLBOOK_STORE '{}': expected 'json' or 'table'",
                other
            ))),
        }
    }
}

/// Runtime configuration for the Spellbook server.
#[derive(Debug, Clone)]
pub struct Config {
    pub store: StoreBackend,
    pub data_dir: PathBuf,
    pub port: u16,
    pub max_body_size: usize,
    /// Explicit CORS allow-list. Empty means "loopback origins on `port`".
    pub cors_origins: Vec<String>,
}

/// Expand tilde (~) in paths to the user's home directory
fn expand_tilde(path: String) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = resolve_home_dir() {
            return home.join(rest).to_string_lossy().to_string();
        }
    }
    path
}

fn resolve_home_dir() -> Option<PathBuf> {
    if let Ok(home) = env::var("HOME") {
        if !home.trim().is_empty() {
            return Some(PathBuf::from(home));
        }
    }

    if let Ok(profile) = env::var("USERPROFILE") {
        if !profile.trim().is_empty() {
            return Some(PathBuf::from(profile));
        }
    }

    std::env::current_dir().ok()
}

/// Parse a boolean-like environment flag value.
///
/// # Supported Values
/// - Truthy: `1`, `true`, `yes`, `on`
/// - Falsy: `0`, `false`, `no`, `off`, empty string
///
/// Matching is case-insensitive and ignores surrounding whitespace.
///
/// # Returns
/// `Some(bool)` when the value is recognized, otherwise `None`.
pub fn parse_env_flag(value: &str) -> Option<bool> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Read a boolean flag from the environment.
///
/// Missing or unrecognized values are treated as `false`.
pub fn env_flag_enabled(name: &str) -> bool {
    env::var(name)
        .ok()
        .and_then(|value| parse_env_flag(&value))
        .unwrap_or(false)
}

/// Split a comma-separated origin list, dropping blanks and trailing slashes.
pub fn parse_origin_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().trim_end_matches('/'))
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

fn default_data_dir() -> PathBuf {
    let home = resolve_home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".cache").join("spellbook")
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Returns
    /// A populated [`Config`] with defaults applied when env vars are missing.
    ///
    /// # Errors
    /// Returns [`AppError::Config`] when `SPELLBOOK_STORE` names an unknown backend.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// `from_env` is this with `std::env::var`; tests pass a map instead of
    /// mutating the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store = match lookup("SPELLBOOK_STORE") {
            Some(value) if !value.trim().is_empty() => value.parse()?,
            _ => StoreBackend::JsonFile,
        };
        let data_dir = lookup("SPELLBOOK_DATA_DIR")
            .filter(|value| !value.trim().is_empty())
            .map(|value| PathBuf::from(expand_tilde(value)))
            .unwrap_or_else(default_data_dir);

        Ok(Self {
            store,
            data_dir,
            port: lookup("PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(DEFAULT_PORT),
            max_body_size: lookup("MAX_BODY_SIZE")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(DEFAULT_MAX_BODY_SIZE),
            cors_origins: lookup("CORS_ORIGINS")
                .map(|raw| parse_origin_list(&raw))
                .unwrap_or_default(),
        })
    }

    /// Origins allowed by CORS when public access is disabled.
    ///
    /// # Arguments
    /// - `port`: Port the listener actually bound (may differ from `self.port`).
    pub fn effective_cors_origins(&self, port: u16) -> Vec<String> {
        if !self.cors_origins.is_empty() {
            return self.cors_origins.clone();
        }
        vec![
            format!("http://localhost:{}", port),
            format!("http://127.0.0.1:{}", port),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn parse_env_flag_accepts_truthy_values() {
        for value in ["1", "true", "TRUE", " yes ", "on"] {
            assert_eq!(parse_env_flag(value), Some(true), "value: {}", value);
        }
    }

    #[test]
    fn parse_env_flag_rejects_unknown_values() {
        assert_eq!(parse_env_flag("maybe"), None);
        assert_eq!(parse_env_flag(" off "), Some(false));
    }

    #[test]
    fn defaults_select_json_backend_on_default_port() {
        let config = Config::from_lookup(lookup_from(&[])).expect("config");
        assert_eq!(config.store, StoreBackend::JsonFile);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.max_body_size, DEFAULT_MAX_BODY_SIZE);
        assert!(config.cors_origins.is_empty());
        assert!(config.data_dir.ends_with("spellbook"));
    }

    #[test]
    fn backend_is_selected_explicitly_and_unknown_values_fail() {
        let config = Config::from_lookup(lookup_from(&[
            ("SPELLBOOK_STORE", "Table"),
            ("SPELLBOOK_DATA_DIR", "/tmp/spells"),
            ("PORT", "9000"),
        ]))
        .expect("config");
        assert_eq!(config.store, StoreBackend::Table);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/spells"));
        assert_eq!(config.port, 9000);

        let err = Config::from_lookup(lookup_from(&[("SPELLBOOK_STORE", "postgres")]))
            .expect_err("unknown backend must fail");
        assert!(matches!(err, AppError::Config(ref msg) if msg.contains("postgres")));
    }

    #[test]
    fn cors_origins_parse_and_fall_back_to_loopback() {
        let config = Config::from_lookup(lookup_from(&[(
            "CORS_ORIGINS",
            "https://spells.example/, ,http://localhost:5173",
        )]))
        .expect("config");
        assert_eq!(
            config.effective_cors_origins(1),
            vec![
                "https://spells.example".to_string(),
                "http://localhost:5173".to_string()
            ]
        );

        let loopback = Config::from_lookup(lookup_from(&[])).expect("config");
        assert_eq!(
            loopback.effective_cors_origins(4000),
            vec![
                "http://localhost:4000".to_string(),
                "http://127.0.0.1:4000".to_string()
            ]
        );
    }
}
