//! Application configuration
//!
//! Loaded once at startup from `~/.runstat/config.json`, with an environment
//! override for the service URL. A missing file means defaults; a malformed
//! file warns and falls back to defaults rather than failing startup.

use crate::types::{Result, RunstatError};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default results service URL (self-hosted deployment).
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// HTTP request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Environment variable overriding the configured base URL.
pub const BASE_URL_ENV: &str = "RUNSTAT_BASE_URL";

fn default_since_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).expect("valid constant date")
}

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Cutoff used by the "since date" period selection.
    pub since_date: NaiveDate,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            since_date: default_since_date(),
        }
    }
}

/// On-disk shape: every field optional, merged onto defaults.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    since_date: Option<NaiveDate>,
}

impl Config {
    /// Load from the default path, applying the env override.
    /// Never fails: unreadable or malformed files warn and use defaults.
    pub fn load() -> Self {
        let mut config = match Self::default_path() {
            Some(path) if path.exists() => match Self::load_from(&path) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("[runstat] Warning: config ignored: {}", e);
                    Self::default()
                }
            },
            _ => Self::default(),
        };

        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                config.base_url = url;
            }
        }
        config
    }

    /// Load and merge a specific config file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let file: ConfigFile = serde_json::from_str(&content)
            .map_err(|e| RunstatError::Config(format!("{}: {}", path.display(), e)))?;

        let defaults = Self::default();
        Ok(Self {
            base_url: file.base_url.unwrap_or(defaults.base_url),
            timeout_secs: file.timeout_secs.unwrap_or(defaults.timeout_secs),
            since_date: file.since_date.unwrap_or(defaults.since_date),
        })
    }

    /// Default config path (~/.runstat/config.json)
    fn default_path() -> Option<PathBuf> {
        let home = directories::UserDirs::new()?.home_dir().to_path_buf();
        Some(home.join(".runstat").join("config.json"))
    }
}
