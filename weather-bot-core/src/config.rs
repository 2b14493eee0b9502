use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::error::Error;

pub const WEATHER_API_KEY_ENV: &str = "WEATHER_API_KEY";
pub const GEONAMES_USERNAME_ENV: &str = "GEONAMES_USERNAME";
pub const BOT_TOKEN_ENV: &str = "BOT_TOKEN";
pub const TIMEOUT_SECS_ENV: &str = "WEATHER_BOT_TIMEOUT_SECS";

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;

/// Base URLs of the remote services. Overridable so tests can point at a mock server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub openweather: String,
    pub geonames: String,
    pub telegram: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            openweather: "https://api.openweathermap.org".to_string(),
            geonames: "http://api.geonames.org".to_string(),
            telegram: "https://api.telegram.org".to_string(),
        }
    }
}

/// Top-level configuration, read from disk and overridden by the environment.
///
/// Example TOML:
/// ```toml
/// weather_api_key = "..."
/// geonames_username = "..."
/// bot_token = "..."
/// request_timeout_secs = 10
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub weather_api_key: Option<String>,
    pub geonames_username: Option<String>,
    pub bot_token: Option<String>,
    pub request_timeout_secs: u64,
    pub poll_timeout_secs: u64,
    pub endpoints: Endpoints,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            weather_api_key: None,
            geonames_username: None,
            bot_token: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            poll_timeout_secs: DEFAULT_POLL_TIMEOUT_SECS,
            endpoints: Endpoints::default(),
        }
    }
}

impl Config {
    /// Load config from the default location (or `path`), then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_file_path()?,
        };

        let mut cfg = Self::load_file(&path)?;
        cfg.apply_env(std::env::vars());
        Ok(cfg)
    }

    /// Read a config file, or return an empty default if it doesn't exist yet.
    pub fn load_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_file_path()?,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(path)
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-bot", "weather-bot")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Overlay credentials and timeout from environment pairs. Blank values are ignored.
    pub fn apply_env<I, K, V>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map: HashMap<String, String> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let get = |key: &str| {
            map.get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        if let Some(v) = get(WEATHER_API_KEY_ENV) {
            self.weather_api_key = Some(v);
        }
        if let Some(v) = get(GEONAMES_USERNAME_ENV) {
            self.geonames_username = Some(v);
        }
        if let Some(v) = get(BOT_TOKEN_ENV) {
            self.bot_token = Some(v);
        }
        if let Some(secs) = get(TIMEOUT_SECS_ENV)
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
        {
            self.request_timeout_secs = secs;
        }
    }

    pub fn weather_api_key(&self) -> Result<&str, Error> {
        non_blank(&self.weather_api_key).ok_or(Error::MissingCredential {
            name: "weather_api_key",
            env: WEATHER_API_KEY_ENV,
        })
    }

    pub fn geonames_username(&self) -> Result<&str, Error> {
        non_blank(&self.geonames_username).ok_or(Error::MissingCredential {
            name: "geonames_username",
            env: GEONAMES_USERNAME_ENV,
        })
    }

    pub fn bot_token(&self) -> Result<&str, Error> {
        non_blank(&self.bot_token).ok_or(Error::MissingCredential {
            name: "bot_token",
            env: BOT_TOKEN_ENV,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credentials_error_with_hint() {
        let cfg = Config::default();
        let err = cfg.weather_api_key().unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("weather_api_key"));
        assert!(msg.contains(WEATHER_API_KEY_ENV));
        assert!(cfg.geonames_username().is_err());
        assert!(cfg.bot_token().is_err());
    }

    #[test]
    fn env_overrides_file_values() {
        let mut cfg = Config {
            weather_api_key: Some("FILE_KEY".into()),
            geonames_username: Some("file_user".into()),
            ..Config::default()
        };

        cfg.apply_env([
            (WEATHER_API_KEY_ENV, "ENV_KEY"),
            (BOT_TOKEN_ENV, "123:abc"),
            (TIMEOUT_SECS_ENV, "3"),
        ]);

        assert_eq!(cfg.weather_api_key().unwrap(), "ENV_KEY");
        assert_eq!(cfg.geonames_username().unwrap(), "file_user");
        assert_eq!(cfg.bot_token().unwrap(), "123:abc");
        assert_eq!(cfg.request_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let mut cfg = Config {
            weather_api_key: Some("FILE_KEY".into()),
            ..Config::default()
        };

        cfg.apply_env([(WEATHER_API_KEY_ENV, "   "), (TIMEOUT_SECS_ENV, "0")]);

        assert_eq!(cfg.weather_api_key().unwrap(), "FILE_KEY");
        assert_eq!(cfg.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    }

    #[test]
    fn blank_file_value_counts_as_missing() {
        let cfg = Config {
            bot_token: Some("  ".into()),
            ..Config::default()
        };
        assert!(cfg.bot_token().is_err());
    }

    #[test]
    fn save_then_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let cfg = Config {
            weather_api_key: Some("KEY".into()),
            geonames_username: Some("user".into()),
            request_timeout_secs: 5,
            ..Config::default()
        };

        let written = cfg.save(Some(&path)).unwrap();
        assert_eq!(written, path);

        let loaded = Config::load_file(&path).unwrap();
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_file(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn partial_file_keeps_default_endpoints() {
        let cfg: Config = toml::from_str("weather_api_key = \"K\"\n").unwrap();
        assert_eq!(cfg.endpoints, Endpoints::default());
        assert_eq!(cfg.poll_timeout_secs, DEFAULT_POLL_TIMEOUT_SECS);
    }
}
