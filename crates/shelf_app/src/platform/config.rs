use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use shelf_client::{ClientSettings, DEFAULT_API_BASE};

use super::logging::LogDestination;

const DEFAULT_CONFIG_FILE: &str = "studyshelf.ron";
pub(crate) const API_BASE_ENV: &str = "STUDYSHELF_API_BASE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct LogConfig {
    pub destination: LogDestination,
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            destination: LogDestination::File,
            level: "info".to_string(),
        }
    }
}

/// Settings read from `studyshelf.ron`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub api_base: String,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let client = ClientSettings::default();
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            connect_timeout_ms: client.connect_timeout.as_millis() as u64,
            request_timeout_ms: client.request_timeout.as_millis() as u64,
            log: LogConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads `explicit` when given (it must exist), else `./studyshelf.ron`
    /// when present, else defaults.
    pub(crate) fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };
        Self::from_file(&path)
    }

    pub(crate) fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        ron::from_str(&raw).with_context(|| format!("parsing RON config: {}", path.display()))
    }

    /// Environment first, then the command-line flag.
    pub(crate) fn apply_api_base_overrides(&mut self, env: Option<String>, flag: Option<String>) {
        for value in [env, flag].into_iter().flatten() {
            let value = value.trim();
            if !value.is_empty() {
                self.api_base = value.to_string();
            }
        }
    }

    pub(crate) fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.api_base.clone(),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_client_settings() {
        let config = AppConfig::default();
        let settings = config.client_settings();

        assert_eq!(settings.base_url, "http://127.0.0.1:8000");
        assert_eq!(settings.connect_timeout, Duration::from_secs(10));
        assert_eq!(settings.request_timeout, Duration::from_secs(30));
        assert_eq!(config.log.destination, LogDestination::File);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("studyshelf.ron");
        fs::write(
            &path,
            r#"(api_base: "http://library.local:9000", log: (destination: Both))"#,
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();

        assert_eq!(config.api_base, "http://library.local:9000");
        assert_eq!(config.request_timeout_ms, 30_000);
        assert_eq!(config.log.destination, LogDestination::Both);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppConfig::load(Some(&dir.path().join("nope.ron"))).is_err());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.ron");
        fs::write(&path, "(api_base: 42)").unwrap();
        assert!(AppConfig::from_file(&path).is_err());
    }

    #[test]
    fn flag_overrides_environment_which_overrides_file() {
        let mut config = AppConfig {
            api_base: "http://from-file".to_string(),
            ..AppConfig::default()
        };

        config.apply_api_base_overrides(Some("http://from-env".to_string()), None);
        assert_eq!(config.api_base, "http://from-env");

        config.apply_api_base_overrides(
            Some("http://from-env".to_string()),
            Some("http://from-flag".to_string()),
        );
        assert_eq!(config.api_base, "http://from-flag");

        config.apply_api_base_overrides(Some("  ".to_string()), None);
        assert_eq!(config.api_base, "http://from-flag");
    }
}
