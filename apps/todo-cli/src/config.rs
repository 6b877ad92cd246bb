//! Configuration for the todo CLI.

use crate::error::TodoResult;
use crate::models::Priority;
use crate::storage::Backend;
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

const APP_NAME: &str = "todo-cli";

/// Timestamp format used when none is configured or the configured one is invalid.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

impl Config {
    /// Load from a config file. A missing file yields defaults; an
    /// unreadable one is logged and also yields defaults.
    pub fn load_from(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read config, using defaults");
                return Self::default();
            }
        };
        let mut config: Self = toml::from_str(&content).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "invalid config, using defaults");
            Self::default()
        });
        if !is_valid_date_format(&config.display.date_format) {
            warn!(
                path = %path.display(),
                date_format = %config.display.date_format,
                "invalid date_format, using {}",
                DEFAULT_DATE_FORMAT
            );
            config.display.date_format = default_date_format();
        }
        config
    }

    pub fn save_to(&self, path: &Path) -> TodoResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", APP_NAME)
            .map(|d| d.config_dir().join("config.toml"))
    }

    /// Where the task store lives: explicit override, then the configured
    /// path, then the platform data directory, then the working directory.
    pub fn store_path(&self, backend: Backend, explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        if let Some(path) = &self.storage.path {
            return path.clone();
        }
        directories::ProjectDirs::from("", "", APP_NAME)
            .map(|d| d.data_dir().join(backend.default_file_name()))
            .unwrap_or_else(|| PathBuf::from(backend.default_file_name()))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: Backend,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_true")]
    pub color: bool,
    #[serde(default = "default_date_format")]
    pub date_format: String,
    #[serde(default)]
    pub verbose: bool,
}

fn default_true() -> bool { true }
fn default_date_format() -> String { DEFAULT_DATE_FORMAT.to_string() }

/// Whether chrono accepts every specifier in `fmt`.
pub fn is_valid_date_format(fmt: &str) -> bool {
    !StrftimeItems::new(fmt).any(|item| matches!(item, Item::Error))
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            color: true,
            date_format: default_date_format(),
            verbose: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default)]
    pub priority: Priority,
}
