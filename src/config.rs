// src/config.rs
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use crate::domain::error::{DomainResult, ImportError};

pub const ENV_MAX_FILE_SIZE_MB: &str = "KBIMPORT_MAX_FILE_SIZE_MB";
pub const ENV_BATCH_SIZE: &str = "KBIMPORT_BATCH_SIZE";
pub const ENV_PRETTY: &str = "KBIMPORT_PRETTY";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    /// Inputs larger than this are refused before parsing
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,

    /// Chunk size for `parse --batch`
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pretty-print JSON output
    #[serde(default)]
    pub pretty: bool,
}

fn default_max_file_size_mb() -> u64 {
    100
}

fn default_batch_size() -> usize {
    50
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_file_size_mb: default_max_file_size_mb(),
            batch_size: default_batch_size(),
            pretty: false,
        }
    }
}

impl Settings {
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }
}

/// Default location: `~/.config/kbimport/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|p| p.join(".config/kbimport/config.toml"))
}

/// Load settings: defaults, then the config file, then environment variables.
///
/// An explicit `config_path` must exist and parse; the default location is optional.
#[instrument(level = "debug")]
pub fn load_settings(config_path: Option<&Path>) -> DomainResult<Settings> {
    trace!("Loading settings");

    let mut settings = match config_path {
        Some(path) => read_config_file(path)?,
        None => match default_config_path().filter(|p| p.exists()) {
            Some(path) => read_config_file(&path).unwrap_or_else(|e| {
                debug!("Ignoring unreadable default config {:?}: {}", path, e);
                Settings::default()
            }),
            None => Settings::default(),
        },
    };

    apply_env_overrides(&mut settings)?;

    trace!("Settings loaded: {:?}", settings);
    Ok(settings)
}

fn read_config_file(path: &Path) -> DomainResult<Settings> {
    trace!("Loading config from: {:?}", path);
    let text = std::fs::read_to_string(path)
        .map_err(|e| ImportError::from(e).context(format!("reading {}", path.display())))?;
    toml::from_str::<Settings>(&text)
        .map_err(|e| ImportError::Other(format!("invalid config {}: {}", path.display(), e)))
}

fn apply_env_overrides(settings: &mut Settings) -> DomainResult<()> {
    if let Ok(value) = std::env::var(ENV_MAX_FILE_SIZE_MB) {
        trace!("Using {} from environment: {}", ENV_MAX_FILE_SIZE_MB, value);
        settings.max_file_size_mb = parse_env(ENV_MAX_FILE_SIZE_MB, &value)?;
    }

    if let Ok(value) = std::env::var(ENV_BATCH_SIZE) {
        trace!("Using {} from environment: {}", ENV_BATCH_SIZE, value);
        settings.batch_size = parse_env(ENV_BATCH_SIZE, &value)?;
    }

    if let Ok(value) = std::env::var(ENV_PRETTY) {
        trace!("Using {} from environment: {}", ENV_PRETTY, value);
        settings.pretty = matches!(
            value.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        );
    }

    Ok(())
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> DomainResult<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| ImportError::Other(format!("{} must be a number, got '{}'", name, value)))
}

pub fn generate_default_config() -> String {
    let default_settings = Settings::default();
    toml::to_string_pretty(&default_settings)
        .unwrap_or_else(|_| "# Error generating default configuration".to_string())
}
