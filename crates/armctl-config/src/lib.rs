pub mod error;

pub use error::*;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_PATH_ENV: &str = "ARMCTL_CONFIG_PATH";
pub const DEFAULT_ENDPOINT: &str = "https://management.azure.com";

/// armctl settings
///
/// Every field is optional in the file. The access token is never read
/// from here; it only comes from `AZURE_ACCESS_TOKEN`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub subscription_id: Option<String>,
    pub endpoint: String,
    /// Used by `network-security-group new` when `--location` is omitted
    pub default_location: Option<String>,
    pub timeout_secs: u64,
    pub poll_interval_secs: u64,
    pub max_polls: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            subscription_id: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            default_location: None,
            timeout_secs: 60,
            poll_interval_secs: 5,
            max_polls: 120,
        }
    }
}

impl Settings {
    /// Parse a settings file. An empty file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `AZURE_SUBSCRIPTION_ID` and `ARM_ENDPOINT`
    pub fn apply_env(&mut self) {
        if let Some(sub) = non_empty_var("AZURE_SUBSCRIPTION_ID") {
            self.subscription_id = Some(sub);
        }
        if let Some(endpoint) = non_empty_var("ARM_ENDPOINT") {
            self.endpoint = endpoint;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.endpoint.starts_with("https://") && !self.endpoint.starts_with("http://") {
            return Err(ConfigError::Invalid {
                key: "endpoint",
                message: format!("expected an http(s) URL, got '{}'", self.endpoint),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "timeout_secs",
                message: "must be greater than 0".to_string(),
            });
        }
        if self.max_polls == 0 {
            return Err(ConfigError::Invalid {
                key: "max_polls",
                message: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Global config directory (`~/.config/armctl`)
pub fn get_config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("armctl"))
}

/// Find the settings file
///
/// Search order:
/// 1. `ARMCTL_CONFIG_PATH`
/// 2. `./armctl.yaml`
/// 3. `./.armctl/config.yaml`
/// 4. `~/.config/armctl/config.yaml`
pub fn find_config_file() -> Result<Option<PathBuf>> {
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(Some(path));
        }
    }

    let current_dir = std::env::current_dir()?;
    for candidate in [
        current_dir.join("armctl.yaml"),
        current_dir.join(".armctl").join("config.yaml"),
    ] {
        if candidate.exists() {
            return Ok(Some(candidate));
        }
    }

    if let Ok(config_dir) = get_config_dir() {
        let global = config_dir.join("config.yaml");
        if global.exists() {
            return Ok(Some(global));
        }
    }

    Ok(None)
}

/// Load settings from the first file found (or defaults), then apply
/// environment overrides
pub fn load() -> Result<Settings> {
    let mut settings = match find_config_file()? {
        Some(path) => {
            debug!(path = %path.display(), "loading settings");
            Settings::from_file(&path)?
        }
        None => {
            debug!("no settings file found, using defaults");
            Settings::default()
        }
    };
    settings.apply_env();
    settings.validate()?;
    Ok(settings)
}
