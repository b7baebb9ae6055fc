//! CLI configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/partwise/uploader.toml`
//! - Windows: `%APPDATA%/partwise/uploader.toml`

use std::path::{Path, PathBuf};

use partwise_uploader::UploaderConfig;
use serde::{Deserialize, Serialize};

/// Uploader CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Control-plane endpoint receiving the `action` calls.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Timeout for one control-plane call, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub uploader: UploaderConfig,
}

fn default_endpoint() -> String {
    "http://localhost:3000/api/upload".into()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            request_timeout_secs: default_request_timeout(),
            uploader: UploaderConfig::default(),
        }
    }
}

impl Config {
    /// Loads `path`, or the default location, creating it with defaults
    /// when it does not exist yet.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => config_path()?,
        };

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(&path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }
}

/// Returns the platform-specific configuration file path.
fn config_path() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata).join("partwise").join("uploader.toml"))
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home)
            .join(".config")
            .join("partwise")
            .join("uploader.toml"))
    }
}
