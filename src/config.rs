//! Configuration loading.

use crate::files::license::DEFAULT_LICENSES;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Metadata store; `~` is expanded.
    pub database: String,
    /// Prefix for generated links, e.g. `https://lms.example.org`.
    pub wwwroot: Option<String>,
    /// Comma-separated license allow-list.
    pub licenses: String,
    /// Free text of `<license> <rrggbb>` entries.
    pub license_colors: String,
    /// Translation overrides, `[strings.<component>]`; `core` is the empty
    /// component.
    pub strings: HashMap<String, HashMap<String, String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: "~/.coursefiles/files.db".to_string(),
            wwwroot: None,
            licenses: DEFAULT_LICENSES.to_string(),
            license_colors: String::new(),
            strings: HashMap::new(),
        }
    }
}

impl Config {
    /// Default config file location for this platform.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "coursefiles", "coursefiles")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Load `path`, or the default location when `None`. A missing file
    /// yields the defaults; an unreadable or invalid one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };
        if !path.exists() {
            tracing::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config in {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.database).to_string())
    }

    /// Prefix a host-relative link with `wwwroot`, when configured.
    pub fn absolute_url(&self, path: &str) -> String {
        match &self.wwwroot {
            Some(root) => format!("{}{}", root.trim_end_matches('/'), path),
            None => path.to_string(),
        }
    }
}
