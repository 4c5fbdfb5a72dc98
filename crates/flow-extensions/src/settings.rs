//! Persisted activation settings.
//!
//! ```toml
//! activated-extensions = ["acme:viewer", "org.flow:utils"]
//! silenced-extensions = ["acme:experimental"]
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Which extensions the user activated, and which ones they no longer want
/// to be told about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ActivationSettings {
    #[serde(default)]
    pub activated_extensions: BTreeSet<String>,
    #[serde(default)]
    pub silenced_extensions: BTreeSet<String>,
}

impl ActivationSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings with `ids` activated.
    pub fn with_activated<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            activated_extensions: ids.into_iter().map(Into::into).collect(),
            silenced_extensions: BTreeSet::new(),
        }
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|source| Error::SettingsParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path`, or return empty settings if the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("no activation settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Write the settings, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.to_toml()?)?;
        tracing::debug!("saved activation settings to {}", path.display());
        Ok(())
    }

    pub fn is_activated(&self, id: &str) -> bool {
        self.activated_extensions.contains(id)
    }

    pub fn is_silenced(&self, id: &str) -> bool {
        self.silenced_extensions.contains(id)
    }

    pub fn activate(&mut self, id: &str) -> bool {
        self.activated_extensions.insert(id.to_string())
    }

    pub fn deactivate(&mut self, id: &str) -> bool {
        self.activated_extensions.remove(id)
    }

    pub fn silence(&mut self, id: &str) -> bool {
        self.silenced_extensions.insert(id.to_string())
    }
}
