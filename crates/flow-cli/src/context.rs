//! Shared command context: where options and settings live.

use std::path::{Path, PathBuf};

use flow_core::{BootOptions, Engine};
use flow_extensions::ActivationSettings;
use flow_standard::builtin_extensions;

use crate::error::Result;

/// Settings file used when none is given.
pub fn default_settings_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("flow")
        .join("extensions.toml")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliContext {
    options_path: Option<PathBuf>,
    settings_path: PathBuf,
}

impl CliContext {
    pub fn new(options_path: Option<PathBuf>, settings_path: Option<PathBuf>) -> Self {
        Self {
            options_path,
            settings_path: settings_path.unwrap_or_else(default_settings_path),
        }
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    pub fn options(&self) -> Result<BootOptions> {
        match &self.options_path {
            Some(path) => Ok(BootOptions::load(path)?),
            None => Ok(BootOptions::default()),
        }
    }

    pub fn settings(&self) -> Result<ActivationSettings> {
        Ok(ActivationSettings::load_or_default(&self.settings_path)?)
    }

    pub fn save_settings(&self, settings: &ActivationSettings) -> Result<()> {
        settings.save(&self.settings_path)?;
        tracing::debug!(path = %self.settings_path.display(), "settings saved");
        Ok(())
    }

    /// Boot the built-in extensions with this context's options and
    /// settings.
    pub fn boot(&self) -> Result<Engine> {
        let mut engine = Engine::new(self.options()?, self.settings()?);
        engine.boot(builtin_extensions())?;
        Ok(engine)
    }
}
