use std::path::PathBuf;

/// Errors that can occur in the extension system.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Identifier does not follow the `<group>:<artifact>` grammar.
    #[error("invalid extension id '{id}': {reason}")]
    InvalidId { id: String, reason: String },

    /// Version string cannot be interpreted.
    #[error("invalid version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },

    /// Failed to parse an activation settings file.
    #[error("failed to parse activation settings at {path}: {source}")]
    SettingsParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Failed to serialize activation settings.
    #[error("failed to serialize activation settings: {0}")]
    SettingsSerialize(#[from] toml::ser::Error),

    /// I/O error reading or writing settings.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog rejected a registration.
    #[error(transparent)]
    Catalog(#[from] flow_catalog::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
