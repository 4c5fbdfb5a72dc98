//! Error types for flow-core

use std::path::PathBuf;

/// Result type for flow-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while booting or managing extensions
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `boot` was called on an engine that already holds a catalog
    #[error("engine is already booted; use reload to boot again")]
    AlreadyBooted,

    /// The engine has not been booted yet
    #[error("engine has not been booted")]
    NotBooted,

    /// No discovered extension has this id
    #[error("unknown extension: {0}")]
    UnknownExtension(String),

    /// Core extensions are always loaded
    #[error("extension '{0}' is a core extension and cannot be deactivated")]
    CoreExtension(String),

    /// Boot options file could not be parsed
    #[error("failed to parse boot options at {path}: {source}")]
    OptionsParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    // Transparent wrappers for underlying crate errors
    /// Catalog error from flow-catalog
    #[error(transparent)]
    Catalog(#[from] flow_catalog::Error),

    /// Extension error from flow-extensions
    #[error(transparent)]
    Extensions(#[from] flow_extensions::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),
}
