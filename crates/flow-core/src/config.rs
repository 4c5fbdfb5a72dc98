//! Boot options
//!
//! Loaded from TOML with kebab-case keys; every key is optional.
//!
//! ```toml
//! ignore-pre-activation-failures = false
//! validate-node-types = true
//! validate-repository-sites = true
//! core-extensions = ["org.flow:utils"]
//! available-sites = ["imaging"]
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Flags controlling one boot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BootOptions {
    /// Load extensions whose pre-activation check reported problems.
    pub ignore_pre_activation_failures: bool,
    /// Instantiate and exercise every node type after registration.
    pub validate_node_types: bool,
    /// Check declared repository-site dependencies.
    pub validate_repository_sites: bool,
    /// Ids that are always loaded, whether or not they declare themselves core.
    pub core_extensions: BTreeSet<String>,
    /// Sites the default probe reports as present.
    pub available_sites: BTreeSet<String>,
}

impl Default for BootOptions {
    fn default() -> Self {
        Self {
            ignore_pre_activation_failures: false,
            validate_node_types: true,
            validate_repository_sites: false,
            core_extensions: BTreeSet::new(),
            available_sites: BTreeSet::new(),
        }
    }
}

impl BootOptions {
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|source| Error::OptionsParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load options or use defaults if the file doesn't exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn ignore_pre_activation_failures(mut self, ignore: bool) -> Self {
        self.ignore_pre_activation_failures = ignore;
        self
    }

    pub fn validate_node_types(mut self, validate: bool) -> Self {
        self.validate_node_types = validate;
        self
    }

    pub fn validate_repository_sites(mut self, validate: bool) -> Self {
        self.validate_repository_sites = validate;
        self
    }

    pub fn with_core_extension(mut self, id: impl Into<String>) -> Self {
        self.core_extensions.insert(id.into());
        self
    }

    pub fn with_available_site(mut self, name: impl Into<String>) -> Self {
        self.available_sites.insert(name.into());
        self
    }
}
