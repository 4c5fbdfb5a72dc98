//! Extension identifiers
//!
//! Every extension is addressed by a dependency id of the form
//! `<group>:<artifact>`, for example `org.flow:core`. The group is a
//! dot-separated namespace; the artifact names the extension inside it.
//!
//! ```
//! use flow_extensions::id::{ExtensionId, is_valid_id};
//!
//! assert!(is_valid_id("org.example:my-ext"));
//! assert!(!is_valid_id("Org.Example:ext"));
//!
//! let id = ExtensionId::parse("org.flow:core").unwrap();
//! assert_eq!(id.group(), "org.flow");
//! assert_eq!(id.artifact(), "core");
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

static GROUP_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z0-9.-]+$").unwrap());
static ARTIFACT_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z0-9-]+$").unwrap());

/// Whether `id` is a well-formed extension id. Never panics.
pub fn is_valid_id(id: &str) -> bool {
    check(id).is_ok()
}

/// Split `id` into group and artifact, or explain why it is malformed.
fn check(id: &str) -> std::result::Result<(&str, &str), &'static str> {
    if id.is_empty() {
        return Err("id is empty");
    }
    if id.to_lowercase() != id {
        return Err("id must be lower case");
    }
    let mut parts = id.split(':');
    let (group, artifact) = match (parts.next(), parts.next(), parts.next()) {
        (Some(group), Some(artifact), None) => (group, artifact),
        _ => return Err("id must contain exactly one ':' between group and artifact"),
    };
    if group.starts_with('.') || group.ends_with('.') {
        return Err("group must not start or end with '.'");
    }
    if group.contains("..") {
        return Err("group must not contain '..'");
    }
    if !GROUP_PATTERN.is_match(group) {
        return Err("group may only contain a-z, 0-9, '-' and '.'");
    }
    if !ARTIFACT_PATTERN.is_match(artifact) {
        return Err("artifact may only contain a-z, 0-9 and '-'");
    }
    Ok((group, artifact))
}

/// A validated extension id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExtensionId {
    raw: String,
    separator: usize,
}

impl ExtensionId {
    pub fn parse(id: &str) -> Result<Self> {
        let (group, _) = check(id).map_err(|reason| Error::InvalidId {
            id: id.to_string(),
            reason: reason.to_string(),
        })?;
        Ok(Self {
            raw: id.to_string(),
            separator: group.len(),
        })
    }

    pub fn group(&self) -> &str {
        &self.raw[..self.separator]
    }

    pub fn artifact(&self) -> &str {
        &self.raw[self.separator + 1..]
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for ExtensionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ExtensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl AsRef<str> for ExtensionId {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}
