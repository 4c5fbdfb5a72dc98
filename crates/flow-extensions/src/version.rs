//! Lenient version comparison.
//!
//! Extension versions are not always full semver. Missing components are
//! treated as `0`, so `1.2` equals `1.2.0` and `2` equals `2.0.0`. A leading
//! `v` is ignored.
//!
//! ```
//! use flow_extensions::version::satisfies_minimum;
//!
//! assert!(satisfies_minimum("1.4", "1.2.0").unwrap());
//! assert!(!satisfies_minimum("1.1.9", "1.2").unwrap());
//! ```

use std::cmp::Ordering;

use crate::error::{Error, Result};

/// Parse `version` into a semver version, filling in missing components.
pub fn parse_lenient(version: &str) -> Result<semver::Version> {
    let trimmed = version.trim();
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);

    if let Ok(parsed) = semver::Version::parse(trimmed) {
        return Ok(parsed);
    }

    // Split off pre-release/build suffixes so only the numeric core is padded.
    let core_end = trimmed.find(['-', '+']).unwrap_or(trimmed.len());
    let (core, suffix) = trimmed.split_at(core_end);
    let components = core.split('.').count();
    let padded = match components {
        1 => format!("{core}.0.0{suffix}"),
        2 => format!("{core}.0{suffix}"),
        _ => trimmed.to_string(),
    };

    semver::Version::parse(&padded).map_err(|e| Error::InvalidVersion {
        version: version.to_string(),
        reason: e.to_string(),
    })
}

/// Compare two version strings.
pub fn compare_versions(left: &str, right: &str) -> Result<Ordering> {
    Ok(parse_lenient(left)?.cmp(&parse_lenient(right)?))
}

/// Whether `version` is at least `minimum`.
pub fn satisfies_minimum(version: &str, minimum: &str) -> Result<bool> {
    Ok(compare_versions(version, minimum)? != Ordering::Less)
}
