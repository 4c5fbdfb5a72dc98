//! Which extensions are allowed to load.
//!
//! An extension loads when it is core, listed as always-core, activated by
//! the user, or required (transitively) by another extension that loads.

use std::collections::BTreeSet;

use crate::extension::Declaration;
use crate::id::is_valid_id;

/// The subset of an extension the closure looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub id: String,
    pub is_core: bool,
    pub dependencies: Vec<String>,
}

impl Candidate {
    pub fn new(id: impl Into<String>, is_core: bool, dependencies: Vec<String>) -> Self {
        Self {
            id: id.into(),
            is_core,
            dependencies,
        }
    }

    pub fn from_declaration(declaration: &Declaration) -> Self {
        Self {
            id: declaration.id.clone(),
            is_core: declaration.is_core,
            dependencies: declaration.dependencies.iter().map(|d| d.id.clone()).collect(),
        }
    }
}

/// Compute the implied-loaded set.
///
/// The result contains every candidate that loads plus every well-formed id
/// those candidates depend on, whether or not that id was discovered.
pub fn implied_loaded(
    candidates: &[Candidate],
    activated: &BTreeSet<String>,
    core: &BTreeSet<String>,
) -> BTreeSet<String> {
    let mut implied = BTreeSet::new();
    loop {
        let mut changed = false;
        for candidate in candidates {
            let loads = candidate.is_core
                || core.contains(&candidate.id)
                || activated.contains(&candidate.id)
                || implied.contains(&candidate.id);
            if !loads {
                continue;
            }
            changed |= implied.insert(candidate.id.clone());
            for dependency in &candidate.dependencies {
                if is_valid_id(dependency) {
                    changed |= implied.insert(dependency.clone());
                }
            }
        }
        if !changed {
            break;
        }
    }
    implied
}
