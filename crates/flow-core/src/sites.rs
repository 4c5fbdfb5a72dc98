//! External repository-site checks.
//!
//! Extensions may rely on third-party repository sites being enabled in the
//! host. The check is best-effort: if the probe cannot answer, nothing is
//! reported.

use std::collections::BTreeSet;

use flow_catalog::BoxError;
use flow_extensions::SiteDependency;

/// Source of truth for which repository sites are currently active.
pub trait SiteProbe: Send + Sync {
    /// Names of the active sites.
    fn active_sites(&self) -> Result<BTreeSet<String>, BoxError>;
}

/// Probe answering from a fixed list of site names.
#[derive(Debug, Clone, Default)]
pub struct StaticSiteList {
    sites: BTreeSet<String>,
}

impl StaticSiteList {
    pub fn new<I, S>(sites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sites: sites.into_iter().map(Into::into).collect(),
        }
    }
}

impl SiteProbe for StaticSiteList {
    fn active_sites(&self) -> Result<BTreeSet<String>, BoxError> {
        Ok(self.sites.clone())
    }
}

/// A site dependency that is not satisfied, with the extension requiring it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingSite {
    pub extension_id: String,
    pub site: SiteDependency,
}

/// Site dependencies whose site is not active. Returns nothing when the
/// probe fails.
pub fn find_missing_sites(
    required: &[(String, SiteDependency)],
    probe: &dyn SiteProbe,
) -> Vec<MissingSite> {
    if required.is_empty() {
        return Vec::new();
    }
    for (extension_id, site) in required {
        tracing::debug!(extension = %extension_id, "requires site {} @ {}", site.name, site.url);
    }

    let active = match probe.active_sites() {
        Ok(active) => active,
        Err(e) => {
            tracing::warn!("unable to check repository sites, skipping: {}", e);
            return Vec::new();
        }
    };

    required
        .iter()
        .filter(|(_, site)| !active.contains(&site.name))
        .map(|(extension_id, site)| MissingSite {
            extension_id: extension_id.clone(),
            site: site.clone(),
        })
        .collect()
}
