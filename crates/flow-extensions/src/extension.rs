//! The contract every extension implements.

use std::collections::BTreeSet;
use std::fmt;

use flow_catalog::{BoxError, ExtensionRef, SessionId, isolate};

use crate::dependency::{Dependency, SiteDependency};
use crate::metadata::ExtensionMetadata;
use crate::registrar::{PostprocessContext, Registrar};

/// A contribution of node, data and parameter types to the catalog.
///
/// Extensions are discovered by the host and handed to the engine together
/// with a priority. The engine owns them for the duration of one session.
/// Every method that runs extension code is executed inside an isolation
/// boundary, so returning an error and panicking are treated alike.
pub trait Extension: Send + Sync {
    /// Dependency id in `<group>:<artifact>` form.
    fn id(&self) -> &str;

    fn version(&self) -> &str;

    fn metadata(&self) -> &ExtensionMetadata;

    /// Other extensions this one requires.
    fn dependencies(&self) -> Vec<Dependency> {
        Vec::new()
    }

    /// Additional ids this extension satisfies when others depend on them.
    fn provides(&self) -> Vec<String> {
        Vec::new()
    }

    /// External repository sites this extension relies on.
    fn site_dependencies(&self) -> Vec<SiteDependency> {
        Vec::new()
    }

    /// Core extensions are always loaded and cannot be deactivated.
    fn is_core(&self) -> bool {
        false
    }

    /// Report problems that should prevent activation (missing tools,
    /// unsupported platform, ...).
    fn pre_activation_check(&self, _report: &mut CheckReport) {}

    /// Prepare internal state before registration.
    fn activate(&mut self, _context: &ActivationContext<'_>) -> Result<(), BoxError> {
        Ok(())
    }

    /// Register catalog content directly or schedule it for later.
    fn register(&self, registrar: &mut Registrar<'_>) -> Result<(), BoxError>;

    /// Runs after every extension registered and the catalog was validated.
    fn postprocess(&self, _context: &mut PostprocessContext<'_>) -> Result<(), BoxError> {
        Ok(())
    }
}

/// What an extension declares about itself, read once at intake so later
/// steps never call back into the extension for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub id: String,
    pub version: String,
    pub name: String,
    pub is_core: bool,
    pub dependencies: Vec<Dependency>,
    pub provides: Vec<String>,
    pub sites: Vec<SiteDependency>,
}

impl Declaration {
    /// Read the declaration of `extension`. A panic in any accessor is
    /// returned as its message.
    pub fn read(extension: &dyn Extension) -> Result<Self, String> {
        isolate(|| Self {
            id: extension.id().to_string(),
            version: extension.version().to_string(),
            name: extension.metadata().name.clone(),
            is_core: extension.is_core(),
            dependencies: extension.dependencies(),
            provides: extension.provides(),
            sites: extension.site_dependencies(),
        })
    }

    /// Whether this extension satisfies a dependency on `id`.
    pub fn answers_to(&self, id: &str) -> bool {
        self.id == id || self.provides.iter().any(|provided| provided == id)
    }

    /// Identity snapshot for events.
    pub fn to_ref(&self) -> ExtensionRef {
        ExtensionRef {
            id: self.id.clone(),
            version: self.version.clone(),
            name: self.name.clone(),
        }
    }
}

/// Information available to [`Extension::activate`].
#[derive(Debug, Clone, Copy)]
pub struct ActivationContext<'a> {
    pub session: SessionId,
    /// Ids that will be loaded in this session.
    pub loaded: &'a BTreeSet<String>,
}

/// A soft failure found by [`Extension::pre_activation_check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckFailure {
    pub title: String,
    pub explanation: String,
    pub fix: String,
}

/// Collects soft failures during a pre-activation check.
#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    failures: Vec<CheckFailure>,
}

impl CheckReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(
        &mut self,
        title: impl Into<String>,
        explanation: impl Into<String>,
        fix: impl Into<String>,
    ) {
        self.failures.push(CheckFailure {
            title: title.into(),
            explanation: explanation.into(),
            fix: fix.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures(&self) -> &[CheckFailure] {
        &self.failures
    }

    pub fn into_failures(self) -> Vec<CheckFailure> {
        self.failures
    }
}

/// An extension instance as yielded by discovery.
pub struct Discovered {
    pub extension: Box<dyn Extension>,
    /// Higher priorities are processed first.
    pub priority: i32,
}

impl Discovered {
    pub fn new(extension: impl Extension + 'static, priority: i32) -> Self {
        Self {
            extension: Box::new(extension),
            priority,
        }
    }

    pub fn boxed(extension: Box<dyn Extension>, priority: i32) -> Self {
        Self {
            extension,
            priority,
        }
    }
}

impl fmt::Debug for Discovered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Discovered")
            .field("id", &self.extension.id())
            .field("version", &self.extension.version())
            .field("priority", &self.priority)
            .finish()
    }
}

/// Sort discovered extensions by priority, highest first. Equal priorities
/// keep their discovery order.
pub fn sort_by_priority(discovered: &mut [Discovered]) {
    discovered.sort_by(|a, b| b.priority.cmp(&a.priority));
}
