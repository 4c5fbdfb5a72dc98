//! The boot engine
//!
//! An [`Engine`] turns an unordered list of discovered extensions into a
//! validated, read-only [`Catalog`]. Every extension passes through the
//! same pipeline (see [`ExtensionState`]); a failure at any step affects
//! that extension only and is recorded in the [`BootReport`].
//!
//! The engine has a single writer lifecycle:
//!
//! 1. [`Engine::new`] with options and activation settings;
//! 2. [`Engine::boot`] once;
//! 3. read the frozen catalog through [`Engine::catalog`] or share it with
//!    [`Engine::shared_catalog`];
//! 4. [`Engine::reload`] to discard the session and boot again.
//!
//! Event listeners are attached to [`Engine::events`] and survive reloads.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use flow_catalog::{
    BoxError, Catalog, EventBus, ExtensionDiscovered, ExtensionRegistered, SessionId, TaskQueue,
    isolate,
};
use flow_extensions::{
    ActivationContext, ActivationSettings, Candidate, CheckReport, Declaration, Dependency,
    DependencyGraph, Discovered, Extension, ExtensionId, PostprocessContext, PostprocessTask,
    Registrar, SiteDependency, implied_loaded, sort_by_priority, version,
};

use crate::config::BootOptions;
use crate::error::{Error, Result};
use crate::manager::ExtensionManager;
use crate::report::{BootReport, Issue, IssueKind, Severity};
use crate::sites::{SiteProbe, StaticSiteList, find_missing_sites};
use crate::state::{ExtensionState, RejectionReason};
use crate::validate::validate_catalog;

const CONTACT_AUTHOR: &str = "Please contact the author of the extension.";

/// Subject used when an extension panics before it can name itself.
const UNREADABLE_ID: &str = "<unreadable>";

/// Everything produced by one boot.
struct Session {
    id: SessionId,
    catalog: Arc<Catalog>,
    report: BootReport,
    states: BTreeMap<String, ExtensionState>,
    /// Known extensions with valid, unique ids, in priority order.
    extensions: Vec<Arc<dyn Extension>>,
    /// What each of `extensions` declared, index for index.
    declarations: Vec<Declaration>,
    manager: ExtensionManager,
}

impl Session {
    fn registered(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations
            .iter()
            .filter(|declaration| is_registered(&self.states, &declaration.id))
    }
}

/// An extension whose id passed validation, with the declaration read from
/// it at intake. Later steps consult the declaration, never the extension.
struct Accepted {
    extension: Box<dyn Extension>,
    declaration: Declaration,
}

impl Accepted {
    fn id(&self) -> &str {
        &self.declaration.id
    }
}

/// Boots extensions into a catalog.
pub struct Engine {
    options: BootOptions,
    settings: ActivationSettings,
    events: Arc<EventBus>,
    site_probe: Box<dyn SiteProbe>,
    session: Option<Session>,
}

impl Engine {
    pub fn new(options: BootOptions, settings: ActivationSettings) -> Self {
        let site_probe = Box::new(StaticSiteList::new(options.available_sites.iter().cloned()));
        Self {
            options,
            settings,
            events: Arc::new(EventBus::new()),
            site_probe,
            session: None,
        }
    }

    /// Replace the probe used to check repository-site dependencies.
    pub fn with_site_probe(mut self, probe: impl SiteProbe + 'static) -> Self {
        self.site_probe = Box::new(probe);
        self
    }

    pub fn options(&self) -> &BootOptions {
        &self.options
    }

    /// Activation settings, including changes made during boot.
    pub fn settings(&self) -> &ActivationSettings {
        &self.settings
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// The event bus, for listeners that need to outlive a borrow of the
    /// engine. It is the same bus across reloads.
    pub fn shared_events(&self) -> Arc<EventBus> {
        Arc::clone(&self.events)
    }

    pub fn is_booted(&self) -> bool {
        self.session.is_some()
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session.as_ref().map(|session| session.id)
    }

    /// Boot the catalog from `discovered`.
    ///
    /// # Errors
    ///
    /// Returns `Error::AlreadyBooted` if the engine already holds a session.
    /// Problems with individual extensions never fail the boot; they are
    /// recorded in the returned report.
    pub fn boot(&mut self, discovered: Vec<Discovered>) -> Result<&BootReport> {
        if self.session.is_some() {
            return Err(Error::AlreadyBooted);
        }
        let session = self.run(discovered);
        Ok(&self.session.insert(session).report)
    }

    /// Discard the current session and boot again.
    pub fn reload(&mut self, discovered: Vec<Discovered>) -> Result<&BootReport> {
        if let Some(previous) = self.session.take() {
            tracing::info!(session = %previous.id, "discarding session for reload");
        }
        self.boot(discovered)
    }

    pub fn catalog(&self) -> Result<&Catalog> {
        Ok(self.session()?.catalog.as_ref())
    }

    /// Shareable handle to the frozen catalog.
    pub fn shared_catalog(&self) -> Result<Arc<Catalog>> {
        Ok(Arc::clone(&self.session()?.catalog))
    }

    pub fn report(&self) -> Result<&BootReport> {
        Ok(&self.session()?.report)
    }

    /// State of an extension in the current session, including rejected
    /// ones.
    pub fn extension_state(&self, id: &str) -> Option<ExtensionState> {
        self.session.as_ref()?.states.get(id).copied()
    }

    pub fn states(&self) -> Result<&BTreeMap<String, ExtensionState>> {
        Ok(&self.session()?.states)
    }

    /// Known extensions in priority order.
    pub fn extensions(&self) -> Result<&[Arc<dyn Extension>]> {
        Ok(&self.session()?.extensions)
    }

    pub fn extension(&self, id: &str) -> Option<&Arc<dyn Extension>> {
        let session = self.session.as_ref()?;
        let index = session
            .declarations
            .iter()
            .position(|declaration| declaration.id == id)?;
        session.extensions.get(index)
    }

    /// Declarations of the known extensions, in priority order.
    pub fn declarations(&self) -> Result<&[Declaration]> {
        Ok(&self.session()?.declarations)
    }

    pub fn declaration(&self, id: &str) -> Option<&Declaration> {
        self.session
            .as_ref()?
            .declarations
            .iter()
            .find(|declaration| declaration.id == id)
    }

    /// Ids of the extensions that contributed to the catalog, in priority
    /// order.
    pub fn registered_extensions(&self) -> Result<Vec<&str>> {
        Ok(self
            .session()?
            .registered()
            .map(|declaration| declaration.id.as_str())
            .collect())
    }

    /// Dependencies not satisfied by any registered extension, either
    /// because nothing registered provides the id or because the version is
    /// too old.
    pub fn find_unsatisfied_dependencies(&self, dependencies: &[Dependency]) -> Result<Vec<Dependency>> {
        let registered: Vec<&Declaration> = self.session()?.registered().collect();
        Ok(unsatisfied(dependencies, &registered))
    }

    pub fn manager(&self) -> Result<&ExtensionManager> {
        Ok(&self.session()?.manager)
    }

    /// Extensions that are known but neither active nor silenced.
    pub fn new_extensions(&self) -> Result<&BTreeSet<String>> {
        Ok(self.session()?.manager.new_extensions())
    }

    /// Silence the current new extensions.
    pub fn dismiss_new_extensions(&mut self) -> Result<()> {
        let session = self.session.as_mut().ok_or(Error::NotBooted)?;
        session.manager.dismiss_new_extensions(&mut self.settings);
        Ok(())
    }

    /// Activate `id` and its dependencies on the next boot.
    pub fn schedule_activate(&mut self, id: &str) -> Result<BTreeSet<String>> {
        let session = self.session.as_mut().ok_or(Error::NotBooted)?;
        session.manager.schedule_activate(&mut self.settings, id)
    }

    /// Deactivate `id` and its dependents on the next boot.
    pub fn schedule_deactivate(&mut self, id: &str) -> Result<BTreeSet<String>> {
        let session = self.session.as_mut().ok_or(Error::NotBooted)?;
        session.manager.schedule_deactivate(&mut self.settings, id)
    }

    fn session(&self) -> Result<&Session> {
        self.session.as_ref().ok_or(Error::NotBooted)
    }

    fn run(&mut self, mut discovered: Vec<Discovered>) -> Session {
        let session = SessionId::next();
        tracing::info!(%session, extensions = discovered.len(), "booting");

        let mut report = BootReport::new(session);
        let mut states = BTreeMap::new();

        sort_by_priority(&mut discovered);
        let mut accepted = self.validate_identities(session, discovered, &mut states, &mut report);

        let candidates: Vec<Candidate> = accepted
            .iter()
            .map(|entry| Candidate::from_declaration(&entry.declaration))
            .collect();
        log_cycles(&candidates);
        let implied = implied_loaded(
            &candidates,
            &self.settings.activated_extensions,
            &self.options.core_extensions,
        );
        for entry in &accepted {
            let state = if implied.contains(entry.id()) {
                ExtensionState::DependencyEligible
            } else {
                tracing::debug!(extension = %entry.id(), "not activated, parking");
                ExtensionState::Parked
            };
            states.insert(entry.id().to_string(), state);
        }

        self.check_pre_activation(&accepted, &mut states, &mut report);
        activate(session, &implied, &mut accepted, &mut states, &mut report);

        let mut catalog = Catalog::new(session, Arc::clone(&self.events));
        let mut postprocess = self.register(session, &accepted, &mut catalog, &mut states, &mut report);

        let validation = validate_catalog(&mut catalog, self.options.validate_node_types, &mut report);
        tracing::debug!(removed = validation.total_removed(), "catalog validated");

        let registered: Vec<&Accepted> = accepted
            .iter()
            .filter(|entry| is_registered(&states, entry.id()))
            .collect();
        let declared: Vec<&Declaration> = registered.iter().map(|entry| &entry.declaration).collect();
        check_dependencies(&declared, &mut report);
        if self.options.validate_repository_sites {
            self.check_sites(&declared, &mut report);
        }
        postprocess_all(&registered, &mut postprocess, &mut catalog, &mut states, &mut report);

        let (extensions, declarations): (Vec<Arc<dyn Extension>>, Vec<Declaration>) = accepted
            .into_iter()
            .map(|entry| (Arc::from(entry.extension), entry.declaration))
            .unzip();
        let active: BTreeSet<String> = declarations
            .iter()
            .filter(|declaration| is_registered(&states, &declaration.id))
            .map(|declaration| declaration.id.clone())
            .collect();
        let mut manager =
            ExtensionManager::from_declarations(&declarations, &self.options.core_extensions)
                .with_active(active);
        let new_extensions = manager.find_new_extensions(&self.settings);
        if !new_extensions.is_empty() {
            tracing::info!(
                "new extensions available: {}",
                new_extensions.iter().cloned().collect::<Vec<_>>().join(", ")
            );
        }

        tracing::info!(
            %session,
            entries = catalog.len(),
            issues = report.len(),
            "boot finished"
        );
        Session {
            id: session,
            catalog: Arc::new(catalog),
            report,
            states,
            extensions,
            declarations,
            manager,
        }
    }

    /// Read each declaration once, reject malformed and duplicate ids and
    /// announce the rest.
    ///
    /// A duplicate never touches the state recorded for the first
    /// extension with its id.
    fn validate_identities(
        &self,
        session: SessionId,
        discovered: Vec<Discovered>,
        states: &mut BTreeMap<String, ExtensionState>,
        report: &mut BootReport,
    ) -> Vec<Accepted> {
        let mut accepted: Vec<Accepted> = Vec::new();
        for Discovered { extension, priority } in discovered {
            let declaration = match Declaration::read(extension.as_ref()) {
                Ok(declaration) => declaration,
                Err(panic) => {
                    let id = isolate(|| extension.id().to_string())
                        .unwrap_or_else(|_| UNREADABLE_ID.to_string());
                    tracing::warn!(extension = %id, "declaration panicked: {}", panic);
                    report.push(
                        Issue::new(
                            IssueKind::ErroneousExtension,
                            Severity::Error,
                            &id,
                            "extension declaration could not be read",
                        )
                        .with_explanation(format!("panicked: {panic}"))
                        .with_fix(CONTACT_AUTHOR),
                    );
                    states
                        .entry(id)
                        .or_insert(ExtensionState::Rejected(RejectionReason::DeclarationFailed));
                    continue;
                }
            };
            let id = declaration.id.clone();
            tracing::debug!(extension = %id, priority, version = %declaration.version, "discovered");
            let first_seen = !states.contains_key(&id);
            states.entry(id.clone()).or_default();

            if let Err(e) = ExtensionId::parse(&id) {
                report.push(
                    Issue::new(IssueKind::InvalidId, Severity::Error, &id, "invalid extension id")
                        .with_explanation(e.to_string())
                        .with_fix(CONTACT_AUTHOR),
                );
                if first_seen {
                    states.insert(id, ExtensionState::Rejected(RejectionReason::InvalidId));
                }
                continue;
            }
            if accepted.iter().any(|existing| existing.id() == id) {
                report.push(
                    Issue::new(IssueKind::DuplicateExtension, Severity::Error, &id, "duplicate extension id")
                        .with_explanation(format!(
                            "another extension with id '{id}' was discovered first; version {} is ignored",
                            declaration.version
                        ))
                        .with_fix("Remove one of the installed copies."),
                );
                continue;
            }

            states.insert(id, ExtensionState::IdValidated);
            self.events.extension_discovered.emit(&ExtensionDiscovered {
                session,
                extension: declaration.to_ref(),
            });
            accepted.push(Accepted { extension, declaration });
        }
        accepted
    }

    fn check_pre_activation(
        &mut self,
        accepted: &[Accepted],
        states: &mut BTreeMap<String, ExtensionState>,
        report: &mut BootReport,
    ) {
        for entry in accepted {
            let id = entry.id();
            if states.get(id) != Some(&ExtensionState::DependencyEligible) {
                continue;
            }
            let mut check = CheckReport::new();
            if let Err(panic) = isolate(|| entry.extension.pre_activation_check(&mut check)) {
                check.report(
                    "pre-activation check crashed",
                    format!("the check panicked: {panic}"),
                    CONTACT_AUTHOR,
                );
            }
            if check.is_empty() {
                states.insert(id.to_string(), ExtensionState::PreActivationChecked);
                continue;
            }

            let blocking = !self.options.ignore_pre_activation_failures;
            let severity = if blocking { Severity::Error } else { Severity::Warning };
            for failure in check.into_failures() {
                report.push(
                    Issue::new(IssueKind::PreActivation, severity, id, failure.title)
                        .with_explanation(failure.explanation)
                        .with_fix(failure.fix),
                );
            }
            if blocking {
                if self.settings.deactivate(id) {
                    tracing::info!(extension = %id, "removed from activated extensions");
                }
                states.insert(
                    id.to_string(),
                    ExtensionState::Rejected(RejectionReason::PreActivationFailed),
                );
            } else {
                states.insert(id.to_string(), ExtensionState::PreActivationChecked);
            }
        }
    }

    /// Let every activated extension register, then drain the task queue.
    /// Returns the postprocess tasks of successfully registered extensions.
    fn register(
        &self,
        session: SessionId,
        accepted: &[Accepted],
        catalog: &mut Catalog,
        states: &mut BTreeMap<String, ExtensionState>,
        report: &mut BootReport,
    ) -> Vec<PostprocessTask> {
        let mut tasks: TaskQueue<Catalog> = TaskQueue::new();
        let mut postprocess = Vec::new();

        for entry in accepted {
            let id = entry.id();
            if states.get(id) != Some(&ExtensionState::Activated) {
                continue;
            }
            tracing::debug!(extension = %id, "registering");

            let mut deferred = Vec::new();
            let outcome = {
                let mut registrar = Registrar::new(id, catalog, &mut tasks, &mut deferred);
                flatten(isolate(|| entry.extension.register(&mut registrar)))
            };

            match outcome {
                Ok(()) => {
                    states.insert(id.to_string(), ExtensionState::Registered);
                    postprocess.extend(deferred);
                    self.events.extension_registered.emit(&ExtensionRegistered {
                        session,
                        extension: entry.declaration.to_ref(),
                    });
                }
                Err(message) => {
                    report.push(
                        Issue::new(
                            IssueKind::ErroneousExtension,
                            Severity::Error,
                            id,
                            "extension could not be registered",
                        )
                        .with_explanation(message)
                        .with_fix(CONTACT_AUTHOR),
                    );
                    let discarded = tasks.discard_owned_by(id);
                    let content = catalog.content_of(id);
                    for entry in &content {
                        catalog.unregister(entry);
                    }
                    tracing::debug!(
                        extension = %id,
                        discarded,
                        removed = content.len(),
                        "rolled back failed registration"
                    );
                    states.insert(
                        id.to_string(),
                        ExtensionState::Rejected(RejectionReason::RegistrationFailed),
                    );
                }
            }
        }

        tracing::debug!("registering {} remaining scheduled task(s)", tasks.len());
        let drained = tasks.drain(catalog);
        tracing::debug!(
            passes = drained.passes,
            completed = drained.completed,
            "task queue drained"
        );
        for abandoned in drained.abandoned {
            report.push(
                Issue::new(
                    IssueKind::AbandonedTask,
                    Severity::Warning,
                    &abandoned.owner,
                    format!("could not complete {}", abandoned.description),
                )
                .with_explanation(abandoned.reason)
                .with_fix("Check that all required extensions are activated."),
            );
        }
        postprocess
    }

    fn check_sites(&self, registered: &[&Declaration], report: &mut BootReport) {
        let required: Vec<(String, SiteDependency)> = registered
            .iter()
            .flat_map(|declaration| {
                declaration
                    .sites
                    .iter()
                    .map(|site| (declaration.id.clone(), site.clone()))
            })
            .collect();
        for missing in find_missing_sites(&required, self.site_probe.as_ref()) {
            report.push(
                Issue::new(
                    IssueKind::MissingSite,
                    Severity::Warning,
                    &missing.site.name,
                    "required repository site is not active",
                )
                .with_explanation(format!(
                    "'{}' requires the site '{}' at {}",
                    missing.extension_id, missing.site.name, missing.site.url
                ))
                .with_fix(format!("Activate the repository site '{}'.", missing.site.name)),
            );
        }
    }
}

fn activate(
    session: SessionId,
    loaded: &BTreeSet<String>,
    accepted: &mut [Accepted],
    states: &mut BTreeMap<String, ExtensionState>,
    report: &mut BootReport,
) {
    let context = ActivationContext { session, loaded };
    for entry in accepted.iter_mut() {
        let id = entry.declaration.id.clone();
        if states.get(&id) != Some(&ExtensionState::PreActivationChecked) {
            continue;
        }
        match flatten(isolate(|| entry.extension.activate(&context))) {
            Ok(()) => {
                states.insert(id, ExtensionState::Activated);
            }
            Err(message) => {
                report.push(
                    Issue::new(IssueKind::ErroneousExtension, Severity::Error, &id, "extension could not be activated")
                        .with_explanation(message)
                        .with_fix(CONTACT_AUTHOR),
                );
                states.insert(id, ExtensionState::Rejected(RejectionReason::ActivationFailed));
            }
        }
    }
}

fn check_dependencies(registered: &[&Declaration], report: &mut BootReport) {
    for declaration in registered {
        for dependency in unsatisfied(&declaration.dependencies, registered) {
            let requirement = match &dependency.min_version {
                Some(version) => format!("'{}' (version {version} or newer)", dependency.id),
                None => format!("'{}'", dependency.id),
            };
            report.push(
                Issue::new(
                    IssueKind::UnsatisfiedDependency,
                    Severity::Warning,
                    &declaration.id,
                    "dependency is not satisfied",
                )
                .with_explanation(format!("requires {requirement}, which is not registered"))
                .with_fix(format!("Activate or update {requirement}.")),
            );
        }
    }
}

fn postprocess_all(
    registered: &[&Accepted],
    deferred: &mut Vec<PostprocessTask>,
    catalog: &mut Catalog,
    states: &mut BTreeMap<String, ExtensionState>,
    report: &mut BootReport,
) {
    for entry in registered {
        let id = entry.id();
        let mut ok = true;
        let (own, rest): (Vec<_>, Vec<_>) = std::mem::take(deferred)
            .into_iter()
            .partition(|task| task.owner == id);
        *deferred = rest;

        let mut context = PostprocessContext::new(id, catalog);
        for task in own {
            let description = task.description.clone();
            if let Err(message) = flatten(isolate(|| task.run(&mut context))) {
                postprocess_failed(report, id, &description, message);
                ok = false;
            }
        }
        if let Err(message) = flatten(isolate(|| entry.extension.postprocess(&mut context))) {
            postprocess_failed(report, id, "postprocess", message);
            ok = false;
        }
        if ok {
            states.insert(id.to_string(), ExtensionState::Postprocessed);
        }
    }
}

fn postprocess_failed(report: &mut BootReport, id: &str, what: &str, message: String) {
    report.push(
        Issue::new(IssueKind::ErroneousPostprocess, Severity::Warning, id, format!("{what} failed"))
            .with_explanation(message)
            .with_fix(CONTACT_AUTHOR),
    );
}

fn is_registered(states: &BTreeMap<String, ExtensionState>, id: &str) -> bool {
    states.get(id).is_some_and(|state| state.is_registered())
}

fn log_cycles(candidates: &[Candidate]) {
    let graph = DependencyGraph::from_extensions(
        candidates
            .iter()
            .map(|c| (c.id.as_str(), c.dependencies.iter().map(String::as_str))),
    );
    let cycles = graph.cycle_participants();
    tracing::debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        has_cycles = !cycles.is_empty(),
        "created dependency graph"
    );
    if !cycles.is_empty() {
        tracing::warn!(
            "cyclic dependencies detected; extensions on a cycle: {}",
            cycles.into_iter().collect::<Vec<_>>().join(", ")
        );
    }
}

/// Dependencies in `dependencies` that no extension in `registered`
/// satisfies by id, provided id and version.
pub fn unsatisfied(dependencies: &[Dependency], registered: &[&Declaration]) -> Vec<Dependency> {
    dependencies
        .iter()
        .filter(|dependency| {
            !registered.iter().any(|declaration| {
                declaration.answers_to(&dependency.id)
                    && dependency.min_version.as_deref().is_none_or(|minimum| {
                        version::satisfies_minimum(&declaration.version, minimum).unwrap_or_else(|e| {
                            tracing::debug!(extension = %declaration.id, "cannot compare versions: {}", e);
                            false
                        })
                    })
            })
        })
        .cloned()
        .collect()
}

/// Merge a caught panic and a returned error into one failure message.
fn flatten(outcome: std::result::Result<std::result::Result<(), BoxError>, String>) -> std::result::Result<(), String> {
    match outcome {
        Ok(Ok(())) => Ok(()),
        Ok(Err(error)) => Err(error.to_string()),
        Err(panic) => Err(format!("panicked: {panic}")),
    }
}
