//! Activation management between sessions.
//!
//! Activating or deactivating an extension only takes effect on the next
//! boot. The manager records what is scheduled and keeps the persisted
//! [`ActivationSettings`] consistent with the dependency graph: activating
//! pulls in everything the extension depends on, deactivating takes down
//! everything that depends on it.

use std::collections::BTreeSet;

use flow_extensions::{ActivationSettings, Declaration, DependencyGraph};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct ExtensionManager {
    graph: DependencyGraph,
    known: BTreeSet<String>,
    core: BTreeSet<String>,
    active: BTreeSet<String>,
    scheduled_activate: BTreeSet<String>,
    scheduled_deactivate: BTreeSet<String>,
    new_extensions: BTreeSet<String>,
}

impl ExtensionManager {
    /// Build a manager over the known extensions. Ids in `core_ids` are
    /// treated as core in addition to extensions declaring themselves core.
    pub fn from_declarations<'a, I>(declarations: I, core_ids: &BTreeSet<String>) -> Self
    where
        I: IntoIterator<Item = &'a Declaration>,
    {
        let mut manager = Self {
            core: core_ids.clone(),
            ..Self::default()
        };
        for declaration in declarations {
            let id = declaration.id.as_str();
            manager.graph.add_node(id);
            for dependency in &declaration.dependencies {
                manager.graph.add_edge(id, &dependency.id);
            }
            manager.known.insert(id.to_string());
            if declaration.is_core {
                manager.core.insert(id.to_string());
            }
        }
        let cycles = manager.graph.cycle_participants();
        if !cycles.is_empty() {
            tracing::warn!(
                "cyclic dependencies detected between extensions: {}",
                cycles.into_iter().collect::<Vec<_>>().join(", ")
            );
        }
        manager
    }

    /// Mark the extensions loaded in the current session.
    pub fn with_active(mut self, active: BTreeSet<String>) -> Self {
        self.active = active;
        self
    }

    pub fn dependency_graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn is_known(&self, id: &str) -> bool {
        self.known.contains(id)
    }

    pub fn is_core(&self, id: &str) -> bool {
        self.core.contains(id)
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.active.contains(id)
    }

    /// Activate `id` and all of its dependencies on the next boot. Returns
    /// every id that was scheduled.
    pub fn schedule_activate(
        &mut self,
        settings: &mut ActivationSettings,
        id: &str,
    ) -> Result<BTreeSet<String>> {
        if !self.is_known(id) {
            return Err(Error::UnknownExtension(id.to_string()));
        }
        let mut ids = self.graph.all_dependencies_of(id);
        ids.insert(id.to_string());
        for affected in &ids {
            self.scheduled_deactivate.remove(affected);
            self.scheduled_activate.insert(affected.clone());
            settings.activate(affected);
            // The user chose this; don't announce it as new.
            settings.silence(affected);
        }
        tracing::info!(extension = %id, "scheduled activation of {} extension(s)", ids.len());
        Ok(ids)
    }

    /// Deactivate `id` and everything depending on it on the next boot.
    /// Returns every id that was scheduled.
    pub fn schedule_deactivate(
        &mut self,
        settings: &mut ActivationSettings,
        id: &str,
    ) -> Result<BTreeSet<String>> {
        if !self.is_known(id) {
            return Err(Error::UnknownExtension(id.to_string()));
        }
        if self.is_core(id) {
            return Err(Error::CoreExtension(id.to_string()));
        }
        let mut ids = self.graph.all_dependents_of(id);
        ids.insert(id.to_string());
        for affected in &ids {
            if self.is_core(affected) {
                tracing::warn!(
                    extension = %affected,
                    "core extension depends on '{}' and will keep it loaded",
                    id
                );
            }
            self.scheduled_activate.remove(affected);
            self.scheduled_deactivate.insert(affected.clone());
            settings.deactivate(affected);
            settings.silence(affected);
        }
        tracing::info!(extension = %id, "scheduled deactivation of {} extension(s)", ids.len());
        Ok(ids)
    }

    /// Undo a pending activation or deactivation of `id`.
    pub fn clear_schedule(&mut self, settings: &mut ActivationSettings, id: &str) -> Result<()> {
        if self.scheduled_deactivate.contains(id) {
            self.schedule_activate(settings, id)?;
        }
        if self.scheduled_activate.contains(id) && !self.is_active(id) {
            self.schedule_deactivate(settings, id)?;
        }
        self.scheduled_activate.remove(id);
        self.scheduled_deactivate.remove(id);
        Ok(())
    }

    pub fn scheduled_activations(&self) -> &BTreeSet<String> {
        &self.scheduled_activate
    }

    pub fn scheduled_deactivations(&self) -> &BTreeSet<String> {
        &self.scheduled_deactivate
    }

    pub fn will_be_activated_on_next_startup(&self, id: &str) -> bool {
        if self.is_core(id) {
            return true;
        }
        if self.is_active(id) {
            !self.scheduled_deactivate.contains(id)
        } else {
            self.scheduled_activate.contains(id)
        }
    }

    pub fn will_be_deactivated_on_next_startup(&self, id: &str) -> bool {
        !self.will_be_activated_on_next_startup(id)
    }

    /// Recompute the extensions that are neither active nor silenced.
    pub fn find_new_extensions(&mut self, settings: &ActivationSettings) -> &BTreeSet<String> {
        self.new_extensions = self
            .known
            .iter()
            .filter(|id| !self.active.contains(*id) && !settings.is_silenced(id))
            .cloned()
            .collect();
        &self.new_extensions
    }

    pub fn new_extensions(&self) -> &BTreeSet<String> {
        &self.new_extensions
    }

    /// Stop announcing the current new extensions.
    pub fn dismiss_new_extensions(&mut self, settings: &mut ActivationSettings) {
        for id in std::mem::take(&mut self.new_extensions) {
            settings.silence(&id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_test_utils::TestExtension;
    use pretty_assertions::assert_eq;

    fn ids(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|id| id.to_string()).collect()
    }

    fn manager() -> ExtensionManager {
        let extensions = [
            TestExtension::new("m:core").core(),
            TestExtension::new("m:io").depends_on("m:core"),
            TestExtension::new("m:viewer").depends_on("m:io"),
            TestExtension::new("m:other"),
        ];
        let declarations: Vec<Declaration> = extensions
            .iter()
            .map(|e| Declaration::read(e).unwrap())
            .collect();
        ExtensionManager::from_declarations(&declarations, &BTreeSet::new())
            .with_active(ids(&["m:core", "m:io"]))
    }

    #[test]
    fn test_activate_pulls_in_dependencies() {
        let mut manager = manager();
        let mut settings = ActivationSettings::new();

        let scheduled = manager.schedule_activate(&mut settings, "m:viewer").unwrap();

        assert_eq!(scheduled, ids(&["m:core", "m:io", "m:viewer"]));
        assert!(settings.is_activated("m:viewer"));
        assert!(settings.is_silenced("m:viewer"));
        assert!(manager.will_be_activated_on_next_startup("m:viewer"));
    }

    #[test]
    fn test_deactivate_takes_down_dependents() {
        let mut manager = manager();
        let mut settings = ActivationSettings::with_activated(["m:io", "m:viewer"]);

        let scheduled = manager.schedule_deactivate(&mut settings, "m:io").unwrap();

        assert_eq!(scheduled, ids(&["m:io", "m:viewer"]));
        assert!(settings.activated_extensions.is_empty());
        assert!(manager.will_be_deactivated_on_next_startup("m:io"));
    }

    #[test]
    fn test_core_and_unknown_are_refused() {
        let mut manager = manager();
        let mut settings = ActivationSettings::new();
        assert!(matches!(
            manager.schedule_deactivate(&mut settings, "m:core"),
            Err(Error::CoreExtension(_))
        ));
        assert!(matches!(
            manager.schedule_activate(&mut settings, "m:missing"),
            Err(Error::UnknownExtension(_))
        ));
    }

    #[test]
    fn test_new_extensions_and_dismiss() {
        let mut manager = manager();
        let mut settings = ActivationSettings::new();

        assert_eq!(manager.find_new_extensions(&settings), &ids(&["m:other", "m:viewer"]));
        manager.dismiss_new_extensions(&mut settings);

        assert!(manager.new_extensions().is_empty());
        assert!(settings.is_silenced("m:other"));
        assert!(manager.find_new_extensions(&settings).is_empty());
    }

    #[test]
    fn test_clear_schedule_restores_activation() {
        let mut manager = manager();
        let mut settings = ActivationSettings::with_activated(["m:io"]);

        manager.schedule_deactivate(&mut settings, "m:io").unwrap();
        manager.clear_schedule(&mut settings, "m:io").unwrap();

        assert!(settings.is_activated("m:io"));
        assert!(manager.scheduled_deactivations().get("m:io").is_none());
        assert!(manager.will_be_activated_on_next_startup("m:io"));
    }
}
