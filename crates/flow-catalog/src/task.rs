//! Deferred registration
//!
//! Extensions do not know the order in which their peers register. Anything
//! whose prerequisites may be contributed later is scheduled as a
//! [`RegistrationTask`] and the [`TaskQueue`] retries it until the catalog
//! reaches a fixed point.

use std::fmt;

use crate::catalog::Catalog;
use crate::entry::CatalogEntry;
use crate::error::BoxError;
use crate::guard::isolate;
use crate::node::NodeInfo;

/// A unit of registration work that may have to wait for other entries.
pub trait RegistrationTask<C> {
    /// Human readable identity used in logs and reports.
    fn describe(&self) -> String;

    /// Id of the extension that scheduled the task.
    fn owner(&self) -> &str;

    /// Whether an attempt can succeed against the current state of `context`.
    fn prerequisites_met(&self, _context: &C) -> bool {
        true
    }

    /// What the task is still waiting for, if it can tell.
    fn waiting_for(&self, _context: &C) -> Option<String> {
        None
    }

    /// Attempt the registration.
    fn register(&mut self, context: &mut C) -> Result<(), BoxError>;
}

/// A task that was still pending when draining stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbandonedTask {
    pub description: String,
    pub owner: String,
    pub reason: String,
}

/// Outcome of [`TaskQueue::drain`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Number of scans over the pending tasks.
    pub passes: usize,
    /// Number of tasks that registered successfully.
    pub completed: usize,
    pub abandoned: Vec<AbandonedTask>,
}

struct Pending<C> {
    task: Box<dyn RegistrationTask<C>>,
    last_error: Option<String>,
}

/// Ordered queue of registration tasks.
pub struct TaskQueue<C> {
    pending: Vec<Pending<C>>,
}

impl<C> TaskQueue<C> {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    pub fn schedule<T>(&mut self, task: T)
    where
        T: RegistrationTask<C> + 'static,
    {
        self.schedule_boxed(Box::new(task));
    }

    pub fn schedule_boxed(&mut self, task: Box<dyn RegistrationTask<C>>) {
        tracing::trace!(owner = %task.owner(), "scheduled {}", task.describe());
        self.pending.push(Pending {
            task,
            last_error: None,
        });
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop every pending task scheduled by `owner`. Returns how many were
    /// removed.
    pub fn discard_owned_by(&mut self, owner: &str) -> usize {
        let before = self.pending.len();
        self.pending.retain(|pending| pending.task.owner() != owner);
        before - self.pending.len()
    }

    /// Run pending tasks until the queue is empty or a full pass completes
    /// nothing. Tasks left over are abandoned and returned in the report.
    ///
    /// A prerequisite check that panics counts as not met; the panic
    /// becomes the task's abandonment reason.
    pub fn drain(&mut self, context: &mut C) -> DrainReport {
        let mut report = DrainReport::default();

        while !self.pending.is_empty() {
            report.passes += 1;
            let mut progress = 0;
            let mut remaining = Vec::with_capacity(self.pending.len());

            for mut pending in std::mem::take(&mut self.pending) {
                match isolate(|| pending.task.prerequisites_met(&*context)) {
                    Ok(true) => {}
                    Ok(false) => {
                        remaining.push(pending);
                        continue;
                    }
                    Err(panic) => {
                        pending.last_error = Some(format!("prerequisite check panicked: {panic}"));
                        remaining.push(pending);
                        continue;
                    }
                }
                let task = &mut pending.task;
                match isolate(|| task.register(context)) {
                    Ok(Ok(())) => {
                        tracing::debug!(owner = %pending.task.owner(), "completed {}", pending.task.describe());
                        progress += 1;
                    }
                    Ok(Err(error)) => {
                        pending.last_error = Some(error.to_string());
                        remaining.push(pending);
                    }
                    Err(panic) => {
                        pending.last_error = Some(format!("panicked: {panic}"));
                        remaining.push(pending);
                    }
                }
            }

            self.pending = remaining;
            report.completed += progress;
            if progress == 0 {
                break;
            }
        }

        for pending in self.pending.drain(..) {
            let reason = match pending.last_error {
                Some(error) => error,
                None => isolate(|| pending.task.waiting_for(&*context))
                    .unwrap_or_else(|panic| Some(format!("panicked: {panic}")))
                    .unwrap_or_else(|| "prerequisites never became available".to_string()),
            };
            tracing::warn!(
                owner = %pending.task.owner(),
                "abandoned {}: {}",
                pending.task.describe(),
                reason
            );
            report.abandoned.push(AbandonedTask {
                description: pending.task.describe(),
                owner: pending.task.owner().to_string(),
                reason,
            });
        }

        report
    }
}

impl<C> Default for TaskQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for TaskQueue<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tasks: Vec<String> = self.pending.iter().map(|p| p.task.describe()).collect();
        f.debug_struct("TaskQueue").field("pending", &tasks).finish()
    }
}

/// Registers a node type once every data type used by its slots exists.
#[derive(Debug, Clone)]
pub struct NodeRegistrationTask {
    info: NodeInfo,
}

impl NodeRegistrationTask {
    pub fn new(info: NodeInfo) -> Self {
        Self { info }
    }
}

impl RegistrationTask<Catalog> for NodeRegistrationTask {
    fn describe(&self) -> String {
        format!("registration of {}", self.info.content_ref())
    }

    fn owner(&self) -> &str {
        self.info.source()
    }

    fn prerequisites_met(&self, catalog: &Catalog) -> bool {
        catalog.missing_data_types(&self.info).is_empty()
    }

    fn waiting_for(&self, catalog: &Catalog) -> Option<String> {
        let missing = catalog.missing_data_types(&self.info);
        (!missing.is_empty()).then(|| format!("data types not registered: {}", missing.join(", ")))
    }

    fn register(&mut self, catalog: &mut Catalog) -> Result<(), BoxError> {
        catalog.register_node(self.info.clone())?;
        Ok(())
    }
}

type Condition<C> = Box<dyn Fn(&C) -> bool>;
type Action<C> = Box<dyn FnMut(&mut C) -> Result<(), BoxError>>;

/// Closure-backed task for entries assembled at registration time.
pub struct DeferredTask<C> {
    owner: String,
    description: String,
    condition: Option<Condition<C>>,
    action: Action<C>,
}

impl<C> DeferredTask<C> {
    pub fn new<F>(owner: impl Into<String>, description: impl Into<String>, action: F) -> Self
    where
        F: FnMut(&mut C) -> Result<(), BoxError> + 'static,
    {
        Self {
            owner: owner.into(),
            description: description.into(),
            condition: None,
            action: Box::new(action),
        }
    }

    /// Only attempt the task once `condition` holds.
    pub fn when<F>(mut self, condition: F) -> Self
    where
        F: Fn(&C) -> bool + 'static,
    {
        self.condition = Some(Box::new(condition));
        self
    }
}

impl<C> RegistrationTask<C> for DeferredTask<C> {
    fn describe(&self) -> String {
        self.description.clone()
    }

    fn owner(&self) -> &str {
        &self.owner
    }

    fn prerequisites_met(&self, context: &C) -> bool {
        self.condition.as_ref().is_none_or(|condition| condition(context))
    }

    fn register(&mut self, context: &mut C) -> Result<(), BoxError> {
        (self.action)(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataTypeInfo;
    use crate::node::{GraphNode, ParameterSlot};
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use std::collections::BTreeSet;

    type Names = BTreeSet<String>;

    fn needs(owner: &str, name: &'static str, after: Option<&'static str>) -> DeferredTask<Names> {
        let task = DeferredTask::new(owner, format!("add {name}"), move |names: &mut Names| {
            names.insert(name.to_string());
            Ok(())
        });
        match after {
            Some(prerequisite) => task.when(move |names: &Names| names.contains(prerequisite)),
            None => task,
        }
    }

    #[test]
    fn test_chain_scheduled_in_reverse_completes_in_three_passes() {
        let mut queue = TaskQueue::new();
        queue.schedule(needs("x:y", "c", Some("b")));
        queue.schedule(needs("x:y", "b", Some("a")));
        queue.schedule(needs("x:y", "a", None));

        let mut names = Names::new();
        let report = queue.drain(&mut names);

        assert_eq!(report.passes, 3);
        assert_eq!(report.completed, 3);
        assert!(report.abandoned.is_empty());
        assert_eq!(names.len(), 3);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_unsatisfiable_task_is_abandoned_after_one_idle_pass() {
        let mut queue = TaskQueue::new();
        queue.schedule(needs("x:y", "orphan", Some("never")));

        let report = queue.drain(&mut Names::new());

        assert_eq!(report.passes, 1);
        assert_eq!(report.completed, 0);
        assert_eq!(
            report.abandoned,
            vec![AbandonedTask {
                description: "add orphan".into(),
                owner: "x:y".into(),
                reason: "prerequisites never became available".into(),
            }]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn test_failures_and_panics_are_retried_then_abandoned() {
        let mut queue: TaskQueue<Names> = TaskQueue::new();
        queue.schedule(DeferredTask::new("x:fail", "failing", |_: &mut Names| {
            Err("disk full".into())
        }));
        queue.schedule(DeferredTask::new("x:panic", "panicking", |_: &mut Names| {
            panic!("bug in extension")
        }));
        queue.schedule(needs("x:ok", "fine", None));

        let mut names = Names::new();
        let report = queue.drain(&mut names);

        // First pass completes "fine", second pass makes no progress.
        assert_eq!(report.passes, 2);
        assert_eq!(report.completed, 1);
        let reasons: Vec<&str> = report.abandoned.iter().map(|a| a.reason.as_str()).collect();
        assert_eq!(reasons, vec!["disk full", "panicked: bug in extension"]);
        assert!(names.contains("fine"));
    }

    #[test]
    fn test_panicking_condition_only_abandons_its_task() {
        let mut queue: TaskQueue<Names> = TaskQueue::new();
        queue.schedule(
            DeferredTask::new("x:bad", "guarded", |names: &mut Names| {
                names.insert("guarded".to_string());
                Ok(())
            })
            .when(|_: &Names| panic!("condition bug")),
        );
        queue.schedule(needs("x:ok", "fine", None));
        queue.schedule(needs("x:ok", "later", Some("fine")));

        let mut names = Names::new();
        let report = queue.drain(&mut names);

        assert_eq!(report.completed, 2);
        assert_eq!(report.abandoned.len(), 1);
        assert_eq!(report.abandoned[0].owner, "x:bad");
        assert_eq!(report.abandoned[0].reason, "prerequisite check panicked: condition bug");
        assert!(names.contains("later"));
        assert!(!names.contains("guarded"));
        assert!(queue.is_empty());
    }

    struct Confused;

    impl RegistrationTask<Names> for Confused {
        fn describe(&self) -> String {
            "confused".to_string()
        }

        fn owner(&self) -> &str {
            "x:confused"
        }

        fn prerequisites_met(&self, _names: &Names) -> bool {
            false
        }

        fn waiting_for(&self, _names: &Names) -> Option<String> {
            panic!("lost track")
        }

        fn register(&mut self, _names: &mut Names) -> Result<(), BoxError> {
            Ok(())
        }
    }

    #[test]
    fn test_panicking_waiting_for_still_reports_the_task() {
        let mut queue: TaskQueue<Names> = TaskQueue::new();
        queue.schedule(Confused);

        let report = queue.drain(&mut Names::new());

        assert_eq!(
            report.abandoned,
            vec![AbandonedTask {
                description: "confused".into(),
                owner: "x:confused".into(),
                reason: "panicked: lost track".into(),
            }]
        );
    }

    #[test]
    fn test_discard_owned_by() {
        let mut queue = TaskQueue::new();
        queue.schedule(needs("a:one", "x", None));
        queue.schedule(needs("b:two", "y", None));
        queue.schedule(needs("a:one", "z", None));

        assert_eq!(queue.discard_owned_by("a:one"), 2);
        assert_eq!(queue.len(), 1);
    }

    #[derive(Debug, Clone)]
    struct Passthrough;

    impl GraphNode for Passthrough {
        fn node_type_id(&self) -> &str {
            "passthrough"
        }

        fn parameters(&self) -> Vec<ParameterSlot> {
            Vec::new()
        }

        fn duplicate(&self) -> Result<Box<dyn GraphNode>, BoxError> {
            Ok(Box::new(self.clone()))
        }

        fn to_json(&self) -> Result<Value, BoxError> {
            Ok(json!(null))
        }

        fn load_json(&mut self, _value: &Value) -> Result<(), BoxError> {
            Ok(())
        }
    }

    #[test]
    fn test_node_task_waits_for_data_type() {
        let mut catalog = Catalog::detached();
        let mut queue = TaskQueue::new();

        let mut node = NodeInfo::new("passthrough", "Passthrough", || Ok(Box::new(Passthrough)))
            .with_input("in", "table")
            .with_output("out", "table");
        node.set_source("vendor:nodes");
        queue.schedule(NodeRegistrationTask::new(node));

        let mut table = DataTypeInfo::new("table", "Table");
        table.set_source("vendor:data");
        queue.schedule(DeferredTask::new(
            "vendor:data",
            "registration of data type 'table'",
            move |catalog: &mut Catalog| {
                catalog.register_data_type(table.clone())?;
                Ok(())
            },
        ));

        let report = queue.drain(&mut catalog);

        assert_eq!(report.completed, 2);
        assert_eq!(report.passes, 2);
        assert_eq!(catalog.nodes().get("passthrough").unwrap().source(), "vendor:nodes");
    }

    #[test]
    fn test_abandoned_node_task_names_missing_data_types() {
        let mut catalog = Catalog::detached();
        let mut queue = TaskQueue::new();
        let mut node = NodeInfo::new("passthrough", "Passthrough", || Ok(Box::new(Passthrough)))
            .with_input("in", "image");
        node.set_source("vendor:nodes");
        queue.schedule(NodeRegistrationTask::new(node));

        let report = queue.drain(&mut catalog);

        assert_eq!(report.abandoned.len(), 1);
        assert_eq!(report.abandoned[0].reason, "data types not registered: image");
        assert_eq!(report.abandoned[0].description, "registration of node type 'passthrough'");
    }
}
