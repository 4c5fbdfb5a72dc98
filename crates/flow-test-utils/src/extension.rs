//! [`TestExtension`] builder for boot scenarios.

use std::sync::Arc;

use flow_catalog::BoxError;
use flow_extensions::{
    ActivationContext, CheckReport, Dependency, Extension, ExtensionMetadata, PostprocessContext,
    Registrar, SiteDependency,
};

use crate::node::{NodeBehavior, test_data_type, test_node_info, test_parameter_type};

type CheckHook = Arc<dyn Fn(&mut CheckReport) + Send + Sync>;
type ActivateHook = Arc<dyn Fn(&ActivationContext<'_>) -> Result<(), BoxError> + Send + Sync>;
type RegisterHook = Arc<dyn Fn(&mut Registrar<'_>) -> Result<(), BoxError> + Send + Sync>;
type PostprocessHook = Arc<dyn Fn(&mut PostprocessContext<'_>) -> Result<(), BoxError> + Send + Sync>;

/// Content an extension registers, in this order: parameter types, data
/// types, nodes, scheduled nodes.
#[derive(Debug, Clone, Default)]
struct Content {
    parameter_types: Vec<String>,
    data_types: Vec<String>,
    nodes: Vec<(String, NodeBehavior)>,
    scheduled_nodes: Vec<(String, String)>,
}

/// An extension assembled from builder calls.
///
/// # Example
///
/// ```
/// use flow_test_utils::{NodeBehavior, TestExtension};
/// use flow_extensions::Extension;
///
/// let extension = TestExtension::new("acme:tool")
///     .depends_on("org.flow:core")
///     .registers_node("acme-sort", NodeBehavior::Healthy);
/// assert_eq!(extension.dependencies().len(), 1);
/// ```
#[derive(Clone)]
pub struct TestExtension {
    id: String,
    version: String,
    metadata: ExtensionMetadata,
    core: bool,
    dependencies: Vec<Dependency>,
    provides: Vec<String>,
    sites: Vec<SiteDependency>,
    content: Content,
    on_check: Option<CheckHook>,
    on_activate: Option<ActivateHook>,
    on_register: Option<RegisterHook>,
    on_postprocess: Option<PostprocessHook>,
}

impl TestExtension {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            metadata: ExtensionMetadata::new(format!("Test extension {id}")),
            id,
            version: "1.0.0".to_string(),
            core: false,
            dependencies: Vec::new(),
            provides: Vec::new(),
            sites: Vec::new(),
            content: Content::default(),
            on_check: None,
            on_activate: None,
            on_register: None,
            on_postprocess: None,
        }
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn core(mut self) -> Self {
        self.core = true;
        self
    }

    pub fn depends_on(mut self, id: impl Into<String>) -> Self {
        self.dependencies.push(Dependency::new(id));
        self
    }

    pub fn depends_on_version(mut self, id: impl Into<String>, min_version: impl Into<String>) -> Self {
        self.dependencies.push(Dependency::at_least(id, min_version));
        self
    }

    pub fn provides(mut self, id: impl Into<String>) -> Self {
        self.provides.push(id.into());
        self
    }

    pub fn with_site(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.sites.push(SiteDependency::new(name, url));
        self
    }

    pub fn registers_parameter_type(mut self, id: impl Into<String>) -> Self {
        self.content.parameter_types.push(id.into());
        self
    }

    pub fn registers_data_type(mut self, id: impl Into<String>) -> Self {
        self.content.data_types.push(id.into());
        self
    }

    pub fn registers_node(mut self, id: impl Into<String>, behavior: NodeBehavior) -> Self {
        self.content.nodes.push((id.into(), behavior));
        self
    }

    /// Schedule a healthy node with one input of `data_type`; it registers
    /// once that data type exists.
    pub fn schedules_node(mut self, id: impl Into<String>, data_type: impl Into<String>) -> Self {
        self.content.scheduled_nodes.push((id.into(), data_type.into()));
        self
    }

    /// Report a pre-activation failure with `title`.
    pub fn fails_pre_activation(self, title: impl Into<String>) -> Self {
        let title = title.into();
        self.on_pre_activation(move |report| {
            report.report(title.clone(), "required tool is not installed", "Install the tool.");
        })
    }

    pub fn on_pre_activation<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut CheckReport) + Send + Sync + 'static,
    {
        self.on_check = Some(Arc::new(hook));
        self
    }

    pub fn on_activate<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ActivationContext<'_>) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.on_activate = Some(Arc::new(hook));
        self
    }

    /// Run `hook` after the declared content was registered.
    pub fn on_register<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Registrar<'_>) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.on_register = Some(Arc::new(hook));
        self
    }

    pub fn on_postprocess<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut PostprocessContext<'_>) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.on_postprocess = Some(Arc::new(hook));
        self
    }

    /// Panic with `message` during registration.
    pub fn panics_on_register(self, message: &'static str) -> Self {
        self.on_register(move |_| panic!("{message}"))
    }
}

impl Extension for TestExtension {
    fn id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn metadata(&self) -> &ExtensionMetadata {
        &self.metadata
    }

    fn dependencies(&self) -> Vec<Dependency> {
        self.dependencies.clone()
    }

    fn provides(&self) -> Vec<String> {
        self.provides.clone()
    }

    fn site_dependencies(&self) -> Vec<SiteDependency> {
        self.sites.clone()
    }

    fn is_core(&self) -> bool {
        self.core
    }

    fn pre_activation_check(&self, report: &mut CheckReport) {
        if let Some(hook) = &self.on_check {
            hook(report);
        }
    }

    fn activate(&mut self, context: &ActivationContext<'_>) -> Result<(), BoxError> {
        match &self.on_activate {
            Some(hook) => hook(context),
            None => Ok(()),
        }
    }

    fn register(&self, registrar: &mut Registrar<'_>) -> Result<(), BoxError> {
        let source = self.id.as_str();
        for id in &self.content.parameter_types {
            registrar.register_parameter_type(test_parameter_type(id, source))?;
        }
        for id in &self.content.data_types {
            registrar.register_data_type(test_data_type(id, source))?;
        }
        for (id, behavior) in &self.content.nodes {
            registrar.register_node(test_node_info(id, source, *behavior))?;
        }
        for (id, data_type) in &self.content.scheduled_nodes {
            registrar.schedule_node(test_node_info(id, source, NodeBehavior::Healthy).with_input("input", data_type.as_str()));
        }
        match &self.on_register {
            Some(hook) => hook(registrar),
            None => Ok(()),
        }
    }

    fn postprocess(&self, context: &mut PostprocessContext<'_>) -> Result<(), BoxError> {
        match &self.on_postprocess {
            Some(hook) => hook(context),
            None => Ok(()),
        }
    }
}
