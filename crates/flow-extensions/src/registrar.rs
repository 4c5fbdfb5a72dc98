//! Handles given to extensions while they register and postprocess.

use std::fmt;

use flow_catalog::{
    BoxError, Catalog, CatalogEntry, DataTypeInfo, DeferredTask, NodeExample, NodeInfo,
    NodeRegistrationTask, ParameterTypeInfo, TaskQueue,
};

type PostprocessAction = Box<dyn FnOnce(&mut PostprocessContext<'_>) -> Result<(), BoxError>>;

/// Work an extension deferred until after validation.
pub struct PostprocessTask {
    pub owner: String,
    pub description: String,
    action: PostprocessAction,
}

impl PostprocessTask {
    pub fn run(self, context: &mut PostprocessContext<'_>) -> Result<(), BoxError> {
        (self.action)(context)
    }
}

impl fmt::Debug for PostprocessTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostprocessTask")
            .field("owner", &self.owner)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Registration surface for one extension.
///
/// Everything registered through a registrar is attributed to its
/// extension.
pub struct Registrar<'a> {
    extension_id: &'a str,
    catalog: &'a mut Catalog,
    tasks: &'a mut TaskQueue<Catalog>,
    postprocess: &'a mut Vec<PostprocessTask>,
}

impl<'a> Registrar<'a> {
    pub fn new(
        extension_id: &'a str,
        catalog: &'a mut Catalog,
        tasks: &'a mut TaskQueue<Catalog>,
        postprocess: &'a mut Vec<PostprocessTask>,
    ) -> Self {
        Self {
            extension_id,
            catalog,
            tasks,
            postprocess,
        }
    }

    pub fn extension_id(&self) -> &str {
        self.extension_id
    }

    /// Read access to everything registered so far.
    pub fn catalog(&self) -> &Catalog {
        self.catalog
    }

    pub fn register_parameter_type(&mut self, mut info: ParameterTypeInfo) -> flow_catalog::Result<()> {
        info.set_source(self.extension_id);
        self.catalog.register_parameter_type(info)
    }

    pub fn register_data_type(&mut self, mut info: DataTypeInfo) -> flow_catalog::Result<()> {
        info.set_source(self.extension_id);
        self.catalog.register_data_type(info)
    }

    /// Register a node type now. Fails if one of its data types is missing;
    /// use [`Registrar::schedule_node`] when they may come from another
    /// extension.
    pub fn register_node(&mut self, mut info: NodeInfo) -> flow_catalog::Result<()> {
        info.set_source(self.extension_id);
        self.catalog.register_node(info)
    }

    /// Register a node type once all of its data types are available.
    pub fn schedule_node(&mut self, mut info: NodeInfo) {
        info.set_source(self.extension_id);
        self.tasks.schedule(NodeRegistrationTask::new(info));
    }

    /// Schedule arbitrary registration work.
    pub fn schedule<F>(&mut self, description: impl Into<String>, action: F)
    where
        F: FnMut(&mut Catalog) -> Result<(), BoxError> + 'static,
    {
        self.tasks
            .schedule(DeferredTask::new(self.extension_id, description, action));
    }

    /// Schedule registration work that waits for `condition`.
    pub fn schedule_when<C, F>(&mut self, description: impl Into<String>, condition: C, action: F)
    where
        C: Fn(&Catalog) -> bool + 'static,
        F: FnMut(&mut Catalog) -> Result<(), BoxError> + 'static,
    {
        self.tasks
            .schedule(DeferredTask::new(self.extension_id, description, action).when(condition));
    }

    /// Run `action` during postprocessing, before the extension's own
    /// postprocess hook.
    pub fn defer_postprocess<F>(&mut self, description: impl Into<String>, action: F)
    where
        F: FnOnce(&mut PostprocessContext<'_>) -> Result<(), BoxError> + 'static,
    {
        self.postprocess.push(PostprocessTask {
            owner: self.extension_id.to_string(),
            description: description.into(),
            action: Box::new(action),
        });
    }
}

/// Surface available during postprocessing. Types can no longer be added;
/// node examples can.
pub struct PostprocessContext<'a> {
    extension_id: &'a str,
    catalog: &'a mut Catalog,
}

impl<'a> PostprocessContext<'a> {
    pub fn new(extension_id: &'a str, catalog: &'a mut Catalog) -> Self {
        Self {
            extension_id,
            catalog,
        }
    }

    pub fn extension_id(&self) -> &str {
        self.extension_id
    }

    pub fn catalog(&self) -> &Catalog {
        self.catalog
    }

    pub fn register_example(&mut self, example: NodeExample) -> flow_catalog::Result<()> {
        tracing::debug!(
            extension = %self.extension_id,
            "registering example '{}' for node type '{}'",
            example.name,
            example.node_type_id
        );
        self.catalog.register_example(example)
    }
}
