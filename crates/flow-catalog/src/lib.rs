//! Flow catalog
//!
//! Storage for the node types, data types and parameter types contributed by
//! extensions, together with the event channels that announce catalog
//! changes and the task queue used for order-independent registration.
//!
//! # Example
//!
//! ```
//! use flow_catalog::{Catalog, DataTypeInfo, CatalogEntry};
//!
//! let mut catalog = Catalog::detached();
//! let mut text = DataTypeInfo::new("text", "Text").with_storage_documentation("text.txt");
//! text.set_source("org.flow:core");
//! catalog.register_data_type(text).unwrap();
//! assert!(catalog.data_types().contains("text"));
//! ```

pub mod catalog;
pub mod data;
pub mod entry;
pub mod error;
pub mod events;
pub mod guard;
pub mod node;
pub mod parameter;
pub mod registry;
pub mod task;

pub use catalog::Catalog;
pub use data::{Data, DataTypeInfo, Importer};
pub use entry::{CatalogEntry, ContentRef, EntryKind};
pub use error::{BoxError, Error, Result};
pub use events::{
    DatatypeRegistered, EventBus, EventChannel, ExtensionContentAdded, ExtensionContentRemoved,
    ExtensionDiscovered, ExtensionRef, ExtensionRegistered, NodeInfoRegistered, SessionId,
    SubscriptionId,
};
pub use guard::isolate;
pub use node::{GraphNode, NodeExample, NodeFactory, NodeInfo, ParameterSlot, SlotInfo};
pub use parameter::{DefaultValue, ParameterType, ParameterTypeInfo};
pub use registry::{DataTypeRegistry, NodeRegistry, ParameterTypeRegistry, TypeRegistry};
pub use task::{AbandonedTask, DeferredTask, DrainReport, NodeRegistrationTask, RegistrationTask, TaskQueue};
