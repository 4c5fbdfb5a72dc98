//! Shared test utilities for the Flow workspace.
//!
//! This crate provides fixtures reused across crate test suites. It is a
//! dev-dependency only and never published.
//!
//! # Modules
//!
//! - [`extension`]: [`TestExtension`] builder with configurable failures
//! - [`node`]: node, data and parameter types with controllable defects
//! - [`events`]: [`EventRecorder`] capturing everything published on a bus

pub mod events;
pub mod extension;
pub mod node;

pub use events::EventRecorder;
pub use extension::TestExtension;
pub use node::{NodeBehavior, TestData, TestNode, test_data_type, test_node_info, test_parameter_type};
