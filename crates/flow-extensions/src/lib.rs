//! Extension system for Flow.
//!
//! This crate defines what an extension is ([`Extension`]), how it is
//! identified ([`id`]), how dependencies between extensions are described
//! and resolved ([`dependency`], [`closure`]), and the [`Registrar`] through
//! which an extension contributes to the catalog.

pub mod closure;
pub mod dependency;
pub mod error;
pub mod extension;
pub mod id;
pub mod metadata;
pub mod registrar;
pub mod settings;
pub mod version;

pub use closure::{Candidate, implied_loaded};
pub use dependency::{Dependency, DependencyGraph, SiteDependency};
pub use error::{Error, Result};
pub use extension::{
    ActivationContext, CheckFailure, CheckReport, Declaration, Discovered, Extension,
    sort_by_priority,
};
pub use id::{ExtensionId, is_valid_id};
pub use metadata::ExtensionMetadata;
pub use registrar::{PostprocessContext, PostprocessTask, Registrar};
pub use settings::ActivationSettings;
