//! Boot pipeline for Flow
//!
//! This crate turns discovered extensions into a validated catalog:
//!
//! - **Engine**: the per-session boot pipeline with isolation of every
//!   extension callback
//! - **Validation**: removal of node, data and parameter types that fail
//!   their self-checks
//! - **Reporting**: a structured [`BootReport`] of everything that went wrong
//! - **Management**: scheduling activation changes for the next boot
//!
//! # Architecture
//!
//! ```text
//!                 CLI / host
//!                     |
//!                 flow-core
//!                     |
//!          +----------+----------+
//!          |                     |
//!    flow-extensions       flow-catalog
//! ```
//!
//! # Example
//!
//! ```
//! use flow_core::{BootOptions, Engine};
//! use flow_extensions::ActivationSettings;
//!
//! let mut engine = Engine::new(BootOptions::default(), ActivationSettings::new());
//! let report = engine.boot(Vec::new()).unwrap();
//! assert!(report.is_empty());
//! assert!(engine.catalog().unwrap().is_empty());
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod manager;
pub mod report;
pub mod sites;
pub mod state;
pub mod validate;

pub use config::BootOptions;
pub use engine::{Engine, unsatisfied};
pub use error::{Error, Result};
pub use manager::ExtensionManager;
pub use report::{BootReport, Issue, IssueKind, Severity};
pub use sites::{MissingSite, SiteProbe, StaticSiteList, find_missing_sites};
pub use state::{ExtensionState, RejectionReason};
pub use validate::{Defect, ValidationSummary, check_data_type, check_node_type, check_parameter_type, check_slots, validate_catalog};
