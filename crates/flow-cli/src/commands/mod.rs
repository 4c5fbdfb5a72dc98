//! Command implementations for flow-cli

pub mod activate;
pub mod boot;
pub mod check_id;
pub mod list;

pub use activate::{run_activate, run_deactivate};
pub use boot::run_boot;
pub use check_id::run_check_id;
pub use list::run_list;
