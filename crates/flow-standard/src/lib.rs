//! Built-in extensions for Flow
//!
//! - [`CoreExtension`] (`org.flow:core`): standard parameter types and the
//!   `text` data type
//! - [`UtilitiesExtension`] (`org.flow:utils`): text processing nodes
//!
//! [`builtin_extensions`] is the single list the host boots with.

pub mod base;
pub mod text;
pub mod utils;

use flow_extensions::Discovered;

pub use crate::base::{CORE_ID, CoreExtension};
pub use crate::text::{TEXT_DATA_TYPE, TextData, TextNode};
pub use crate::utils::{UTILS_ID, UtilitiesExtension};

/// Number of built-in extensions.
pub const BUILTIN_COUNT: usize = 2;

/// Every built-in extension, ready to boot. The core extension has the
/// highest priority.
pub fn builtin_extensions() -> Vec<Discovered> {
    vec![
        Discovered::new(CoreExtension::new(), 100),
        Discovered::new(UtilitiesExtension::new(), 0),
    ]
}
