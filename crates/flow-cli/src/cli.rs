//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Flow - Boot and manage the extension catalog
#[derive(Parser, Debug)]
#[command(name = "flow")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Boot the built-in extensions and print the report
    ///
    /// Examples:
    ///   flow boot
    ///   flow boot --options boot.toml --json
    Boot {
        /// Boot options file (TOML)
        #[arg(long, env = "FLOW_OPTIONS")]
        options: Option<PathBuf>,

        /// Activation settings file (TOML)
        #[arg(long, env = "FLOW_SETTINGS")]
        settings: Option<PathBuf>,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Check whether extension ids are well-formed
    ///
    /// Exits with an error if any id is invalid.
    CheckId {
        /// Ids in <group>:<artifact> form
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// List known extensions and their state
    List {
        /// Activation settings file (TOML)
        #[arg(long, env = "FLOW_SETTINGS")]
        settings: Option<PathBuf>,
    },

    /// Activate an extension and its dependencies on the next boot
    Activate {
        /// Extension id
        id: String,

        /// Activation settings file (TOML)
        #[arg(long, env = "FLOW_SETTINGS")]
        settings: Option<PathBuf>,
    },

    /// Deactivate an extension and its dependents on the next boot
    Deactivate {
        /// Extension id
        id: String,

        /// Activation settings file (TOML)
        #[arg(long, env = "FLOW_SETTINGS")]
        settings: Option<PathBuf>,
    },
}
