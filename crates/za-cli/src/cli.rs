//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Zone activity inspector.
///
/// Loads a zone-graph JSON fixture into an in-memory registry and runs the
/// hierarchy cache and activity resolver against it.
#[derive(Debug, Parser)]
#[command(name = "za", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the zone-graph JSON file.
    #[arg(short, long, global = true)]
    pub zones: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the whole zone tree.
    Tree,

    /// Print a zone's ancestors, nearest first.
    Parents {
        /// The zone id.
        id: String,
    },

    /// Print a zone's descendants.
    Children {
        /// The zone id.
        id: String,

        /// Only immediate children.
        #[arg(long)]
        direct: bool,
    },

    /// Check a continuous-activity window.
    Window {
        /// The zone id.
        id: String,

        /// Window length in minutes.
        #[arg(long)]
        minutes: u32,

        /// Desired state: active or inactive.
        #[arg(long, default_value = "active")]
        state: String,
    },

    /// List autocomplete candidates for a query.
    Complete {
        /// Substring to match against zone names (empty lists everything).
        #[arg(default_value = "")]
        query: String,
    },
}
