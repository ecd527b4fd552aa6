//! CLI subcommand implementations.

pub mod complete;
pub mod show;
pub mod tree;
pub mod window;
