//! CLI Module Organization
//!
//! - args: argument structures and value enums
//! - commands: one function per subcommand
//! - config_layer: configuration layering and merging
//! - output: console formatting

pub mod args;
pub mod commands;
pub mod config_layer;
pub mod output;

pub use args::*;
pub use commands::*;
