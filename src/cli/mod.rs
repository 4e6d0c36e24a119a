//! CLI module: argument parsing plus dispatch to the `Store` library
//! API. Mirrors the teacher's `src/cli/mod.rs` + one-file-per-command
//! layout, trimmed to the operations SPEC_FULL.md actually names.

pub mod args;
pub mod commands;

pub use args::{Cli, Commands};
