//! CLI module for repairloop - command-line interface and subcommands.
//!
//! Exposes the wire codec and the patch applier from the shell.

pub mod commands;

pub use commands::Cli;
