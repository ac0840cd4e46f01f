//! repairloop - the core of an automated code-repair loop
//!
//! A test/lint run yields failure signatures; the model is shown a compact
//! wire-format context and answers with a patch in the same format. This
//! crate provides:
//! - `codec`: the line-oriented wire format (encode/decode)
//! - `domain`: failure signatures and patch records
//! - `patch`: safe application of a patch with backup and rollback
//! - `cycle`: duplicate-patch and recurring-failure detection
//! - `context`: per-session issue log and the pruned context sent to the model

pub mod codec;
pub mod config;
pub mod context;
pub mod cycle;
pub mod domain;
pub mod error;
pub mod patch;

pub use error::{RepairError, Result};
