//! Patch Applier
//!
//! Applies a [`PatchRecord`](crate::domain::PatchRecord) to the file it names:
//! resolve, back up, relocate stale line numbers, write atomically, verify,
//! and restore the backup on any failure.

mod applier;
mod backup;
mod resolve;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use applier::{ApplyReport, PatchApplier, atomic_write, verify};
pub use backup::{BACKUP_DIR_NAME, create_backup, restore_backup};
pub use resolve::{PathResolver, paths_equal};

/// What to do when `old_text` cannot be found anywhere in the file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    /// Replace the declared slice anyway.
    #[default]
    Permissive,
    /// Refuse with [`PatchError::NoMatchFound`].
    Strict,
}

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("Invalid line range {start}-{end} for file with {line_count} lines")]
    InvalidRange { start: usize, end: usize, line_count: usize },

    #[error("Old text not found in {}", path.display())]
    NoMatchFound { path: PathBuf },

    #[error("Verification failed: new text not present in {}", path.display())]
    VerificationFailed { path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
