//! Error types for repairloop
//!
//! Each component owns its error enum (`CodecError`, `PatchError`); this
//! module aggregates them together with the cycle-detector stop signals.

use thiserror::Error;

use crate::codec::CodecError;
use crate::patch::PatchError;

/// All error types that can surface at the orchestrator boundary
#[derive(Debug, Error)]
pub enum RepairError {
    /// Wire-format document could not be decoded
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Patch could not be applied (the file was rolled back where possible)
    #[error("Patch error: {0}")]
    Patch(#[from] PatchError),

    /// The model proposed the same edit as last time
    #[error("Exact duplicate patch for {file_path}:{start}-{end}")]
    ExactDuplicatePatch { file_path: String, start: usize, end: usize },

    /// The same set of failures came back around
    #[error("Signature cycle detected: {signatures}")]
    SignatureCycleDetected { signatures: String },

    /// Invalid configuration value
    #[error("Config error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RepairError {
    /// True for the cycle-detector signals that should end the session
    /// rather than trigger another attempt.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RepairError::ExactDuplicatePatch { .. } | RepairError::SignatureCycleDetected { .. }
        )
    }
}

/// Result type alias for repairloop operations
pub type Result<T> = std::result::Result<T, RepairError>;
