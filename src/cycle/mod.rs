//! Cycle Detector
//!
//! Recognises a repair loop that has stopped converging: the model proposing
//! the same edit twice in a row, or the same set of failures coming back.

mod detector;
mod similarity;
mod window;

use std::fmt;

use crate::domain::{LineRange, SignatureSet};
use crate::error::{RepairError, Result};

pub use detector::{CycleDetector, CycleState};
pub use similarity::code_similarity;
pub use window::RollingWindow;

/// Verdict of [`CycleDetector::check_duplicate_patch`].
#[derive(Debug, Clone, PartialEq)]
pub enum DuplicateCheck {
    /// No previous patch to compare against.
    First,
    /// Previous patch targeted another file or line range.
    DifferentLocation,
    /// Same location, nearly identical replacement.
    Refinement { similarity: f64 },
    /// Same location, related but different replacement.
    DistinctApproach { similarity: f64 },
    /// Same location, mostly unrelated replacement.
    Divergent { similarity: f64 },
    /// Same location and same (trimmed) replacement as last time.
    ExactDuplicate { file_path: String, line_range: LineRange },
}

impl DuplicateCheck {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, DuplicateCheck::ExactDuplicate { .. })
    }

    /// Map an exact duplicate to [`RepairError::ExactDuplicatePatch`].
    pub fn into_result(self) -> Result<DuplicateCheck> {
        match self {
            DuplicateCheck::ExactDuplicate { file_path, line_range } => Err(RepairError::ExactDuplicatePatch {
                file_path,
                start: line_range.start(),
                end: line_range.end(),
            }),
            other => Ok(other),
        }
    }
}

impl fmt::Display for DuplicateCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicateCheck::First => write!(f, "first patch"),
            DuplicateCheck::DifferentLocation => write!(f, "different location"),
            DuplicateCheck::Refinement { similarity } => write!(f, "refinement ({:.2})", similarity),
            DuplicateCheck::DistinctApproach { similarity } => write!(f, "distinct approach ({:.2})", similarity),
            DuplicateCheck::Divergent { similarity } => write!(f, "divergent ({:.2})", similarity),
            DuplicateCheck::ExactDuplicate { file_path, line_range } => {
                write!(f, "exact duplicate at {}:{}", file_path, line_range)
            }
        }
    }
}

/// Verdict of [`CycleDetector::check_signature_cycle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureCheck {
    Progress,
    CycleDetected { signatures: SignatureSet },
}

impl SignatureCheck {
    pub fn is_cycle(&self) -> bool {
        matches!(self, SignatureCheck::CycleDetected { .. })
    }

    /// Map a detected cycle to [`RepairError::SignatureCycleDetected`].
    pub fn into_result(self) -> Result<SignatureCheck> {
        match self {
            SignatureCheck::CycleDetected { signatures } => Err(RepairError::SignatureCycleDetected {
                signatures: signatures.to_string(),
            }),
            other => Ok(other),
        }
    }
}
