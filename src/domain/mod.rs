//! Domain types for repairloop
//!
//! - FailureSignature / SignatureSet: identities of failing symbols
//! - LineRange / PatchRecord: the edit proposed by the model

pub mod patch;
pub mod signature;

pub use patch::{LineRange, PatchRecord};
pub use signature::{FailureSignature, SignatureSet};
