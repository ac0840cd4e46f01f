//! Compact line-oriented wire format.
//!
//! Used both for the context sent to the model and for the patch it sends
//! back. Grammar:
//! - `key: value` scalar assignment; `key:` opens a deeper-indented block
//! - `[N] {f1, f2, ...}` tabular header followed by exactly N `|`-joined rows
//! - `- item` (or a bare `-` plus a block) for lists that are not tabular
//! - `null`, `true`/`false`, decimal numbers, and strings that are bare
//!   unless quoting is needed (`"..."` with `\|`, `\"` and `\\` escapes)
//!
//! For trees whose strings contain no newline, `decode(encode(v)) == v`.
//! Newlines inside strings are written as a single space.

mod decode;
mod encode;
mod lexical;
mod value;

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::error::Result;

pub use decode::Decoder;
pub use encode::Encoder;
pub use lexical::DELIMITER;
pub use value::{Record, Scalar, Value};

/// Spaces per nesting level.
pub const DEFAULT_INDENT: usize = 2;

/// Wire-format decoding errors. A document that fails to decode is unusable
/// as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("line {line}: tabular block declared {declared} rows but found {found}")]
    SizeMismatch { line: usize, declared: usize, found: usize },

    #[error("line {line}: {reason}")]
    MalformedLine { line: usize, reason: String },

    #[error("line {line}: unterminated quoted string")]
    UnterminatedQuote { line: usize },

    #[error("invalid patch: {0}")]
    InvalidPatch(String),
}

/// Encode with the default indentation.
pub fn encode(value: &Value) -> String {
    Encoder::new().encode(value)
}

pub fn decode(text: &str) -> std::result::Result<Value, CodecError> {
    Decoder::new().decode(text)
}

/// Read and decode a wire-format file.
pub fn read_file(path: impl AsRef<Path>) -> Result<Value> {
    let text = fs::read_to_string(path.as_ref())?;
    Ok(decode(&text)?)
}

/// Encode `value` and write it to `path`, creating parent directories.
pub fn write_file(path: impl AsRef<Path>, value: &Value) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut text = encode(value);
    text.push('\n');
    fs::write(path, text)?;
    log::debug!("wrote wire document to {}", path.display());
    Ok(())
}
