//! The structured edit proposed by the model.

use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::codec::{self, CodecError, Record, Scalar, Value};

/// Inclusive, 1-based line range. Always `1 <= start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LineRange {
    start: usize,
    end: usize,
}

impl LineRange {
    /// Returns `None` unless `1 <= start <= end`.
    pub fn new(start: usize, end: usize) -> Option<Self> {
        (start >= 1 && start <= end).then_some(Self { start, end })
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn line_count(&self) -> usize {
        self.end - self.start + 1
    }

    /// Zero-based, half-open `[start, end)` slice bounds.
    pub fn to_slice(&self) -> (usize, usize) {
        (self.start - 1, self.end)
    }

    /// Parse `"a-b"`, `"(a,b)"` or `"a,b"`.
    fn parse(text: &str) -> Option<Self> {
        let inner = text.trim().trim_start_matches('(').trim_end_matches(')');
        let (start, end) = inner.split_once(|c: char| c == '-' || c == ',')?;
        Self::new(start.trim().parse().ok()?, end.trim().parse().ok()?)
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// One proposed edit: replace `old_text` at `line_range` of `file_path`
/// with `new_text`. Immutable once built; equality is structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PatchRecord {
    file_path: String,
    line_range: LineRange,
    old_text: String,
    new_text: String,
}

impl PatchRecord {
    pub fn new(
        file_path: impl Into<String>,
        line_range: LineRange,
        old_text: impl Into<String>,
        new_text: impl Into<String>,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            line_range,
            old_text: old_text.into(),
            new_text: new_text.into(),
        }
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn line_range(&self) -> LineRange {
        self.line_range
    }

    pub fn old_text(&self) -> &str {
        &self.old_text
    }

    pub fn new_text(&self) -> &str {
        &self.new_text
    }

    /// Same file and same declared line range.
    pub fn same_location(&self, other: &PatchRecord) -> bool {
        self.file_path == other.file_path && self.line_range == other.line_range
    }

    /// SHA-256 over the structural fields, hex encoded.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.file_path.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.line_range.start.to_le_bytes());
        hasher.update(self.line_range.end.to_le_bytes());
        hasher.update(self.old_text.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.new_text.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn to_value(&self) -> Value {
        Value::Record(
            Record::new()
                .with("file_path", self.file_path.as_str())
                .with(
                    "line_range",
                    Value::List(vec![
                        Value::from(self.line_range.start as i64),
                        Value::from(self.line_range.end as i64),
                    ]),
                )
                .with("old_text", self.old_text.as_str())
                .with("new_text", self.new_text.as_str()),
        )
    }

    /// Build from a decoded document: a record (optionally under a single
    /// `patch` key) or a one-row table. `old_code`/`new_code` are accepted
    /// for `old_text`/`new_text`.
    pub fn from_value(value: &Value) -> Result<Self, CodecError> {
        let record = match value {
            Value::Record(record) => match record.get("patch") {
                Some(inner) if record.len() == 1 => return Self::from_value(inner),
                _ => record,
            },
            Value::List(items) if items.len() == 1 => return Self::from_value(&items[0]),
            Value::List(items) => return Err(invalid(format!("expected exactly one patch, found {}", items.len()))),
            Value::Scalar(_) => return Err(invalid("expected a patch record, found a scalar")),
        };

        let file_path = text_field(record, &["file_path"])?;
        if file_path.trim().is_empty() {
            return Err(invalid("file_path is empty"));
        }
        let line_range = line_range_field(record)?;
        let old_text = text_field(record, &["old_text", "old_code"])?;
        let new_text = text_field(record, &["new_text", "new_code"])?;

        Ok(Self::new(file_path, line_range, old_text, new_text))
    }

    /// Decode a model response. A surrounding Markdown code fence is ignored.
    pub fn from_wire(text: &str) -> Result<Self, CodecError> {
        let value = codec::decode(strip_code_fence(text))?;
        Self::from_value(&value)
    }
}

impl fmt::Display for PatchRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file_path, self.line_range)
    }
}

fn invalid(reason: impl Into<String>) -> CodecError {
    CodecError::InvalidPatch(reason.into())
}

fn text_field(record: &Record, names: &[&str]) -> Result<String, CodecError> {
    let value = names
        .iter()
        .find_map(|name| record.get(name))
        .ok_or_else(|| invalid(format!("missing field {}", names[0])))?;
    match value {
        Value::Scalar(Scalar::String(s)) => Ok(s.clone()),
        Value::Scalar(Scalar::Null) => Ok(String::new()),
        Value::Scalar(Scalar::Integer(n)) => Ok(n.to_string()),
        Value::Scalar(Scalar::Float(n)) => Ok(n.to_string()),
        Value::Scalar(Scalar::Bool(b)) => Ok(b.to_string()),
        other => Err(invalid(format!("{} must be text, found {}", names[0], other.kind()))),
    }
}

fn line_range_field(record: &Record) -> Result<LineRange, CodecError> {
    let value = record
        .get("line_range")
        .ok_or_else(|| invalid("missing field line_range"))?;
    let range = match value {
        Value::List(items) => match items.as_slice() {
            [start, end] => match (start.as_integer(), end.as_integer()) {
                (Some(s), Some(e)) => usize::try_from(s)
                    .ok()
                    .zip(usize::try_from(e).ok())
                    .and_then(|(s, e)| LineRange::new(s, e)),
                _ => None,
            },
            _ => None,
        },
        Value::Scalar(Scalar::String(text)) => LineRange::parse(text),
        _ => None,
    };
    range.ok_or_else(|| invalid(format!("line_range must be two line numbers with 1 <= start <= end, found {}", value.kind())))
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end().strip_suffix("```").map(str::trim_end).unwrap_or(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: usize, end: usize) -> LineRange {
        LineRange::new(start, end).unwrap()
    }

    #[test]
    fn test_line_range_invariants() {
        assert!(LineRange::new(0, 1).is_none());
        assert!(LineRange::new(3, 2).is_none());
        let r = range(2, 4);
        assert_eq!(r.line_count(), 3);
        assert_eq!(r.to_slice(), (1, 4));
        assert_eq!(r.to_string(), "2-4");
    }

    #[test]
    fn test_line_range_parse_forms() {
        assert_eq!(LineRange::parse("2-3"), Some(range(2, 3)));
        assert_eq!(LineRange::parse("(5, 7)"), Some(range(5, 7)));
        assert_eq!(LineRange::parse("4,4"), Some(range(4, 4)));
        assert_eq!(LineRange::parse("7-5"), None);
        assert_eq!(LineRange::parse("abc"), None);
    }

    #[test]
    fn test_structural_equality() {
        let a = PatchRecord::new("calc.py", range(2, 2), "old", "new");
        let b = PatchRecord::new("calc.py", range(2, 2), "old", "new");
        let c = PatchRecord::new("calc.py", range(2, 2), "old", "newer");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.same_location(&c));
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn test_from_wire_record() {
        let text = "file_path: calc.py\nline_range:\n  - 2\n  - 2\nold_text: \"    return a - b\"\nnew_text: \"    return a + b\"";
        let patch = PatchRecord::from_wire(text).unwrap();
        assert_eq!(patch.file_path(), "calc.py");
        assert_eq!(patch.line_range(), range(2, 2));
        assert_eq!(patch.old_text(), "    return a - b");
        assert_eq!(patch.new_text(), "    return a + b");
    }

    #[test]
    fn test_from_wire_with_wrapper_fence_and_aliases() {
        let text = "```toon\npatch:\n  file_path: src/calc.py\n  line_range: \"(3,4)\"\n  old_code: \"a = 1\\nb = 2\"\n  new_code: \"a = 2\\nb = 3\"\n```";
        let patch = PatchRecord::from_wire(text).unwrap();
        assert_eq!(patch.file_path(), "src/calc.py");
        assert_eq!(patch.line_range(), range(3, 4));
        assert_eq!(patch.old_text(), "a = 1\nb = 2");
        assert_eq!(patch.new_text(), "a = 2\nb = 3");
    }

    #[test]
    fn test_from_wire_single_row_table() {
        let text = "[1] {file_path, line_range, old_text, new_text}\ncalc.py | 2-2 | x | y";
        let patch = PatchRecord::from_wire(text).unwrap();
        assert_eq!(patch.line_range(), range(2, 2));
        assert_eq!(patch.new_text(), "y");
    }

    #[test]
    fn test_from_value_rejects_bad_input() {
        assert!(matches!(
            PatchRecord::from_wire("file_path: a.py\nline_range: 5-2\nold_text: x\nnew_text: y"),
            Err(CodecError::InvalidPatch(_))
        ));
        assert!(matches!(
            PatchRecord::from_wire("file_path: a.py\nline_range: 1-2\nold_text: x"),
            Err(CodecError::InvalidPatch(msg)) if msg.contains("new_text")
        ));
        assert!(matches!(PatchRecord::from_wire("- a\n- b"), Err(CodecError::InvalidPatch(_))));
        assert!(matches!(PatchRecord::from_wire("[2] {a}\nx"), Err(CodecError::SizeMismatch { .. })));
    }

    #[test]
    fn test_value_round_trip() {
        let patch = PatchRecord::new("calc.py", range(1, 2), "def f(a, b):", "def f(a, b=0):");
        assert_eq!(PatchRecord::from_value(&patch.to_value()).unwrap(), patch);
        assert_eq!(PatchRecord::from_wire(&codec::encode(&patch.to_value())).unwrap(), patch);
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```\na: 1\n```"), "a: 1");
        assert_eq!(strip_code_fence("  a: 1  "), "a: 1");
        assert_eq!(strip_code_fence("```toon\na: 1\nb: 2\n\n```\n"), "a: 1\nb: 2");
    }
}
