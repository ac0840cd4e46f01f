//! Value tree -> wire text.

use super::DEFAULT_INDENT;
use super::lexical::{DELIMITER, render_scalar, render_str};
use super::value::{Record, Value};

/// Line-oriented encoder.
///
/// - records emit one `key: value` line per entry; nested records and lists
///   open a `key:` line followed by a deeper-indented block
/// - lists of records sharing one ordered key list become a tabular block:
///   `[N] {f1, f2}` and N `|`-joined rows
/// - any other list emits one `- ` line per element
#[derive(Debug, Clone)]
pub struct Encoder {
    indent: usize,
}

impl Encoder {
    pub fn new() -> Self {
        Self {
            indent: DEFAULT_INDENT,
        }
    }

    /// Create an encoder with a custom number of spaces per nesting level.
    pub fn with_indent(indent: usize) -> Self {
        Self { indent: indent.max(1) }
    }

    pub fn encode(&self, value: &Value) -> String {
        let mut lines = Vec::new();
        self.encode_block(value, 0, &mut lines);
        lines.join("\n")
    }

    fn pad(&self, depth: usize) -> String {
        " ".repeat(depth * self.indent)
    }

    fn encode_block(&self, value: &Value, depth: usize, out: &mut Vec<String>) {
        match value {
            Value::Scalar(scalar) => out.push(format!("{}{}", self.pad(depth), render_scalar(scalar))),
            Value::Record(record) => self.encode_record(record, depth, out),
            Value::List(items) => self.encode_list(items, depth, out),
        }
    }

    fn encode_record(&self, record: &Record, depth: usize, out: &mut Vec<String>) {
        let pad = self.pad(depth);
        if record.is_empty() {
            out.push(format!("{}{{}}", pad));
            return;
        }
        for (key, value) in record.iter() {
            match value {
                Value::Scalar(scalar) => out.push(format!("{}{}: {}", pad, render_str(key), render_scalar(scalar))),
                nested => {
                    out.push(format!("{}{}:", pad, render_str(key)));
                    self.encode_block(nested, depth + 1, out);
                }
            }
        }
    }

    fn encode_list(&self, items: &[Value], depth: usize, out: &mut Vec<String>) {
        let pad = self.pad(depth);
        if items.is_empty() {
            out.push(format!("{}[0]", pad));
            return;
        }

        if let Some(fields) = tabular_fields(items) {
            let header: Vec<String> = fields.iter().map(|f| render_str(f)).collect();
            out.push(format!("{}[{}] {{{}}}", pad, items.len(), header.join(", ")));
            let separator = format!(" {} ", DELIMITER);
            for item in items {
                let Value::Record(record) = item else { continue };
                let cells: Vec<String> = fields
                    .iter()
                    .map(|f| match record.get(f) {
                        Some(Value::Scalar(scalar)) => render_scalar(scalar),
                        _ => String::new(),
                    })
                    .collect();
                out.push(format!("{}{}", pad, cells.join(&separator)));
            }
            return;
        }

        for item in items {
            match item {
                Value::Scalar(scalar) => out.push(format!("{}- {}", pad, render_scalar(scalar))),
                nested => {
                    out.push(format!("{}-", pad));
                    self.encode_block(nested, depth + 1, out);
                }
            }
        }
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Header fields when `items` can be written as a tabular block: every
/// element is a record with the same non-empty ordered key list and only
/// scalar values.
fn tabular_fields(items: &[Value]) -> Option<Vec<&str>> {
    let Value::Record(first) = items.first()? else {
        return None;
    };
    if first.is_empty() {
        return None;
    }
    let fields: Vec<&str> = first.keys().collect();
    let uniform = items.iter().all(|item| match item {
        Value::Record(record) => {
            record.keys().eq(fields.iter().copied()) && record.iter().all(|(_, v)| v.is_scalar())
        }
        _ => false,
    });
    uniform.then_some(fields)
}
