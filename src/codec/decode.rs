//! Wire text -> value tree.
//!
//! Single forward pass over the non-blank lines. The block that starts at a
//! given indentation is classified by its first line (tabular header, list
//! item, `{}`, `key: value`, or bare scalar) and consumed until the
//! indentation drops back.

use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use super::CodecError;
use super::lexical::{DELIMITER, find_separator, parse_key, parse_scalar, split_unquoted};
use super::value::{Record, Value};

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[(\d+)\]\s*(?:\{(.*)\})?$").expect("tabular header regex"));

#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    number: usize,
    indent: usize,
    text: &'a str,
}

/// Line-oriented decoder. Any error aborts the whole document.
#[derive(Debug, Clone, Default)]
pub struct Decoder;

impl Decoder {
    pub fn new() -> Self {
        Self
    }

    pub fn decode(&self, input: &str) -> Result<Value, CodecError> {
        let lines: Vec<Line<'_>> = input
            .lines()
            .enumerate()
            .filter(|(_, raw)| !raw.trim().is_empty())
            .map(|(idx, raw)| {
                let text = raw.trim_end();
                let body = text.trim_start_matches(' ');
                Line {
                    number: idx + 1,
                    indent: text.len() - body.len(),
                    text: body.trim_start(),
                }
            })
            .collect();

        let Some(first) = lines.first() else {
            return Ok(Value::Record(Record::new()));
        };

        let mut cursor = Cursor { lines: &lines, pos: 0 };
        let value = cursor.block(first.indent)?;
        if let Some(line) = cursor.peek() {
            return Err(malformed(&line, "unexpected content after end of document"));
        }
        debug!("decoded {} lines into {}", lines.len(), value.kind());
        Ok(value)
    }
}

struct Cursor<'a> {
    lines: &'a [Line<'a>],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<Line<'a>> {
        self.lines.get(self.pos).copied()
    }

    /// Next line, if it is indented deeper than `indent`.
    fn peek_child(&self, indent: usize) -> Option<Line<'a>> {
        self.peek().filter(|line| line.indent > indent)
    }

    fn block(&mut self, indent: usize) -> Result<Value, CodecError> {
        let Some(line) = self.peek() else {
            return Ok(Value::null());
        };

        if let Some(caps) = HEADER_RE.captures(line.text) {
            let declared: usize = caps[1]
                .parse()
                .map_err(|_| malformed(&line, "tabular row count out of range"))?;
            let fields = caps.get(2).map(|m| m.as_str());
            return self.table(indent, line, declared, fields);
        }
        if is_list_item(line.text) {
            return self.list(indent);
        }
        if line.text == "{}" {
            self.pos += 1;
            return Ok(Value::Record(Record::new()));
        }
        if find_separator(line.text).is_some() {
            return self.record(indent);
        }

        self.pos += 1;
        let scalar = parse_scalar(line.text, line.number)?;
        if let Some(next) = self.peek().filter(|next| next.indent >= indent) {
            return Err(malformed(&next, "unexpected content after scalar"));
        }
        Ok(Value::Scalar(scalar))
    }

    fn record(&mut self, indent: usize) -> Result<Value, CodecError> {
        let mut record = Record::new();
        while let Some(line) = self.peek() {
            if line.indent < indent {
                break;
            }
            if line.indent > indent {
                return Err(malformed(&line, "unexpected indentation"));
            }
            let sep = find_separator(line.text).ok_or_else(|| malformed(&line, "expected `key: value`"))?;
            let key = parse_key(&line.text[..sep], line.number)?;
            let rest = line.text[sep + 1..].trim();
            self.pos += 1;

            let value = if !rest.is_empty() {
                Value::Scalar(parse_scalar(rest, line.number)?)
            } else {
                match self.peek_child(indent) {
                    Some(child) => self.block(child.indent)?,
                    None => Value::null(),
                }
            };
            record.insert(key, value);
        }
        Ok(Value::Record(record))
    }

    fn list(&mut self, indent: usize) -> Result<Value, CodecError> {
        let mut items = Vec::new();
        while let Some(line) = self.peek() {
            if line.indent < indent {
                break;
            }
            if line.indent > indent || !is_list_item(line.text) {
                return Err(malformed(&line, "expected `- item`"));
            }
            self.pos += 1;

            let rest = line.text[1..].trim();
            let item = if !rest.is_empty() {
                Value::Scalar(parse_scalar(rest, line.number)?)
            } else {
                match self.peek_child(indent) {
                    Some(child) => self.block(child.indent)?,
                    None => Value::null(),
                }
            };
            items.push(item);
        }
        Ok(Value::List(items))
    }

    fn table(
        &mut self,
        indent: usize,
        header: Line<'_>,
        declared: usize,
        fields: Option<&str>,
    ) -> Result<Value, CodecError> {
        let fields = match fields.map(str::trim) {
            Some(list) if !list.is_empty() => split_unquoted(list, ',')
                .into_iter()
                .map(|f| parse_key(f, header.number))
                .collect::<Result<Vec<_>, _>>()?,
            _ if declared == 0 => Vec::new(),
            _ => return Err(malformed(&header, "tabular header is missing its field list")),
        };
        self.pos += 1;

        // The declared count comes from untrusted text; check it against the
        // rows actually present before allocating for them.
        let available = self.lines[self.pos..]
            .iter()
            .take_while(|line| line.indent >= indent)
            .count();
        if available < declared {
            return Err(CodecError::SizeMismatch {
                line: header.number,
                declared,
                found: available,
            });
        }

        let mut rows = Vec::with_capacity(declared);
        for _ in 0..declared {
            let line = self.lines[self.pos];
            self.pos += 1;

            let cells = split_unquoted(line.text, DELIMITER);
            if cells.len() != fields.len() {
                return Err(malformed(
                    &line,
                    &format!("row has {} cells but header declares {} fields", cells.len(), fields.len()),
                ));
            }
            let mut record = Record::new();
            for (field, cell) in fields.iter().zip(cells) {
                let cell = cell.trim();
                if !cell.is_empty() {
                    record.insert(field.clone(), Value::Scalar(parse_scalar(cell, line.number)?));
                }
            }
            rows.push(Value::Record(record));
        }

        let extra = self.lines[self.pos..]
            .iter()
            .take_while(|line| line.indent >= indent)
            .count();
        if extra > 0 {
            return Err(CodecError::SizeMismatch {
                line: header.number,
                declared,
                found: declared + extra,
            });
        }
        Ok(Value::List(rows))
    }
}

fn is_list_item(text: &str) -> bool {
    text == "-" || text.starts_with("- ")
}

fn malformed(line: &Line<'_>, reason: &str) -> CodecError {
    CodecError::MalformedLine {
        line: line.number,
        reason: reason.to_string(),
    }
}
