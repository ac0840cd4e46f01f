//! Token-level rules shared by the encoder and decoder: when a string must
//! be quoted, how quoting escapes, and how a bare token reads back.

use super::CodecError;
use super::value::Scalar;

/// Column delimiter for tabular rows.
pub const DELIMITER: char = '|';

/// Characters that force a string into quotes wherever they appear.
const RESERVED: &[char] = &['|', ':', ',', '\\', '"', '{', '}', '[', ']'];

/// True when `s` cannot be written bare and still read back as the same string.
pub fn needs_quoting(s: &str) -> bool {
    if s.is_empty() || s.starts_with('-') {
        return true;
    }
    if s.chars().any(|c| c.is_whitespace() || RESERVED.contains(&c)) {
        return true;
    }
    !matches!(parse_bare(s), Scalar::String(_))
}

/// Wrap `s` in quotes, escaping `\`, `|`, `"` and a lone carriage return.
/// Newlines (`\n` or `\r\n`) collapse to a single space, so multi-line text
/// does not survive encoding.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '|' => out.push_str("\\|"),
            '"' => out.push_str("\\\""),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\r' => out.push_str("\\r"),
            '\n' => out.push(' '),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Render a string token (value, key or field name), quoting only when needed.
pub fn render_str(s: &str) -> String {
    if needs_quoting(s) { quote(s) } else { s.to_string() }
}

pub fn render_scalar(scalar: &Scalar) -> String {
    match scalar {
        Scalar::Null => "null".to_string(),
        Scalar::Bool(b) => b.to_string(),
        Scalar::Integer(n) => n.to_string(),
        Scalar::Float(n) if n.is_finite() => format!("{:?}", n),
        Scalar::Float(_) => "null".to_string(),
        Scalar::String(s) => render_str(s),
    }
}

/// Read one scalar token. Quoted tokens are always strings.
pub fn parse_scalar(token: &str, line: usize) -> Result<Scalar, CodecError> {
    let token = token.trim();
    if token.starts_with('"') {
        return unquote(token, line).map(Scalar::String);
    }
    Ok(parse_bare(token))
}

/// Read a key or field name.
pub fn parse_key(token: &str, line: usize) -> Result<String, CodecError> {
    let token = token.trim();
    let key = if token.starts_with('"') {
        unquote(token, line)?
    } else {
        token.to_string()
    };
    if key.is_empty() {
        return Err(CodecError::MalformedLine {
            line,
            reason: "empty key".to_string(),
        });
    }
    Ok(key)
}

fn parse_bare(token: &str) -> Scalar {
    match token {
        "null" => return Scalar::Null,
        "true" => return Scalar::Bool(true),
        "false" => return Scalar::Bool(false),
        _ => {}
    }
    if let Ok(n) = token.parse::<i64>() {
        return Scalar::Integer(n);
    }
    match token.parse::<f64>() {
        Ok(n) if looks_numeric(token) => Scalar::Float(n),
        _ => Scalar::String(token.to_string()),
    }
}

/// Guards against `inf`, `NaN` and friends, which `f64::from_str` accepts.
fn looks_numeric(token: &str) -> bool {
    token.chars().any(|c| c.is_ascii_digit())
        && token
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
}

/// Strip the surrounding quotes from `token` and resolve escapes.
fn unquote(token: &str, line: usize) -> Result<String, CodecError> {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.char_indices().skip(1);
    while let Some((idx, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, 'n')) => out.push('\n'),
                Some((_, 't')) => out.push('\t'),
                Some((_, 'r')) => out.push('\r'),
                Some((_, e @ ('\\' | '|' | '"'))) => out.push(e),
                Some((_, other)) => {
                    out.push('\\');
                    out.push(other);
                }
                None => return Err(CodecError::UnterminatedQuote { line }),
            },
            '"' => {
                let rest = token[idx + 1..].trim();
                if !rest.is_empty() {
                    return Err(CodecError::MalformedLine {
                        line,
                        reason: format!("unexpected text after quoted string: {}", rest),
                    });
                }
                return Ok(out);
            }
            _ => out.push(c),
        }
    }
    Err(CodecError::UnterminatedQuote { line })
}

/// Split `s` on `delim`, ignoring delimiters inside quotes or after a backslash.
pub fn split_unquoted(s: &str, delim: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;
    for (idx, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => in_quotes = !in_quotes,
            _ if c == delim && !in_quotes => {
                parts.push(&s[start..idx]);
                start = idx + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

/// Byte offset of the first `:` outside quotes, i.e. the key/value separator.
pub fn find_separator(s: &str) -> Option<usize> {
    let mut in_quotes = false;
    let mut escaped = false;
    for (idx, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => in_quotes = !in_quotes,
            ':' if !in_quotes => return Some(idx),
            _ => {}
        }
    }
    None
}
