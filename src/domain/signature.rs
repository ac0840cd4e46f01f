//! Failure identities reported by the test/lint runner.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::codec::{Record, Value};

/// One failing `(file, symbol, error kind)` triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FailureSignature {
    pub source_path: String,
    pub symbol_name: String,
    pub error_kind: String,
}

impl FailureSignature {
    pub fn new(source_path: impl Into<String>, symbol_name: impl Into<String>, error_kind: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            symbol_name: symbol_name.into(),
            error_kind: error_kind.into(),
        }
    }

    /// Wire form, one row of a failures table.
    pub fn to_value(&self) -> Value {
        Value::Record(
            Record::new()
                .with("source_path", self.source_path.as_str())
                .with("symbol_name", self.symbol_name.as_str())
                .with("error_kind", self.error_kind.as_str()),
        )
    }
}

impl fmt::Display for FailureSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}::{}", self.source_path, self.symbol_name, self.error_kind)
    }
}

/// Frozen, order-independent set of failure signatures.
///
/// Two sets holding the same members compare and hash equal regardless of
/// the order they were collected in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SignatureSet(BTreeSet<FailureSignature>);

impl SignatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, signature: &FailureSignature) -> bool {
        self.0.contains(signature)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FailureSignature> {
        self.0.iter()
    }
}

impl FromIterator<FailureSignature> for SignatureSet {
    fn from_iter<I: IntoIterator<Item = FailureSignature>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<&'a FailureSignature> for SignatureSet {
    fn from_iter<I: IntoIterator<Item = &'a FailureSignature>>(iter: I) -> Self {
        Self(iter.into_iter().cloned().collect())
    }
}

impl From<&[FailureSignature]> for SignatureSet {
    fn from(signatures: &[FailureSignature]) -> Self {
        signatures.iter().collect()
    }
}

impl fmt::Display for SignatureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let members: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{{{}}}", members.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_signature_display() {
        let sig = FailureSignature::new("test.py", "foo", "ValueError");
        assert_eq!(sig.to_string(), "test.py::foo::ValueError");
    }

    #[test]
    fn test_signature_value_equality() {
        let a = FailureSignature::new("test.py", "foo", "ValueError");
        let b = FailureSignature::new("test.py", "foo", "ValueError");
        let c = FailureSignature::new("test.py", "foo", "TypeError");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_signature_set_is_order_independent() {
        let a = FailureSignature::new("a.py", "f", "ValueError");
        let b = FailureSignature::new("b.py", "g", "TypeError");
        let first: SignatureSet = vec![a.clone(), b.clone()].into_iter().collect();
        let second: SignatureSet = vec![b, a].into_iter().collect();
        assert_eq!(first, second);

        let mut seen = HashSet::new();
        seen.insert(first);
        assert!(seen.contains(&second));
    }

    #[test]
    fn test_signature_set_dedups_members() {
        let a = FailureSignature::new("a.py", "f", "ValueError");
        let set: SignatureSet = [a.clone(), a.clone()].iter().collect();
        assert_eq!(set.len(), 1);
        assert!(set.contains(&a));
    }

    #[test]
    fn test_signature_set_display() {
        let set = SignatureSet::from(&[FailureSignature::new("b.py", "g", "E"), FailureSignature::new("a.py", "f", "E")][..]);
        assert_eq!(set.to_string(), "{a.py::f::E, b.py::g::E}");
    }

    #[test]
    fn test_signature_to_value() {
        let value = FailureSignature::new("a.py", "f", "ValueError").to_value();
        let record = value.as_record().unwrap();
        assert_eq!(record.get("symbol_name").and_then(Value::as_str), Some("f"));
        assert_eq!(record.len(), 3);
    }
}
