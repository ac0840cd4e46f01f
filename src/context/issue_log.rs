use chrono::{DateTime, Utc};
use serde::Serialize;

use super::ActiveContext;
use crate::codec::{Record, Value};
use crate::domain::FailureSignature;

/// One repair attempt against a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attempt {
    pub iteration: u32,
    pub action: String,
    pub result: String,
}

/// Everything tried against one failure signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueEntry {
    pub signature: FailureSignature,
    pub attempts: Vec<Attempt>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl IssueEntry {
    pub fn is_resolved(&self) -> bool {
        self.resolved_at.is_some()
    }

    pub fn to_value(&self) -> Value {
        let attempts: Vec<Value> = self
            .attempts
            .iter()
            .map(|a| {
                Value::Record(
                    Record::new()
                        .with("iteration", a.iteration)
                        .with("action", a.action.as_str())
                        .with("result", a.result.as_str()),
                )
            })
            .collect();
        Value::Record(
            Record::new()
                .with("signature", self.signature.to_string())
                .with("resolved", self.is_resolved())
                .with("attempts", attempts),
        )
    }
}

/// Per-session record of repair attempts, keyed by failure signature.
#[derive(Debug, Clone, Default)]
pub struct IssueLog {
    entries: Vec<IssueEntry>,
    last_pruned: Vec<FailureSignature>,
}

impl IssueLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an attempt, merging into the existing entry for `signature`.
    pub fn log_attempt(&mut self, signature: &FailureSignature, iteration: u32, action: &str, result: &str) {
        let attempt = Attempt {
            iteration,
            action: action.to_string(),
            result: result.to_string(),
        };
        match self.entries.iter_mut().find(|e| &e.signature == signature) {
            Some(entry) => entry.attempts.push(attempt),
            None => self.entries.push(IssueEntry {
                signature: signature.clone(),
                attempts: vec![attempt],
                resolved_at: None,
            }),
        }
    }

    pub fn mark_resolved(&mut self, signature: &FailureSignature) {
        let now = Utc::now();
        for entry in self.entries.iter_mut().filter(|e| &e.signature == signature) {
            entry.resolved_at = Some(now);
        }
    }

    /// Unknown signatures count as active.
    pub fn is_active(&self, signature: &FailureSignature) -> bool {
        self.entries
            .iter()
            .find(|e| &e.signature == signature)
            .is_none_or(|e| !e.is_resolved())
    }

    pub fn entries(&self) -> &[IssueEntry] {
        &self.entries
    }

    /// Signatures dropped by the last [`IssueLog::active_context`] call.
    pub fn last_pruned(&self) -> &[FailureSignature] {
        &self.last_pruned
    }

    pub fn reset(&mut self) {
        self.entries.clear();
        self.last_pruned.clear();
    }

    /// Context for this iteration: history only for failures still present.
    pub fn active_context(&mut self, current_failures: &[FailureSignature], iteration: u32) -> ActiveContext {
        let (active, pruned): (Vec<&IssueEntry>, Vec<&IssueEntry>) = self
            .entries
            .iter()
            .partition(|e| current_failures.contains(&e.signature));

        for entry in &pruned {
            log::debug!("Pruning resolved issue: {}", entry.signature);
        }
        let active_history = active.into_iter().cloned().collect();
        self.last_pruned = pruned.into_iter().map(|e| e.signature.clone()).collect();

        ActiveContext::new(iteration, current_failures.to_vec(), active_history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(symbol: &str) -> FailureSignature {
        FailureSignature::new("test.py", symbol, "AssertionError")
    }

    #[test]
    fn test_log_attempt_merges_per_signature() {
        let mut log = IssueLog::new();
        log.log_attempt(&sig("a"), 1, "patch", "failed");
        log.log_attempt(&sig("a"), 2, "patch", "failed");
        log.log_attempt(&sig("b"), 2, "patch", "passed");

        assert_eq!(log.entries().len(), 2);
        assert_eq!(log.entries()[0].attempts.len(), 2);
        assert_eq!(log.entries()[0].attempts[1].iteration, 2);
    }

    #[test]
    fn test_mark_resolved() {
        let mut log = IssueLog::new();
        log.log_attempt(&sig("a"), 1, "patch", "passed");
        assert!(log.is_active(&sig("a")));

        log.mark_resolved(&sig("a"));

        assert!(!log.is_active(&sig("a")));
        assert!(log.entries()[0].resolved_at.is_some());
        assert!(log.is_active(&sig("never_seen")));
    }

    #[test]
    fn test_active_context_prunes_fixed_failures() {
        let mut log = IssueLog::new();
        log.log_attempt(&sig("a"), 1, "patch", "failed");
        log.log_attempt(&sig("b"), 1, "patch", "failed");

        let context = log.active_context(&[sig("b")], 2);

        assert_eq!(context.iteration(), 2);
        assert_eq!(context.active_history().len(), 1);
        assert_eq!(context.active_history()[0].signature, sig("b"));
        assert_eq!(log.last_pruned(), &[sig("a")]);
    }

    #[test]
    fn test_reset() {
        let mut log = IssueLog::new();
        log.log_attempt(&sig("a"), 1, "patch", "failed");
        log.active_context(&[], 2);
        log.reset();
        assert!(log.entries().is_empty());
        assert!(log.last_pruned().is_empty());
    }

    #[test]
    fn test_entry_to_value() {
        let mut log = IssueLog::new();
        log.log_attempt(&sig("a"), 1, "patch line 2", "still failing");
        let value = log.entries()[0].to_value();
        let record = value.as_record().unwrap();
        assert_eq!(record.get("signature").and_then(Value::as_str), Some("test.py::a::AssertionError"));
        assert_eq!(record.get("attempts").and_then(Value::as_list).map(|l| l.len()), Some(1));
    }
}
