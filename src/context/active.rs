use std::collections::BTreeMap;

use super::IssueEntry;
use crate::codec::{Record, Value};
use crate::domain::FailureSignature;

/// What the model sees for one iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveContext {
    iteration: u32,
    current_failures: Vec<FailureSignature>,
    active_history: Vec<IssueEntry>,
    current_file: Option<String>,
    diagnostics: BTreeMap<FailureSignature, String>,
}

impl ActiveContext {
    pub fn new(iteration: u32, current_failures: Vec<FailureSignature>, active_history: Vec<IssueEntry>) -> Self {
        Self {
            iteration,
            current_failures,
            active_history,
            current_file: None,
            diagnostics: BTreeMap::new(),
        }
    }

    pub fn with_current_file(mut self, file: impl Into<String>) -> Self {
        self.current_file = Some(file.into());
        self
    }

    /// Attach runner output (traceback, lint message) for one failure.
    pub fn with_diagnostic(mut self, signature: FailureSignature, detail: impl Into<String>) -> Self {
        self.diagnostics.insert(signature, detail.into());
        self
    }

    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    pub fn current_failures(&self) -> &[FailureSignature] {
        &self.current_failures
    }

    pub fn active_history(&self) -> &[IssueEntry] {
        &self.active_history
    }

    pub fn current_file(&self) -> Option<&str> {
        self.current_file.as_deref()
    }

    pub fn diagnostic(&self, signature: &FailureSignature) -> Option<&str> {
        self.diagnostics.get(signature).map(String::as_str)
    }

    /// Wire form. Failures become a tabular block; history and diagnostics
    /// are omitted when empty.
    pub fn to_value(&self) -> Value {
        let mut record = Record::new().with("iteration", self.iteration);
        if let Some(file) = &self.current_file {
            record.insert("current_file", file.as_str());
        }
        record.insert(
            "failures",
            self.current_failures.iter().map(FailureSignature::to_value).collect::<Vec<_>>(),
        );
        if !self.active_history.is_empty() {
            record.insert(
                "history",
                self.active_history.iter().map(IssueEntry::to_value).collect::<Vec<_>>(),
            );
        }
        if !self.diagnostics.is_empty() {
            let diagnostics: Vec<Value> = self
                .diagnostics
                .iter()
                .map(|(sig, detail)| {
                    Value::Record(
                        Record::new()
                            .with("signature", sig.to_string())
                            .with("detail", detail.as_str()),
                    )
                })
                .collect();
            record.insert("diagnostics", diagnostics);
        }
        Value::Record(record)
    }
}
