//! Repair context handed to the model each iteration.
//!
//! [`IssueLog`] remembers what was tried per failure; [`ActiveContext`] is the
//! pruned view of it that only mentions failures still present.

mod active;
mod issue_log;

pub use active::ActiveContext;
pub use issue_log::{Attempt, IssueEntry, IssueLog};
