use chrono::{DateTime, Utc};

use crate::tracker::Issue;

/// Whole days from `from` to `to`, truncated. Negative when `to` is earlier.
pub fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_days()
}

/// An issue together with its ages at the analysis date
#[derive(Debug, Clone, Copy)]
pub struct IssueContext<'a> {
    pub issue: &'a Issue,
    /// Days since the issue was submitted
    pub age_since_submission: i64,
    /// Days since the issue was last updated
    pub age_since_update: i64,
}

impl<'a> IssueContext<'a> {
    pub fn new(issue: &'a Issue, as_of: DateTime<Utc>) -> Self {
        Self {
            issue,
            age_since_submission: days_between(issue.submitted_at, as_of),
            age_since_update: days_between(issue.last_updated_at, as_of),
        }
    }

    /// True when the handler is the reporter
    pub fn is_self_assigned(&self) -> bool {
        match (&self.issue.reporter, &self.issue.handler) {
            (Some(reporter), Some(handler)) => reporter.id == handler.id,
            _ => false,
        }
    }
}
