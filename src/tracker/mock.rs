//! In-memory tracker for deterministic tests.
//!
//! Stores issues and filters in memory, accepts a single user/password pair,
//! records every call, and can be told to fail a given operation.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use super::{Filter, Issue, IssueTracker, Session, TrackerError};

/// Mock tracker. Clones share state.
#[derive(Debug, Clone)]
pub struct MockTracker {
    inner: Arc<Mutex<MockTrackerInner>>,
    server_url: String,
}

#[derive(Debug, Default)]
struct MockTrackerInner {
    username: String,
    password: String,
    project_id: u64,
    project_name: String,
    filters: Vec<Filter>,
    issues: Vec<Issue>,
    /// Issues returned per filter id; falls back to `issues`
    filtered: Vec<(u64, Vec<Issue>)>,
    fail_on: Option<FailOn>,
    operations: Vec<MockOperation>,
}

/// Operation that should fail, with the error to return
#[derive(Debug, Clone)]
pub enum FailOn {
    Connect(TrackerError),
    ListFilters(TrackerError),
    FetchIssues(TrackerError),
}

/// Recorded call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    Connect { username: String, project: String },
    ListFilters,
    FetchIssues { filter: Option<String> },
    Disconnect,
}

impl MockTracker {
    /// Tracker accepting `username`/`password` for the project `project`
    pub fn new(server_url: &str, username: &str, password: &str, project: &str) -> Self {
        let inner = MockTrackerInner {
            username: username.to_string(),
            password: password.to_string(),
            project_id: 1,
            project_name: project.to_string(),
            ..Default::default()
        };
        Self {
            inner: Arc::new(Mutex::new(inner)),
            server_url: server_url.trim_end_matches('/').to_string(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockTrackerInner> {
        // A poisoned lock only means another test thread panicked
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Replace the unfiltered issue list
    pub fn with_issues(self, issues: Vec<Issue>) -> Self {
        self.lock().issues = issues;
        self
    }

    /// Add a saved filter returning `issues`
    pub fn with_filter(self, id: u64, name: &str, issues: Vec<Issue>) -> Self {
        {
            let mut inner = self.lock();
            inner.filters.push(Filter {
                id,
                name: name.to_string(),
            });
            inner.filtered.push((id, issues));
        }
        self
    }

    /// Make the given operation fail
    pub fn fail_on(self, fail: FailOn) -> Self {
        self.lock().fail_on = Some(fail);
        self
    }

    /// Calls made so far
    pub fn operations(&self) -> Vec<MockOperation> {
        self.lock().operations.clone()
    }
}

#[async_trait]
impl IssueTracker for MockTracker {
    async fn connect(
        &self,
        username: &str,
        password: &str,
        project: &str,
    ) -> Result<Session, TrackerError> {
        let mut inner = self.lock();
        inner.operations.push(MockOperation::Connect {
            username: username.to_string(),
            project: project.to_string(),
        });

        if let Some(FailOn::Connect(err)) = &inner.fail_on {
            return Err(err.clone());
        }
        if username != inner.username || password != inner.password {
            return Err(TrackerError::Authentication(
                "invalid username or password".to_string(),
            ));
        }
        if project != inner.project_name {
            return Err(TrackerError::UnknownProject(project.to_string()));
        }

        Ok(Session {
            project_id: inner.project_id,
            project_name: inner.project_name.clone(),
            username: username.to_string(),
            credential: password.to_string(),
        })
    }

    async fn list_filters(&self, _session: &Session) -> Result<Vec<Filter>, TrackerError> {
        let mut inner = self.lock();
        inner.operations.push(MockOperation::ListFilters);

        if let Some(FailOn::ListFilters(err)) = &inner.fail_on {
            return Err(err.clone());
        }
        Ok(inner.filters.clone())
    }

    async fn fetch_issues(
        &self,
        _session: &Session,
        filter: Option<&Filter>,
    ) -> Result<Vec<Issue>, TrackerError> {
        let mut inner = self.lock();
        inner.operations.push(MockOperation::FetchIssues {
            filter: filter.map(|f| f.name.clone()),
        });

        if let Some(FailOn::FetchIssues(err)) = &inner.fail_on {
            return Err(err.clone());
        }

        let issues = match filter {
            Some(f) => inner
                .filtered
                .iter()
                .find(|(id, _)| *id == f.id)
                .map(|(_, issues)| issues.clone())
                .unwrap_or_default(),
            None => inner.issues.clone(),
        };
        Ok(issues)
    }

    async fn disconnect(&self, _session: Session) {
        self.lock().operations.push(MockOperation::Disconnect);
    }

    fn server_url(&self) -> &str {
        &self.server_url
    }
}
