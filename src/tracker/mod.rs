//! Issue tracker collaborator: the records the audit consumes and the
//! contract a tracker backend must fulfil.

mod client;
pub mod mock;

pub use client::MantisClient;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A named category such as a priority or a status. Equality is by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    #[serde(default)]
    pub id: u64,
    pub name: String,
}

impl Category {
    pub fn new(id: u64, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
        }
    }
}

impl PartialEq for Category {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Category {}

/// A tracker user account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: u64,
    pub name: String,
}

impl Account {
    pub fn new(id: u64, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
        }
    }
}

/// An issue as fetched from the tracker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: u64,
    pub summary: String,
    pub priority: Category,
    pub status: Category,
    pub reporter: Option<Account>,
    /// Assigned user; `None` means unassigned
    pub handler: Option<Account>,
    pub submitted_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

/// A saved server-side query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub id: u64,
    pub name: String,
}

/// An authenticated connection scoped to one project
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub project_id: u64,
    pub project_name: String,
    pub username: String,
    /// Secret sent with every request
    pub credential: String,
}

// Keeps the credential out of logs
impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("project_id", &self.project_id)
            .field("project_name", &self.project_name)
            .field("username", &self.username)
            .finish()
    }
}

/// Errors raised by tracker backends
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TrackerError {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("network error: {0}")]
    Connectivity(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// The configured project does not exist on the tracker
    #[error("unknown project '{0}'")]
    UnknownProject(String),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Access to a remote issue tracker
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Authenticate and resolve the project
    async fn connect(
        &self,
        username: &str,
        password: &str,
        project: &str,
    ) -> Result<Session, TrackerError>;

    /// List the filters visible to the session
    async fn list_filters(&self, session: &Session) -> Result<Vec<Filter>, TrackerError>;

    /// Fetch the project's issues, restricted to `filter` when given
    async fn fetch_issues(
        &self,
        session: &Session,
        filter: Option<&Filter>,
    ) -> Result<Vec<Issue>, TrackerError>;

    /// Release the session. Best-effort.
    async fn disconnect(&self, session: Session);

    /// Base URL of the tracker, used in diagnostics and drill-down links
    fn server_url(&self) -> &str;
}
