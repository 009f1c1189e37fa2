use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::collections::HashSet;

use super::{Account, Category, Filter, Issue, IssueTracker, Session, TrackerError};

/// Issues requested per page
const PAGE_SIZE: usize = 50;

/// Upper bound on pages fetched in one call
const MAX_PAGES: usize = 10_000;

/// Mantis REST API client
#[derive(Clone)]
pub struct MantisClient {
    client: Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct MantisUser {
    name: String,
}

#[derive(Debug, Deserialize)]
struct MantisRef {
    #[serde(default)]
    id: u64,
    name: String,
}

/// A user reference; the id is what identifies the account
#[derive(Debug, Deserialize)]
struct MantisAccount {
    id: u64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ProjectsPage {
    #[serde(default)]
    projects: Vec<MantisRef>,
}

#[derive(Debug, Deserialize)]
struct FiltersPage {
    #[serde(default)]
    filters: Vec<MantisRef>,
}

#[derive(Debug, Deserialize)]
struct IssuesPage {
    #[serde(default)]
    issues: Vec<MantisIssue>,
}

#[derive(Debug, Deserialize)]
struct MantisIssue {
    id: u64,
    #[serde(default)]
    summary: String,
    priority: MantisRef,
    status: MantisRef,
    reporter: Option<MantisAccount>,
    handler: Option<MantisAccount>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct MantisErrorBody {
    message: String,
}

impl From<MantisIssue> for Issue {
    fn from(raw: MantisIssue) -> Self {
        Issue {
            id: raw.id,
            summary: raw.summary,
            priority: Category {
                id: raw.priority.id,
                name: raw.priority.name,
            },
            status: Category {
                id: raw.status.id,
                name: raw.status.name,
            },
            reporter: raw.reporter.map(|r| Account {
                id: r.id,
                name: r.name,
            }),
            handler: raw.handler.map(|h| Account {
                id: h.id,
                name: h.name,
            }),
            submitted_at: raw.created_at,
            last_updated_at: raw.updated_at,
        }
    }
}

/// Append the unseen issues of a page. Returns true when another page should be requested.
fn absorb_page(
    issues: &mut Vec<Issue>,
    seen: &mut HashSet<u64>,
    page: Vec<MantisIssue>,
) -> bool {
    let received = page.len();
    let before = issues.len();
    issues.extend(
        page.into_iter()
            .map(Issue::from)
            .filter(|issue| seen.insert(issue.id)),
    );
    received == PAGE_SIZE && issues.len() > before
}

impl MantisClient {
    /// Create a client for the tracker at `server_url`
    pub fn new(server_url: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: server_url.trim_end_matches('/').to_string(),
        }
    }

    /// Build the URL of a REST resource
    pub fn api_url(&self, path: &str) -> String {
        format!("{}/api/rest/{}", self.endpoint, path.trim_start_matches('/'))
    }

    fn headers(credential: &str) -> Result<HeaderMap, TrackerError> {
        let mut headers = HeaderMap::new();
        let token = HeaderValue::from_str(credential)
            .map_err(|_| TrackerError::Authentication("credential is not a valid header value".into()))?;
        headers.insert(AUTHORIZATION, token);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    async fn get_json<T>(
        &self,
        credential: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, TrackerError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let url = self.api_url(path);
        tracing::debug!(%url, "GET");

        let response = self
            .client
            .get(&url)
            .headers(Self::headers(credential)?)
            .query(query)
            .send()
            .await
            .map_err(|e| TrackerError::Connectivity(e.to_string()))?;

        Self::handle_response(response).await
    }

    async fn handle_response<T>(response: Response) -> Result<T, TrackerError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let status = response.status();

        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| TrackerError::Decode(e.to_string()));
        }

        let message = match response.json::<MantisErrorBody>().await {
            Ok(body) => body.message,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string(),
        };

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                TrackerError::Authentication(message)
            }
            StatusCode::NOT_FOUND => TrackerError::NotFound(message),
            _ => TrackerError::Api {
                status: status.as_u16(),
                message,
            },
        })
    }
}

#[async_trait]
impl IssueTracker for MantisClient {
    async fn connect(
        &self,
        username: &str,
        password: &str,
        project: &str,
    ) -> Result<Session, TrackerError> {
        let me: MantisUser = self.get_json(password, "users/me", &[]).await?;
        if me.name != username {
            return Err(TrackerError::Authentication(format!(
                "token belongs to user '{}', not '{}'",
                me.name, username
            )));
        }

        let page: ProjectsPage = self.get_json(password, "projects", &[]).await?;
        let found = page
            .projects
            .into_iter()
            .find(|p| p.name == project)
            .ok_or_else(|| TrackerError::UnknownProject(project.to_string()))?;

        tracing::debug!(project_id = found.id, "connected to {}", self.endpoint);

        Ok(Session {
            project_id: found.id,
            project_name: found.name,
            username: username.to_string(),
            credential: password.to_string(),
        })
    }

    async fn list_filters(&self, session: &Session) -> Result<Vec<Filter>, TrackerError> {
        let page: FiltersPage = self
            .get_json(
                &session.credential,
                "filters",
                &[("project_id", session.project_id.to_string())],
            )
            .await?;

        Ok(page
            .filters
            .into_iter()
            .map(|f| Filter {
                id: f.id,
                name: f.name,
            })
            .collect())
    }

    async fn fetch_issues(
        &self,
        session: &Session,
        filter: Option<&Filter>,
    ) -> Result<Vec<Issue>, TrackerError> {
        let mut issues = Vec::new();
        let mut seen = HashSet::new();

        for page_number in 1..=MAX_PAGES {
            let mut query = vec![
                ("project_id", session.project_id.to_string()),
                ("page_size", PAGE_SIZE.to_string()),
                ("page", page_number.to_string()),
            ];
            if let Some(f) = filter {
                query.push(("filter_id", f.id.to_string()));
            }

            let page: IssuesPage = self.get_json(&session.credential, "issues", &query).await?;
            if !absorb_page(&mut issues, &mut seen, page.issues) {
                return Ok(issues);
            }
        }

        tracing::warn!(pages = MAX_PAGES, "stopped paging issues at the page limit");

        Ok(issues)
    }

    async fn disconnect(&self, session: Session) {
        // Token auth holds no server-side session
        tracing::debug!(project = %session.project_name, "disconnected from {}", self.endpoint);
    }

    fn server_url(&self) -> &str {
        &self.endpoint
    }
}
