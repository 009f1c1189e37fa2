//! One audit run: connect, fetch, evaluate, report.
//!
//! The session is always released once connected, whether or not the fetch
//! succeeds. No report is produced from a failed fetch.

use chrono::{DateTime, Utc};

use crate::config::{Configuration, ConnectionSettings};
use crate::error::AuditError;
use crate::report::{Report, ReportBuilder, Targets};
use crate::rules::Engine;
use crate::tracker::{Filter, Issue, IssueTracker, Session, TrackerError};

/// Result of a run that did not fail
#[derive(Debug)]
pub enum AuditOutcome {
    /// Mandatory settings were empty; nothing was analyzed
    Skipped { missing: Vec<&'static str> },
    Completed(Report),
}

fn tracker_error(url: &str, err: TrackerError) -> AuditError {
    match err {
        TrackerError::Authentication(message) => AuditError::Authentication {
            url: url.to_string(),
            message,
        },
        TrackerError::UnknownProject(project) => AuditError::Configuration(format!(
            "Unable to find project '{}' in Mantis at {}",
            project, url
        )),
        other => AuditError::Connectivity {
            url: url.to_string(),
            message: other.to_string(),
        },
    }
}

async fn find_filter<T>(tracker: &T, session: &Session, name: &str) -> Result<Filter, AuditError>
where
    T: IssueTracker + ?Sized,
{
    let filters = tracker
        .list_filters(session)
        .await
        .map_err(|e| tracker_error(tracker.server_url(), e))?;

    if let Some(filter) = filters.iter().find(|f| f.name == name) {
        return Ok(filter.clone());
    }

    tracing::debug!(
        "Unable to find filter '{}' in Mantis for projectId {}",
        name,
        session.project_id
    );
    for f in &filters {
        tracing::debug!("   - {} : {}", f.name, f.id);
    }
    Err(AuditError::Configuration(format!(
        "Unable to find filter '{}' in Mantis",
        name
    )))
}

async fn fetch<T>(
    tracker: &T,
    session: &Session,
    settings: &ConnectionSettings,
) -> Result<Vec<Issue>, AuditError>
where
    T: IssueTracker + ?Sized,
{
    let filter = match settings.filter_name() {
        Some(name) => Some(find_filter(tracker, session, name).await?),
        None => None,
    };

    tracker
        .fetch_issues(session, filter.as_ref())
        .await
        .map_err(|e| tracker_error(tracker.server_url(), e))
}

/// Run an audit against `tracker` with already resolved thresholds
pub async fn run<T>(
    tracker: &T,
    settings: &ConnectionSettings,
    config: Configuration,
    as_of: DateTime<Utc>,
) -> Result<AuditOutcome, AuditError>
where
    T: IssueTracker + ?Sized,
{
    let missing = settings.missing();
    if !missing.is_empty() {
        tracing::warn!(
            ?missing,
            "The server url, the project name, the username and the password must not be empty."
        );
        return Ok(AuditOutcome::Skipped { missing });
    }

    let session = tracker
        .connect(&settings.username, &settings.password, &settings.project)
        .await
        .map_err(|e| tracker_error(tracker.server_url(), e))?;
    let project_id = session.project_id;

    let fetched = fetch(tracker, &session, settings).await;
    tracker.disconnect(session).await;
    let issues = fetched?;

    tracing::info!(count = issues.len(), project = %settings.project, "fetched issues");

    let engine = Engine::new(config);
    let analysis = engine.run(&issues, as_of);

    let mut builder = ReportBuilder::new(Targets {
        server_url: tracker.server_url().to_string(),
        project: settings.project.clone(),
        filter: settings.filter_name().map(str::to_string),
    });
    builder
        .with_analysis_date(as_of)
        .with_project_id(project_id)
        .with_analysis(analysis);

    Ok(AuditOutcome::Completed(builder.build()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::mock::{FailOn, MockOperation, MockTracker};

    fn settings() -> ConnectionSettings {
        ConnectionSettings {
            server_url: "http://localhost:1234/mantis".to_string(),
            username: "jer".to_string(),
            password: "pwd".to_string(),
            project: "myproject".to_string(),
            filter: None,
        }
    }

    fn tracker() -> MockTracker {
        MockTracker::new("http://localhost:1234/mantis", "jer", "pwd", "myproject")
    }

    #[test]
    fn test_tracker_error_mapping() {
        let url = "http://x";
        assert!(matches!(
            tracker_error(url, TrackerError::Authentication("no".into())),
            AuditError::Authentication { .. }
        ));
        assert!(matches!(
            tracker_error(url, TrackerError::UnknownProject("p".into())),
            AuditError::Configuration(_)
        ));
        assert!(matches!(
            tracker_error(url, TrackerError::NotFound("Not Found".into())),
            AuditError::Connectivity { .. }
        ));
        assert!(matches!(
            tracker_error(url, TrackerError::Decode("bad json".into())),
            AuditError::Connectivity { .. }
        ));
    }

    #[tokio::test]
    async fn test_skipped_when_settings_missing() {
        let tracker = tracker();
        let mut settings = settings();
        settings.password = String::new();

        let outcome = run(&tracker, &settings, Configuration::defaults().unwrap(), Utc::now())
            .await
            .unwrap();

        match outcome {
            AuditOutcome::Skipped { missing } => assert_eq!(missing, vec!["password"]),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(tracker.operations().is_empty());
    }

    #[tokio::test]
    async fn test_bad_credentials_is_authentication_error() {
        let tracker = tracker();
        let mut settings = settings();
        settings.password = "wrong".to_string();

        let err = run(&tracker, &settings, Configuration::defaults().unwrap(), Utc::now())
            .await
            .unwrap_err();

        assert!(matches!(err, AuditError::Authentication { .. }));
        assert!(!tracker.operations().contains(&MockOperation::Disconnect));
    }

    #[tokio::test]
    async fn test_disconnects_after_failed_fetch() {
        let tracker = tracker().fail_on(FailOn::FetchIssues(TrackerError::Connectivity(
            "reset".to_string(),
        )));

        let err = run(&tracker, &settings(), Configuration::defaults().unwrap(), Utc::now())
            .await
            .unwrap_err();

        assert!(matches!(err, AuditError::Connectivity { .. }));
        assert_eq!(tracker.operations().last(), Some(&MockOperation::Disconnect));
    }

    #[tokio::test]
    async fn test_missing_endpoint_is_connectivity_error() {
        let tracker = tracker().fail_on(FailOn::FetchIssues(TrackerError::NotFound(
            "Not Found".to_string(),
        )));

        let err = run(&tracker, &settings(), Configuration::defaults().unwrap(), Utc::now())
            .await
            .unwrap_err();

        match err {
            AuditError::Connectivity { url, .. } => {
                assert_eq!(url, "http://localhost:1234/mantis")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_project_is_configuration_error() {
        let tracker = tracker();
        let mut settings = settings();
        settings.project = "other-project".to_string();

        let err = run(&tracker, &settings, Configuration::defaults().unwrap(), Utc::now())
            .await
            .unwrap_err();

        match err {
            AuditError::Configuration(msg) => assert!(msg.contains("other-project")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_connect_failure_is_connectivity_error() {
        let tracker = tracker().fail_on(FailOn::Connect(TrackerError::Connectivity(
            "connection refused".to_string(),
        )));

        let err = run(&tracker, &settings(), Configuration::defaults().unwrap(), Utc::now())
            .await
            .unwrap_err();

        match err {
            AuditError::Connectivity { url, message } => {
                assert_eq!(url, "http://localhost:1234/mantis");
                assert!(message.contains("connection refused"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!tracker.operations().contains(&MockOperation::Disconnect));
    }

    #[tokio::test]
    async fn test_disconnects_after_failed_filter_listing() {
        let tracker = tracker()
            .with_filter(1, "current-version", vec![])
            .fail_on(FailOn::ListFilters(TrackerError::Api {
                status: 500,
                message: "internal error".to_string(),
            }));
        let mut settings = settings();
        settings.filter = Some("current-version".to_string());

        let err = run(&tracker, &settings, Configuration::defaults().unwrap(), Utc::now())
            .await
            .unwrap_err();

        assert!(matches!(err, AuditError::Connectivity { .. }));
        let ops = tracker.operations();
        assert!(!ops
            .iter()
            .any(|op| matches!(op, MockOperation::FetchIssues { .. })));
        assert_eq!(ops.last(), Some(&MockOperation::Disconnect));
    }
}
