//! Integration tests for IssueAudit
//!
//! Most tests drive a full run against the in-memory tracker. The live test
//! needs a Mantis server and credentials in the environment.
//! Run it with: `cargo test -- --ignored`

use anyhow::Result;
use chrono::{DateTime, Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;

use issueaudit::audit::{self, AuditOutcome};
use issueaudit::config::{resolve, Configuration, ConnectionSettings, RuleOverrides};
use issueaudit::error::AuditError;
use issueaudit::report::{Metric, Report, ReportStatus};
use issueaudit::tracker::mock::{MockOperation, MockTracker};
use issueaudit::tracker::{Account, Category, Issue, MantisClient};

const SERVER_URL: &str = "http://localhost:1234/mantis/";
const USER: &str = "jer";
const PASSWORD: &str = "pwd";
const PROJECT: &str = "myproject";
const FILTER: &str = "current-version";

const STATUSES: [&str; 8] = [
    "new",
    "feedback",
    "acknowledged",
    "confirmed",
    "assigned",
    "resolved",
    "validated",
    "closed",
];
const PRIORITIES: [&str; 5] = ["low", "normal", "high", "urgent", "immediate"];

fn as_of() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn settings(filter: Option<&str>) -> ConnectionSettings {
    ConnectionSettings {
        server_url: SERVER_URL.to_string(),
        username: USER.to_string(),
        password: PASSWORD.to_string(),
        project: PROJECT.to_string(),
        filter: filter.map(str::to_string),
    }
}

/// 1000 fresh issues cycling over priorities, statuses and handlers
fn synthetic_issues() -> Vec<Issue> {
    (0..1000u64)
        .map(|i| {
            let user = format!("user{}", i % 20 + 1);
            Issue {
                id: i + 1,
                summary: format!("issue {}", i + 1),
                priority: Category::new(i % 5, PRIORITIES[(i % 5) as usize]),
                status: Category::new(i % 8, STATUSES[(i % 8) as usize]),
                reporter: None,
                handler: Some(Account::new(i % 20, &user)),
                submitted_at: as_of(),
                last_updated_at: as_of(),
            }
        })
        .collect()
}

fn issue(id: u64, submitted_days: i64, updated_days: i64) -> Issue {
    Issue {
        id,
        summary: format!("issue {}", id),
        priority: Category::new(30, "normal"),
        status: Category::new(10, "new"),
        reporter: Some(Account::new(1, "alice")),
        handler: Some(Account::new(2, "bob")),
        submitted_at: as_of() - Duration::days(submitted_days),
        last_updated_at: as_of() - Duration::days(updated_days),
    }
}

async fn completed(tracker: &MockTracker, filter: Option<&str>, config: Configuration) -> Report {
    match audit::run(tracker, &settings(filter), config, as_of()).await {
        Ok(AuditOutcome::Completed(report)) => report,
        other => panic!("unexpected outcome: {other:?}"),
    }
}

fn data(report: &Report, metric: Metric) -> String {
    report
        .measure(metric)
        .and_then(|m| m.data.clone())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_thousand_issue_distributions() {
    let tracker = MockTracker::new(SERVER_URL, USER, PASSWORD, PROJECT).with_filter(
        1,
        FILTER,
        synthetic_issues(),
    );

    let report = completed(&tracker, Some(FILTER), Configuration::defaults().unwrap()).await;

    assert_eq!(report.summary.issues_count, 1000);
    assert_eq!(report.summary.status, ReportStatus::Healthy);
    assert!(report.violations.is_empty());

    for metric in [
        Metric::Issues,
        Metric::IssuesByPriority,
        Metric::IssuesByStatus,
        Metric::IssuesByDeveloper,
    ] {
        assert_eq!(report.measure(metric).unwrap().value, 1000);
    }

    assert_eq!(
        data(&report, Metric::IssuesByPriority),
        "high=200;immediate=200;low=200;normal=200;urgent=200"
    );
    assert_eq!(
        data(&report, Metric::IssuesByStatus),
        "acknowledged=125;assigned=125;closed=125;confirmed=125;feedback=125;new=125;resolved=125;validated=125"
    );
    assert_eq!(
        data(&report, Metric::IssuesByDeveloper),
        "user1=50;user10=50;user11=50;user12=50;user13=50;user14=50;user15=50;user16=50;user17=50;user18=50;user19=50;user2=50;user20=50;user3=50;user4=50;user5=50;user6=50;user7=50;user8=50;user9=50"
    );

    let url = report.measure(Metric::Issues).unwrap().url.clone().unwrap();
    assert_eq!(
        url,
        "http://localhost:1234/mantis/search.php?project_id=1&sticky_issues=on&sortby=property&dir=DESC&hide_status_id=-2"
    );
    assert_eq!(tracker.operations().last(), Some(&MockOperation::Disconnect));
}

#[tokio::test]
async fn test_each_rule_reported_once() {
    let mut unassigned = issue(2, 10, 0);
    unassigned.handler = None;
    let mut self_assigned = issue(4, 0, 0);
    self_assigned.handler = self_assigned.reporter.clone();
    let issues = vec![
        issue(1, 365, 365),
        unassigned,
        issue(3, 60, 60),
        self_assigned,
        issue(5, 1, 1),
    ];
    let tracker = MockTracker::new(SERVER_URL, USER, PASSWORD, PROJECT).with_issues(issues);

    let report = completed(&tracker, None, Configuration::defaults().unwrap()).await;

    let found: Vec<_> = report
        .violations
        .iter()
        .map(|v| (v.issue_id, v.rule_key.as_str()))
        .collect();
    assert_eq!(
        found,
        vec![
            (1, "mantis-old-ticket"),
            (2, "mantis-unassigned-ticket"),
            (3, "mantis-stalled-ticket"),
            (4, "mantis-self-assigned-ticket"),
        ]
    );
    assert_eq!(report.summary.status, ReportStatus::Warning);
    assert_eq!(report.violations[0].message, "[#1] issue 1: Old mantis ticket");
    assert_eq!(data(&report, Metric::IssuesByDeveloper), "alice=1;bob=3;unassigned=1");
}

#[tokio::test]
async fn test_profile_overrides_change_results() {
    let tracker = MockTracker::new(SERVER_URL, USER, PASSWORD, PROJECT)
        .with_issues(vec![issue(1, 30, 30), issue(2, 5, 5)]);

    let defaults = completed(&tracker, None, Configuration::defaults().unwrap()).await;
    assert!(defaults.violations.is_empty());

    let overrides = RuleOverrides::from_toml_str(
        r#"
        [rules.mantis-old-ticket]
        age = 30
        "#,
    )
    .unwrap();
    let report = completed(&tracker, None, resolve(&overrides).unwrap()).await;

    assert_eq!(report.violations.len(), 1);
    assert_eq!(report.violations[0].rule_key, "mantis-old-ticket");
}

#[tokio::test]
async fn test_unknown_filter_aborts() {
    let tracker = MockTracker::new(SERVER_URL, USER, PASSWORD, PROJECT).with_filter(
        1,
        FILTER,
        synthetic_issues(),
    );

    let result = audit::run(&tracker, &settings(Some("next-version")), Configuration::defaults().unwrap(), as_of()).await;

    match result {
        Err(AuditError::Configuration(msg)) => assert!(msg.contains("next-version")),
        other => panic!("unexpected outcome: {other:?}"),
    }
    let ops = tracker.operations();
    assert!(!ops.iter().any(|op| matches!(op, MockOperation::FetchIssues { .. })));
    assert_eq!(ops.last(), Some(&MockOperation::Disconnect));
}

#[tokio::test]
async fn test_unknown_project_is_configuration_error() {
    let tracker = MockTracker::new(SERVER_URL, USER, PASSWORD, "other-project");

    let err = audit::run(&tracker, &settings(None), Configuration::defaults().unwrap(), as_of())
        .await
        .unwrap_err();

    assert!(err.is_configuration());
}

#[tokio::test]
async fn test_permutation_gives_same_results() {
    let mut issues: Vec<_> = (1..=40u64)
        .map(|i| issue(i, (i as i64 * 7) % 250, (i as i64 * 3) % 90))
        .collect();
    let forward = MockTracker::new(SERVER_URL, USER, PASSWORD, PROJECT).with_issues(issues.clone());
    issues.reverse();
    let backward = MockTracker::new(SERVER_URL, USER, PASSWORD, PROJECT).with_issues(issues);

    let a = completed(&forward, None, Configuration::defaults().unwrap()).await;
    let b = completed(&backward, None, Configuration::defaults().unwrap()).await;

    assert_eq!(a.measures, b.measures);
    let mut va: Vec<_> = a.violations.iter().map(|v| (v.issue_id, v.rule_key.clone())).collect();
    let mut vb: Vec<_> = b.violations.iter().map(|v| (v.issue_id, v.rule_key.clone())).collect();
    va.sort();
    vb.sort();
    assert_eq!(va, vb);
}

#[tokio::test]
#[ignore = "requires Mantis"]
async fn test_live_mantis_audit() -> Result<()> {
    let settings = ConnectionSettings {
        server_url: std::env::var("MANTIS_SERVER_URL")?,
        username: std::env::var("MANTIS_USERNAME")?,
        password: std::env::var("MANTIS_PASSWORD")?,
        project: std::env::var("MANTIS_PROJECT")?,
        filter: std::env::var("MANTIS_FILTER").ok(),
    };
    let tracker = MantisClient::new(&settings.server_url);

    let outcome = audit::run(&tracker, &settings, Configuration::defaults()?, Utc::now()).await?;
    let AuditOutcome::Completed(report) = outcome else {
        panic!("run was skipped");
    };

    let total = report.summary.issues_count;
    for metric in [Metric::IssuesByPriority, Metric::IssuesByStatus, Metric::IssuesByDeveloper] {
        assert_eq!(report.measure(metric).map(|m| m.value), Some(total));
    }
    assert!(report.violations.len() as u64 <= total);

    Ok(())
}
