use serde::{Deserialize, Serialize};

/// Main audit report structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub report_version: String,
    pub report_id: String,
    pub generated_at: String,
    /// Reference date the issue ages were computed against
    pub analysis_date: String,
    pub targets: Targets,
    pub summary: Summary,
    pub measures: Vec<Measure>,
    pub violations: Vec<ViolationRecord>,
}

impl Report {
    pub fn new(targets: Targets) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            report_version: "1.0.0".to_string(),
            report_id: uuid::Uuid::new_v4().to_string(),
            generated_at: now.clone(),
            analysis_date: now,
            targets,
            summary: Summary::default(),
            measures: Vec::new(),
            violations: Vec::new(),
        }
    }

    /// Measure for `metric`, if reported
    pub fn measure(&self, metric: Metric) -> Option<&Measure> {
        self.measures.iter().find(|m| m.metric == metric)
    }
}

/// Audit targets (tracker, project, filter)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Targets {
    pub server_url: String,
    pub project: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

/// Report summary with overall status
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Summary {
    pub status: ReportStatus,
    pub issues_count: u64,
    pub violations_count: usize,
}

/// Overall report status
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    #[default]
    Healthy,
    Warning,
    Critical,
}

/// Rule severity level
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Minor,
    Major,
    Critical,
    Blocker,
}

/// Reported metrics
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Issues,
    IssuesByPriority,
    IssuesByStatus,
    IssuesByDeveloper,
}

/// A metric value, with distribution data and a drill-down link
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Measure {
    pub metric: Metric,
    pub value: u64,
    /// `label=count;...` for distributions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// An issue flagged by a rule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ViolationRecord {
    pub issue_id: u64,
    pub rule_key: String,
    pub rule_name: String,
    pub severity: Severity,
    pub message: String,
}
