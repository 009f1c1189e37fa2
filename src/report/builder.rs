use chrono::{DateTime, Utc};

use super::types::*;
use crate::rules::{Analysis, Distribution, Violation};

/// Issue search page on the tracker for a project
pub fn drill_down_url(server_url: &str, project_id: u64) -> String {
    format!(
        "{}/search.php?project_id={}&sticky_issues=on&sortby=property&dir=DESC&hide_status_id=-2",
        server_url.trim_end_matches('/'),
        project_id
    )
}

/// Builder for constructing audit reports
pub struct ReportBuilder {
    targets: Targets,
    analysis_date: Option<DateTime<Utc>>,
    url: Option<String>,
    analysis: Analysis,
}

impl ReportBuilder {
    /// Create a new report builder
    pub fn new(targets: Targets) -> Self {
        Self {
            targets,
            analysis_date: None,
            url: None,
            analysis: Analysis::default(),
        }
    }

    /// Record the reference date of the analysis
    pub fn with_analysis_date(&mut self, as_of: DateTime<Utc>) -> &mut Self {
        self.analysis_date = Some(as_of);
        self
    }

    /// Attach drill-down links for the tracker project
    pub fn with_project_id(&mut self, project_id: u64) -> &mut Self {
        self.url = Some(drill_down_url(&self.targets.server_url, project_id));
        self
    }

    /// Add the result of an engine pass
    pub fn with_analysis(&mut self, analysis: Analysis) -> &mut Self {
        self.analysis.merge(analysis);
        self
    }

    fn distribution(&self, metric: Metric, dist: &Distribution) -> Measure {
        Measure {
            metric,
            value: self.analysis.total,
            data: Some(dist.data()),
            url: self.url.clone(),
        }
    }

    fn record(violation: &Violation) -> ViolationRecord {
        ViolationRecord {
            issue_id: violation.issue_id,
            rule_key: violation.rule.key.to_string(),
            rule_name: violation.rule.name.to_string(),
            severity: violation.rule.severity,
            message: violation.message.clone(),
        }
    }

    /// Build the final report
    pub fn build(self) -> Report {
        let mut report = Report::new(self.targets.clone());
        if let Some(date) = self.analysis_date {
            report.analysis_date = date.to_rfc3339();
        }

        report.measures = vec![
            Measure {
                metric: Metric::Issues,
                value: self.analysis.total,
                data: None,
                url: self.url.clone(),
            },
            self.distribution(Metric::IssuesByPriority, &self.analysis.by_priority),
            self.distribution(Metric::IssuesByStatus, &self.analysis.by_status),
            self.distribution(Metric::IssuesByDeveloper, &self.analysis.by_assignee),
        ];

        report.violations = self.analysis.violations.iter().map(Self::record).collect();

        let worst = report.violations.iter().map(|v| v.severity).max();
        report.summary = Summary {
            status: match worst {
                Some(s) if s >= Severity::Critical => ReportStatus::Critical,
                Some(_) => ReportStatus::Warning,
                None => ReportStatus::Healthy,
            },
            issues_count: self.analysis.total,
            violations_count: report.violations.len(),
        };

        report
    }
}
