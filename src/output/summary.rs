use crate::report::{Metric, Report, ReportStatus};

fn metric_label(metric: Metric) -> &'static str {
    match metric {
        Metric::Issues => "Issues",
        Metric::IssuesByPriority => "By priority",
        Metric::IssuesByStatus => "By status",
        Metric::IssuesByDeveloper => "By developer",
    }
}

/// Print human-readable summary to stdout
pub fn print_summary(report: &Report, output_path: &str) {
    println!();
    println!("╭───────────────────────────────────────────────────────────────╮");
    println!("│                 IssueAudit Report Summary                     │");
    println!("╰───────────────────────────────────────────────────────────────╯");
    println!();

    println!("Target: {} / {}", report.targets.server_url, report.targets.project);
    if let Some(filter) = &report.targets.filter {
        println!("Filter: {}", filter);
    }
    println!("Analysis date: {}", report.analysis_date);
    println!();

    let (status_icon, status_text) = match report.summary.status {
        ReportStatus::Healthy => ("✅", "HEALTHY"),
        ReportStatus::Warning => ("⚠️ ", "WARNING"),
        ReportStatus::Critical => ("🚨", "CRITICAL"),
    };
    println!("Status: {} {}", status_icon, status_text);
    println!();

    for measure in &report.measures {
        match &measure.data {
            Some(data) if !data.is_empty() => {
                println!("{}:", metric_label(measure.metric));
                for entry in data.split(';') {
                    println!("  {}", entry.replacen('=', ": ", 1));
                }
            }
            Some(_) => {}
            None => println!("{}: {}", metric_label(measure.metric), measure.value),
        }
    }
    println!();

    if !report.violations.is_empty() {
        println!("Violations ({} total):", report.summary.violations_count);
        for violation in &report.violations {
            println!(
                "  ⚠️  [{}] {}",
                violation.rule_key,
                truncate(&violation.message, 100)
            );
        }
        println!();
    }

    println!("Full report written to: {}", output_path);
    println!();
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    } else {
        s.to_string()
    }
}

/// Format summary as string (for testing)
pub fn format_summary(report: &Report) -> String {
    let mut output = String::new();

    output.push_str(&format!("Status: {:?}\n", report.summary.status));
    output.push_str(&format!("Issues: {}\n", report.summary.issues_count));
    output.push_str(&format!(
        "Violations: {}\n",
        report.summary.violations_count
    ));

    for violation in &report.violations {
        output.push_str(&format!(
            "[{:?}] {}: {}\n",
            violation.severity, violation.rule_key, violation.message
        ));
    }

    output
}
