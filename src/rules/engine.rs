use chrono::{DateTime, Utc};

use super::catalog::{RuleDef, OLD_TICKET, SELF_ASSIGNED_TICKET, STALLED_TICKET, UNASSIGNED_TICKET};
use super::context::IssueContext;
use super::distribution::Distribution;
use crate::config::Configuration;
use crate::tracker::Issue;

/// Assignee label for issues without a handler
pub const UNASSIGNED: &str = "unassigned";

/// Condition under which a rule applies to an issue
pub type Predicate = fn(&IssueContext<'_>, &Configuration) -> bool;

fn is_old(ctx: &IssueContext<'_>, config: &Configuration) -> bool {
    ctx.age_since_submission >= i64::from(config.old_age)
}

fn is_unassigned(ctx: &IssueContext<'_>, config: &Configuration) -> bool {
    ctx.issue.handler.is_none() && ctx.age_since_submission >= i64::from(config.unassigned_age)
}

fn is_stalled(ctx: &IssueContext<'_>, config: &Configuration) -> bool {
    ctx.age_since_update >= i64::from(config.stalled_age)
}

fn is_self_assigned(ctx: &IssueContext<'_>, config: &Configuration) -> bool {
    let states = &config.self_assigned_states;
    (states.is_empty() || states.contains(&ctx.issue.status.name)) && ctx.is_self_assigned()
}

/// Built-in rules in precedence order
static DEFAULT_RULES: [(&RuleDef, Predicate); 4] = [
    (&OLD_TICKET, is_old),
    (&UNASSIGNED_TICKET, is_unassigned),
    (&STALLED_TICKET, is_stalled),
    (&SELF_ASSIGNED_TICKET, is_self_assigned),
];

/// An issue that triggered a rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub issue_id: u64,
    pub rule: &'static RuleDef,
    pub message: String,
}

impl Violation {
    fn new(issue: &Issue, rule: &'static RuleDef) -> Self {
        Self {
            issue_id: issue.id,
            rule,
            message: format!("[#{}] {}: {}", issue.id, issue.summary, rule.name),
        }
    }
}

/// Output of one pass over the issues
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Analysis {
    pub violations: Vec<Violation>,
    pub by_priority: Distribution,
    pub by_status: Distribution,
    pub by_assignee: Distribution,
    pub total: u64,
}

impl Analysis {
    /// Combine the analysis of a disjoint batch of issues
    pub fn merge(&mut self, other: Analysis) {
        self.violations.extend(other.violations);
        self.by_priority.merge(&other.by_priority);
        self.by_status.merge(&other.by_status);
        self.by_assignee.merge(&other.by_assignee);
        self.total += other.total;
    }
}

/// Ordered rules; the first match wins
#[derive(Default)]
pub struct RuleRegistry {
    rules: Vec<(&'static RuleDef, Predicate)>,
}

impl RuleRegistry {
    /// Create a new empty rule registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the four built-in rules
    pub fn with_default_rules() -> Self {
        Self {
            rules: DEFAULT_RULES.to_vec(),
        }
    }

    /// Append a rule with the lowest precedence so far
    pub fn register(&mut self, rule: &'static RuleDef, predicate: Predicate) {
        self.rules.push((rule, predicate));
    }

    /// First rule whose predicate holds
    pub fn first_match(
        &self,
        ctx: &IssueContext<'_>,
        config: &Configuration,
    ) -> Option<&'static RuleDef> {
        self.rules
            .iter()
            .find(|(_, predicate)| predicate(ctx, config))
            .map(|(rule, _)| *rule)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Registered rule keys in precedence order
    pub fn rule_keys(&self) -> Vec<&'static str> {
        self.rules.iter().map(|(r, _)| r.key).collect()
    }
}

/// Classifies issues and builds the distributions
pub struct Engine {
    registry: RuleRegistry,
    config: Configuration,
}

impl Engine {
    pub fn new(config: Configuration) -> Self {
        Self::with_registry(RuleRegistry::with_default_rules(), config)
    }

    pub fn with_registry(registry: RuleRegistry, config: Configuration) -> Self {
        Self { registry, config }
    }

    /// The violation raised by `issue`, if any
    pub fn evaluate(&self, issue: &Issue, as_of: DateTime<Utc>) -> Option<Violation> {
        let ctx = IssueContext::new(issue, as_of);
        self.registry
            .first_match(&ctx, &self.config)
            .map(|rule| Violation::new(issue, rule))
    }

    /// One pass over `issues`
    pub fn run(&self, issues: &[Issue], as_of: DateTime<Utc>) -> Analysis {
        let mut analysis = Analysis::default();

        for issue in issues {
            analysis.by_priority.increment(&issue.priority.name);
            analysis.by_status.increment(&issue.status.name);
            analysis.by_assignee.increment(
                issue
                    .handler
                    .as_ref()
                    .map(|h| h.name.as_str())
                    .unwrap_or(UNASSIGNED),
            );
            analysis.total += 1;

            if let Some(violation) = self.evaluate(issue, as_of) {
                tracing::info!("Mantis #{}: {}", issue.id, violation.rule.name);
                analysis.violations.push(violation);
            }
        }

        analysis
    }
}
