pub mod catalog;
mod context;
mod distribution;
mod engine;

pub use catalog::{ParamDef, ParamKind, ParamValue, RuleDef, ALL_RULES};
pub use context::{days_between, IssueContext};
pub use distribution::Distribution;
pub use engine::{Analysis, Engine, Predicate, RuleRegistry, Violation, UNASSIGNED};
