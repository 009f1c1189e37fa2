use std::collections::BTreeSet;

use crate::error::AuditError;
use crate::report::Severity;

/// Declared type of a rule parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Non-negative number of days
    Integer,
    /// Comma-separated names
    StringList,
}

/// A named, typed, defaulted rule parameter
#[derive(Debug, PartialEq, Eq)]
pub struct ParamDef {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: ParamKind,
    pub default: &'static str,
}

/// A rule definition. Immutable; the catalog below is the only source.
#[derive(Debug, PartialEq, Eq)]
pub struct RuleDef {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub severity: Severity,
    pub params: &'static [ParamDef],
}

impl RuleDef {
    /// Look up a parameter by name
    pub fn param(&self, name: &str) -> Option<&'static ParamDef> {
        self.params.iter().find(|p| p.name == name)
    }
}

/// A parsed parameter value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Integer(u32),
    /// Empty means "any"
    StringSet(BTreeSet<String>),
}

impl ParamValue {
    pub fn as_integer(&self) -> Option<u32> {
        match self {
            ParamValue::Integer(v) => Some(*v),
            ParamValue::StringSet(_) => None,
        }
    }

    pub fn into_string_set(self) -> Option<BTreeSet<String>> {
        match self {
            ParamValue::StringSet(set) => Some(set),
            ParamValue::Integer(_) => None,
        }
    }
}

pub static OLD_TICKET: RuleDef = RuleDef {
    key: "mantis-old-ticket",
    name: "Old mantis ticket",
    description: "Tickets that have been open for a long time.",
    severity: Severity::Major,
    params: &[ParamDef {
        name: "age",
        description: "Maximum authorized age of an issue, in days.",
        kind: ParamKind::Integer,
        default: "180",
    }],
};

pub static UNASSIGNED_TICKET: RuleDef = RuleDef {
    key: "mantis-unassigned-ticket",
    name: "Unassigned mantis ticket",
    description: "Tickets that have not been assigned quickly enough.",
    severity: Severity::Major,
    params: &[ParamDef {
        name: "age",
        description: "Maximum authorized age of an unassigned issue, in days.",
        kind: ParamKind::Integer,
        default: "7",
    }],
};

pub static STALLED_TICKET: RuleDef = RuleDef {
    key: "mantis-stalled-ticket",
    name: "Stalled mantis ticket",
    description: "Tickets that have not been updated for some time.",
    severity: Severity::Major,
    params: &[ParamDef {
        name: "age",
        description: "Maximum time with no activity, in days.",
        kind: ParamKind::Integer,
        default: "56",
    }],
};

pub static SELF_ASSIGNED_TICKET: RuleDef = RuleDef {
    key: "mantis-self-assigned-ticket",
    name: "Self-assigned mantis ticket",
    description: "Tickets that are assigned to reporter.",
    severity: Severity::Major,
    params: &[ParamDef {
        name: "states",
        description: "Comma-separated list of states to consider. A violation is generated \
                      if a ticket is assigned to its reporter and its state is in this list. \
                      Leave empty to generate a violation in any state.",
        kind: ParamKind::StringList,
        default: "new",
    }],
};

/// All rules, in precedence order
pub static ALL_RULES: [&RuleDef; 4] = [
    &OLD_TICKET,
    &UNASSIGNED_TICKET,
    &STALLED_TICKET,
    &SELF_ASSIGNED_TICKET,
];

/// Find a rule by key
pub fn find_rule(key: &str) -> Option<&'static RuleDef> {
    ALL_RULES.iter().copied().find(|r| r.key == key)
}

fn lookup(rule: &RuleDef, param: &str) -> Result<&'static ParamDef, AuditError> {
    rule.param(param).ok_or_else(|| {
        AuditError::Configuration(format!(
            "rule {} has no parameter named `{}`",
            rule.key, param
        ))
    })
}

/// The built-in default of a rule parameter
pub fn default_of(rule: &RuleDef, param: &str) -> Result<ParamValue, AuditError> {
    let def = lookup(rule, param)?;
    parse(rule, param, def.default)
}

/// Convert raw override text to the parameter's declared type
pub fn parse(rule: &RuleDef, param: &str, raw: &str) -> Result<ParamValue, AuditError> {
    let def = lookup(rule, param)?;

    match def.kind {
        ParamKind::Integer => {
            let text = raw.trim();
            text.parse::<u32>().map(ParamValue::Integer).map_err(|_| {
                let reason = if text.parse::<i64>().is_ok() {
                    "must not be negative"
                } else {
                    "expected a whole number of days"
                };
                AuditError::InvalidParameter {
                    rule: rule.key.to_string(),
                    param: param.to_string(),
                    value: raw.to_string(),
                    reason: reason.to_string(),
                }
            })
        }
        ParamKind::StringList => Ok(ParamValue::StringSet(
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )),
    }
}
