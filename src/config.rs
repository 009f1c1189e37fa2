//! Settings resolution.
//!
//! Connection settings come from the command line (or environment). Rule
//! thresholds start from the catalog defaults and may be overridden by a
//! profile file:
//!
//! ```toml
//! [rules.mantis-old-ticket]
//! age = 200
//!
//! [rules.mantis-self-assigned-ticket]
//! states = "new, feedback"
//! ```
//!
//! Everything is validated here so the engine only ever sees a well-formed
//! `Configuration`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::error::AuditError;
use crate::rules::catalog::{
    self, RuleDef, OLD_TICKET, SELF_ASSIGNED_TICKET, STALLED_TICKET, UNASSIGNED_TICKET,
};

/// Resolved rule thresholds used by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    /// Days since submission after which an issue is old
    pub old_age: u32,
    /// Days since submission after which an unassigned issue is flagged
    pub unassigned_age: u32,
    /// Days without update after which an issue is stalled
    pub stalled_age: u32,
    /// Statuses in which self-assignment is flagged; empty means any
    pub self_assigned_states: BTreeSet<String>,
}

impl Configuration {
    /// Catalog defaults with no overrides
    pub fn defaults() -> Result<Self, AuditError> {
        resolve(&RuleOverrides::default())
    }
}

/// Raw per-rule parameter overrides from the active profile
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleOverrides {
    /// rule key -> parameter name -> raw text
    values: BTreeMap<String, BTreeMap<String, String>>,
}

#[derive(Debug, Default, Deserialize)]
struct ProfileFile {
    #[serde(default)]
    rules: BTreeMap<String, BTreeMap<String, toml::Value>>,
}

impl RuleOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a raw override value
    pub fn set(&mut self, rule: &str, param: &str, raw: &str) -> &mut Self {
        self.values
            .entry(rule.to_string())
            .or_default()
            .insert(param.to_string(), raw.to_string());
        self
    }

    /// Raw override for a rule parameter, if any
    pub fn get(&self, rule: &str, param: &str) -> Option<&str> {
        self.values
            .get(rule)
            .and_then(|params| params.get(param))
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parse a TOML profile
    pub fn from_toml_str(content: &str) -> Result<Self, AuditError> {
        let file: ProfileFile = toml::from_str(content)
            .map_err(|e| AuditError::Configuration(format!("invalid profile: {}", e)))?;

        let mut overrides = Self::new();
        for (rule, params) in file.rules {
            for (param, value) in params {
                let raw = match value {
                    toml::Value::String(s) => s,
                    toml::Value::Integer(i) => i.to_string(),
                    toml::Value::Array(items) => items
                        .iter()
                        .map(|item| match item {
                            toml::Value::String(s) => Ok(s.clone()),
                            other => Err(AuditError::Configuration(format!(
                                "rules.{}.{}: expected a list of strings, found {}",
                                rule, param, other
                            ))),
                        })
                        .collect::<Result<Vec<_>, _>>()?
                        .join(","),
                    other => {
                        return Err(AuditError::Configuration(format!(
                            "rules.{}.{}: unsupported value {}",
                            rule, param, other
                        )))
                    }
                };
                overrides.set(&rule, &param, &raw);
            }
        }
        Ok(overrides)
    }

    /// Load a TOML profile from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read profile {:?}", path))?;
        let overrides = Self::from_toml_str(&content)
            .with_context(|| format!("Failed to load profile {:?}", path))?;
        Ok(overrides)
    }
}

fn integer(rule: &RuleDef, param: &str, overrides: &RuleOverrides) -> Result<u32, AuditError> {
    let value = match overrides.get(rule.key, param) {
        Some(raw) => catalog::parse(rule, param, raw)?,
        None => catalog::default_of(rule, param)?,
    };
    value.as_integer().ok_or_else(|| {
        AuditError::Configuration(format!("{}.{} is not an integer parameter", rule.key, param))
    })
}

fn string_set(
    rule: &RuleDef,
    param: &str,
    overrides: &RuleOverrides,
) -> Result<BTreeSet<String>, AuditError> {
    let value = match overrides.get(rule.key, param) {
        Some(raw) => catalog::parse(rule, param, raw)?,
        None => catalog::default_of(rule, param)?,
    };
    value.into_string_set().ok_or_else(|| {
        AuditError::Configuration(format!("{}.{} is not a list parameter", rule.key, param))
    })
}

/// Combine catalog defaults with profile overrides
pub fn resolve(overrides: &RuleOverrides) -> Result<Configuration, AuditError> {
    for (rule_key, params) in &overrides.values {
        let rule = catalog::find_rule(rule_key).ok_or_else(|| {
            AuditError::Configuration(format!("unknown rule `{}` in profile", rule_key))
        })?;
        for param in params.keys() {
            if rule.param(param).is_none() {
                return Err(AuditError::Configuration(format!(
                    "rule {} has no parameter named `{}`",
                    rule.key, param
                )));
            }
        }
    }

    let config = Configuration {
        old_age: integer(&OLD_TICKET, "age", overrides)?,
        unassigned_age: integer(&UNASSIGNED_TICKET, "age", overrides)?,
        stalled_age: integer(&STALLED_TICKET, "age", overrides)?,
        self_assigned_states: string_set(&SELF_ASSIGNED_TICKET, "states", overrides)?,
    };

    if overrides.get(OLD_TICKET.key, "age").is_some() {
        tracing::info!("old ticket age: {}", config.old_age);
    }
    if overrides.get(UNASSIGNED_TICKET.key, "age").is_some() {
        tracing::info!("unassigned ticket age: {}", config.unassigned_age);
    }
    if overrides.get(STALLED_TICKET.key, "age").is_some() {
        tracing::info!("stalled ticket age: {}", config.stalled_age);
    }
    if overrides.get(SELF_ASSIGNED_TICKET.key, "states").is_some() {
        tracing::info!("self assigned states: {:?}", config.self_assigned_states);
    }

    Ok(config)
}

/// Where and as whom to connect
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub server_url: String,
    pub username: String,
    pub password: String,
    pub project: String,
    /// Saved filter name; `None` fetches all issues
    pub filter: Option<String>,
}

impl ConnectionSettings {
    /// Names of mandatory settings that are empty
    pub fn missing(&self) -> Vec<&'static str> {
        [
            ("server url", &self.server_url),
            ("project name", &self.project),
            ("username", &self.username),
            ("password", &self.password),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    /// True when every mandatory setting is present
    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }

    /// Configured filter name, ignoring blanks
    pub fn filter_name(&self) -> Option<&str> {
        self.filter
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
    }
}
