use crate::rules::{ParamKind, RuleDef};

/// Describe the rule catalog, one block per rule
pub fn format_rules(rules: &[&RuleDef]) -> String {
    let mut output = String::new();

    for rule in rules {
        output.push_str(&format!(
            "{} ({:?}): {}\n  {}\n",
            rule.key, rule.severity, rule.name, rule.description
        ));
        for param in rule.params {
            let kind = match param.kind {
                ParamKind::Integer => "integer",
                ParamKind::StringList => "list",
            };
            output.push_str(&format!(
                "  - {} [{}, default {:?}]: {}\n",
                param.name, kind, param.default, param.description
            ));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::ALL_RULES;

    #[test]
    fn test_format_rules_lists_all() {
        let output = format_rules(&ALL_RULES);

        assert!(output.starts_with("mantis-old-ticket (Major): Old mantis ticket"));
        assert!(output.contains("  - age [integer, default \"180\"]"));
        assert!(output.contains("  - states [list, default \"new\"]"));
        assert_eq!(output.matches("mantis-").count(), 4);
    }

    #[test]
    fn test_format_rules_empty() {
        assert_eq!(format_rules(&[]), "");
    }
}
