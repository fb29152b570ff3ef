//! Static checks applied to a candidate rule set before it may be persisted.
//!
//! Validation never fails: every problem is collected into a [`ValidationReport`] and the
//! caller decides whether to reject the candidate. Errors make a rule set unusable, warnings
//! flag constructs that evaluate but are probably not what the author meant.

use std::collections::BTreeMap;
use std::fmt;

use regex::RegexBuilder;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::context::known_fields;
use super::domain::{
    ComparisonOperator, ConditionNode, ConfidenceAction, ConfidenceRule, DefaultSufficiency,
    LogicOperator, Rule, RuleAction, RuleCategory, RuleSet, SufficiencyAction, SufficiencyRule,
};

/// One problem found in a rule set, located by a JSON-style path such as
/// `confidenceRules[2].conditions.conditions[0].field`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationIssue {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationIssue {
            path: path.into(),
            message: message.into(),
        });
    }

    fn finish(mut self) -> Self {
        self.valid = self.errors.is_empty();
        self
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            return write!(f, "rule set is valid ({} warning(s))", self.warnings.len());
        }
        let errors: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        write!(f, "{}", errors.join("; "))
    }
}

/// Validates a typed rule set.
pub fn validate_rule_set(rule_set: &RuleSet) -> ValidationReport {
    let mut report = ValidationReport::default();

    check_version(&rule_set.version, &mut report);
    check_rules(
        &rule_set.confidence_rules,
        "confidenceRules",
        check_confidence_action,
        &mut report,
    );
    check_rules(
        &rule_set.sufficiency_rules,
        "sufficiencyRules",
        check_sufficiency_action,
        &mut report,
    );
    check_default_weight(rule_set.default_confidence_weight, &mut report);
    check_default_sufficiency(&rule_set.default_sufficiency, &mut report);

    report.finish()
}

/// Validates an untyped candidate, reporting shape problems per rule before running the
/// typed checks on whatever parsed.
pub fn validate_rule_set_json(candidate: &Value) -> ValidationReport {
    let mut report = ValidationReport::default();

    let Some(root) = candidate.as_object() else {
        report.error("$", "rule set must be a JSON object");
        return report.finish();
    };

    match root.get("version") {
        Some(Value::String(version)) => check_version(version, &mut report),
        Some(_) => report.error("version", "must be a string"),
        None => report.error("version", "is required"),
    }

    let confidence_rules: Vec<ConfidenceRule> =
        parse_rule_list(root.get("confidenceRules"), "confidenceRules", &mut report);
    check_rules(
        &confidence_rules,
        "confidenceRules",
        check_confidence_action,
        &mut report,
    );

    let sufficiency_rules: Vec<SufficiencyRule> =
        parse_rule_list(root.get("sufficiencyRules"), "sufficiencyRules", &mut report);
    check_rules(
        &sufficiency_rules,
        "sufficiencyRules",
        check_sufficiency_action,
        &mut report,
    );

    match root.get("defaultConfidenceWeight").map(Value::as_f64) {
        Some(Some(weight)) => check_default_weight(weight, &mut report),
        Some(None) => report.error("defaultConfidenceWeight", "must be a number"),
        None => report.error("defaultConfidenceWeight", "is required"),
    }

    match root.get("defaultSufficiency") {
        Some(value) => match DefaultSufficiency::deserialize(value) {
            Ok(default) => check_default_sufficiency(&default, &mut report),
            Err(err) => report.error("defaultSufficiency", err.to_string()),
        },
        None => report.error("defaultSufficiency", "is required"),
    }

    report.finish()
}

fn parse_rule_list<T: DeserializeOwned>(
    value: Option<&Value>,
    path: &str,
    report: &mut ValidationReport,
) -> Vec<T> {
    let items = match value {
        Some(Value::Array(items)) => items,
        Some(_) => {
            report.error(path, "must be an array");
            return Vec::new();
        }
        None => {
            report.error(path, "is required");
            return Vec::new();
        }
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match T::deserialize(item) {
            Ok(rule) => Some(rule),
            Err(err) => {
                report.error(format!("{path}[{index}]"), err.to_string());
                None
            }
        })
        .collect()
}

fn check_version(version: &str, report: &mut ValidationReport) {
    if version.trim().is_empty() {
        report.error("version", "must be a non-empty string");
    }
}

fn check_rules<A: RuleAction>(
    rules: &[Rule<A>],
    path: &str,
    check_action: fn(&A, &str, &mut ValidationReport),
    report: &mut ValidationReport,
) {
    let mut seen: BTreeMap<&str, usize> = BTreeMap::new();

    for (index, rule) in rules.iter().enumerate() {
        let rule_path = format!("{path}[{index}]");

        if rule.id.trim().is_empty() {
            report.error(format!("{rule_path}.id"), "must be a non-empty string");
        } else {
            *seen.entry(rule.id.as_str()).or_default() += 1;
        }
        if rule.name.trim().is_empty() {
            report.error(format!("{rule_path}.name"), "must be a non-empty string");
        }
        if rule.category != A::CATEGORY {
            report.error(
                format!("{rule_path}.category"),
                format!("expected {} but found {}", A::CATEGORY, rule.category),
            );
        }
        if rule.action.reason_code().trim().is_empty() {
            report.error(
                format!("{rule_path}.action.reasonCode"),
                "must be a non-empty string",
            );
        }

        check_action(&rule.action, &format!("{rule_path}.action"), report);
        check_node(
            &rule.conditions,
            A::CATEGORY,
            &format!("{rule_path}.conditions"),
            report,
        );
    }

    let duplicates: Vec<&str> = seen
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(id, _)| id)
        .collect();
    if !duplicates.is_empty() {
        report.error(
            path,
            format!(
                "duplicate {} rule id(s): {}",
                A::CATEGORY.label().to_lowercase(),
                duplicates.join(", ")
            ),
        );
    }

    if !rules.is_empty() && rules.iter().all(|rule| !rule.enabled) {
        report.warn(path, "every rule is disabled; the default always applies");
    }
}

fn check_confidence_action(action: &ConfidenceAction, path: &str, report: &mut ValidationReport) {
    if !is_unit_interval(action.weight) {
        report.error(
            format!("{path}.weight"),
            format!("must be within [0, 1], found {}", action.weight),
        );
    }
}

fn check_sufficiency_action(
    action: &SufficiencyAction,
    path: &str,
    report: &mut ValidationReport,
) {
    if !is_unit_interval(action.confidence) {
        report.error(
            format!("{path}.confidence"),
            format!("must be within [0, 1], found {}", action.confidence),
        );
    }
}

fn check_default_weight(weight: f64, report: &mut ValidationReport) {
    if !is_unit_interval(weight) {
        report.error(
            "defaultConfidenceWeight",
            format!("must be within [0, 1], found {weight}"),
        );
    }
}

fn check_default_sufficiency(default: &DefaultSufficiency, report: &mut ValidationReport) {
    if !is_unit_interval(default.confidence) {
        report.error(
            "defaultSufficiency.confidence",
            format!("must be within [0, 1], found {}", default.confidence),
        );
    }
}

fn check_node(
    node: &ConditionNode,
    category: RuleCategory,
    path: &str,
    report: &mut ValidationReport,
) {
    match node {
        ConditionNode::Leaf(condition) => {
            let field_path = format!("{path}.field");
            if condition.field.trim().is_empty() {
                report.error(field_path, "must be a non-empty field path");
            } else if !known_fields(category).contains(&condition.field.as_str()) {
                report.error(
                    field_path,
                    format!(
                        "unknown field '{}' for {} context",
                        condition.field, category
                    ),
                );
            }
            check_operand(
                condition.operator,
                &condition.value,
                &format!("{path}.value"),
                report,
            );
        }
        ConditionNode::Compound(compound) => {
            match (compound.logic, compound.conditions.len()) {
                (LogicOperator::Not, 1) => {}
                (LogicOperator::Not, found) => report.error(
                    format!("{path}.conditions"),
                    format!("NOT requires exactly one child condition, found {found}"),
                ),
                (logic, 0) => report.warn(
                    format!("{path}.conditions"),
                    format!("empty {logic} group evaluates to a constant"),
                ),
                _ => {}
            }
            for (index, child) in compound.conditions.iter().enumerate() {
                check_node(
                    child,
                    category,
                    &format!("{path}.conditions[{index}]"),
                    report,
                );
            }
        }
    }
}

fn check_operand(
    operator: ComparisonOperator,
    value: &Value,
    path: &str,
    report: &mut ValidationReport,
) {
    match operator {
        ComparisonOperator::Gt
        | ComparisonOperator::Gte
        | ComparisonOperator::Lt
        | ComparisonOperator::Lte => {
            if !value.is_number() {
                report.warn(path, format!("{operator} compares numbers; this never matches"));
            }
        }
        ComparisonOperator::In | ComparisonOperator::Nin => {
            if !value.is_array() {
                report.warn(path, format!("{operator} expects an array; this never matches"));
            }
        }
        ComparisonOperator::Contains
        | ComparisonOperator::StartsWith
        | ComparisonOperator::EndsWith => {
            if !value.is_string() {
                report.warn(path, format!("{operator} expects a string; this never matches"));
            }
        }
        ComparisonOperator::Matches => match value {
            Value::String(pattern) => {
                if let Err(err) = RegexBuilder::new(pattern).case_insensitive(true).build() {
                    report.warn(path, format!("invalid pattern never matches: {err}"));
                }
            }
            _ => report.warn(path, "matches expects a pattern string; this never matches"),
        },
        ComparisonOperator::Eq | ComparisonOperator::Neq => {}
    }
}

fn is_unit_interval(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}
