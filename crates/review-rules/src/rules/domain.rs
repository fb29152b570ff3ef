use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Decision a rule contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RuleCategory {
    Confidence,
    Sufficiency,
}

impl RuleCategory {
    pub fn label(&self) -> &'static str {
        match self {
            RuleCategory::Confidence => "CONFIDENCE",
            RuleCategory::Sufficiency => "SUFFICIENCY",
        }
    }
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Comparison applied by a leaf condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComparisonOperator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Nin,
    Contains,
    StartsWith,
    EndsWith,
    Matches,
}

impl ComparisonOperator {
    pub fn label(&self) -> &'static str {
        match self {
            ComparisonOperator::Eq => "eq",
            ComparisonOperator::Neq => "neq",
            ComparisonOperator::Gt => "gt",
            ComparisonOperator::Gte => "gte",
            ComparisonOperator::Lt => "lt",
            ComparisonOperator::Lte => "lte",
            ComparisonOperator::In => "in",
            ComparisonOperator::Nin => "nin",
            ComparisonOperator::Contains => "contains",
            ComparisonOperator::StartsWith => "startsWith",
            ComparisonOperator::EndsWith => "endsWith",
            ComparisonOperator::Matches => "matches",
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Boolean combinator of a compound condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicOperator {
    And,
    Or,
    Not,
}

impl fmt::Display for LogicOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LogicOperator::And => "AND",
            LogicOperator::Or => "OR",
            LogicOperator::Not => "NOT",
        };
        f.write_str(label)
    }
}

/// Leaf of a condition tree: `field <operator> value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleCondition {
    pub field: String,
    pub operator: ComparisonOperator,
    pub value: Value,
}

impl RuleCondition {
    pub fn new(field: impl Into<String>, operator: ComparisonOperator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }
}

/// Boolean combination of nested conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundCondition {
    pub logic: LogicOperator,
    pub conditions: Vec<ConditionNode>,
}

/// Node of a condition tree. Serialized without a tag: compound nodes carry `logic`, leaves
/// carry `field`/`operator`/`value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionNode {
    Compound(CompoundCondition),
    Leaf(RuleCondition),
}

impl ConditionNode {
    pub fn leaf(field: impl Into<String>, operator: ComparisonOperator, value: Value) -> Self {
        ConditionNode::Leaf(RuleCondition::new(field, operator, value))
    }

    pub fn all(conditions: Vec<ConditionNode>) -> Self {
        ConditionNode::Compound(CompoundCondition {
            logic: LogicOperator::And,
            conditions,
        })
    }

    pub fn any(conditions: Vec<ConditionNode>) -> Self {
        ConditionNode::Compound(CompoundCondition {
            logic: LogicOperator::Or,
            conditions,
        })
    }

    pub fn negate(condition: ConditionNode) -> Self {
        ConditionNode::Compound(CompoundCondition {
            logic: LogicOperator::Not,
            conditions: vec![condition],
        })
    }

    /// Visits every leaf in authoring order.
    pub fn leaves(&self) -> Vec<&RuleCondition> {
        let mut leaves = Vec::new();
        collect_leaves(self, &mut leaves);
        leaves
    }
}

fn collect_leaves<'a>(node: &'a ConditionNode, leaves: &mut Vec<&'a RuleCondition>) {
    match node {
        ConditionNode::Leaf(condition) => leaves.push(condition),
        ConditionNode::Compound(compound) => {
            for child in &compound.conditions {
                collect_leaves(child, leaves);
            }
        }
    }
}

impl From<RuleCondition> for ConditionNode {
    fn from(value: RuleCondition) -> Self {
        ConditionNode::Leaf(value)
    }
}

impl From<CompoundCondition> for ConditionNode {
    fn from(value: CompoundCondition) -> Self {
        ConditionNode::Compound(value)
    }
}

/// Behavior shared by the category-specific rule actions.
pub trait RuleAction {
    const CATEGORY: RuleCategory;

    fn reason_code(&self) -> &str;
    fn reason_message(&self) -> Option<&str>;
}

/// Outcome of a matching confidence rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceAction {
    pub weight: f64,
    pub reason_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_message: Option<String>,
}

impl RuleAction for ConfidenceAction {
    const CATEGORY: RuleCategory = RuleCategory::Confidence;

    fn reason_code(&self) -> &str {
        &self.reason_code
    }

    fn reason_message(&self) -> Option<&str> {
        self.reason_message.as_deref()
    }
}

/// Outcome of a matching sufficiency rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SufficiencyAction {
    pub level: SufficiencyLevel,
    pub confidence: f64,
    pub reason_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_message: Option<String>,
}

impl RuleAction for SufficiencyAction {
    const CATEGORY: RuleCategory = RuleCategory::Sufficiency;

    fn reason_code(&self) -> &str {
        &self.reason_code
    }

    fn reason_message(&self) -> Option<&str> {
        self.reason_message.as_deref()
    }
}

/// How much data backs a measured before/after change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SufficiencyLevel {
    Insufficient,
    Low,
    Medium,
    High,
}

impl SufficiencyLevel {
    pub const ALL: [SufficiencyLevel; 4] = [
        SufficiencyLevel::Insufficient,
        SufficiencyLevel::Low,
        SufficiencyLevel::Medium,
        SufficiencyLevel::High,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SufficiencyLevel::Insufficient => "INSUFFICIENT",
            SufficiencyLevel::Low => "LOW",
            SufficiencyLevel::Medium => "MEDIUM",
            SufficiencyLevel::High => "HIGH",
        }
    }
}

impl fmt::Display for SufficiencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn enabled_by_default() -> bool {
    true
}

/// A prioritized rule. The action type fixes the category the rule belongs to; the persisted
/// `category` tag is cross-checked by the validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule<A> {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: RuleCategory,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    pub priority: i32,
    pub conditions: ConditionNode,
    pub action: A,
}

impl<A: RuleAction> Rule<A> {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        priority: i32,
        conditions: ConditionNode,
        action: A,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            category: A::CATEGORY,
            enabled: true,
            priority,
            conditions,
            action,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Human explanation used in the explain payload.
    pub fn reason(&self) -> String {
        match self.action.reason_message() {
            Some(message) => message.to_string(),
            None => self
                .description
                .clone()
                .unwrap_or_else(|| self.name.clone()),
        }
    }
}

pub type ConfidenceRule = Rule<ConfidenceAction>;
pub type SufficiencyRule = Rule<SufficiencyAction>;

/// Fallback sufficiency used when no sufficiency rule matches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DefaultSufficiency {
    pub level: SufficiencyLevel,
    pub confidence: f64,
}

/// Versioned bundle of confidence and sufficiency rules plus their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSet {
    pub version: String,
    pub confidence_rules: Vec<ConfidenceRule>,
    pub sufficiency_rules: Vec<SufficiencyRule>,
    pub default_confidence_weight: f64,
    pub default_sufficiency: DefaultSufficiency,
}

impl RuleSet {
    pub fn enabled_rule_count(&self, category: RuleCategory) -> usize {
        match category {
            RuleCategory::Confidence => self.confidence_rules.iter().filter(|r| r.enabled).count(),
            RuleCategory::Sufficiency => {
                self.sufficiency_rules.iter().filter(|r| r.enabled).count()
            }
        }
    }
}
