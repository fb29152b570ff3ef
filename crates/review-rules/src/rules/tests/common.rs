use serde_json::{json, Value};

use crate::rules::domain::{
    ComparisonOperator, ConditionNode, ConfidenceAction, ConfidenceRule, DefaultSufficiency, Rule,
    RuleSet, SufficiencyAction, SufficiencyLevel, SufficiencyRule,
};
use crate::rules::{FixScoreContext, ReviewContext};

pub(super) fn confidence_rule(
    id: &str,
    priority: i32,
    conditions: ConditionNode,
    weight: f64,
    reason_code: &str,
) -> ConfidenceRule {
    Rule::new(
        id,
        format!("rule {id}"),
        priority,
        conditions,
        ConfidenceAction {
            weight,
            reason_code: reason_code.to_string(),
            reason_message: None,
        },
    )
}

pub(super) fn sufficiency_rule(
    id: &str,
    priority: i32,
    conditions: ConditionNode,
    level: SufficiencyLevel,
    confidence: f64,
    reason_code: &str,
) -> SufficiencyRule {
    Rule::new(
        id,
        format!("rule {id}"),
        priority,
        conditions,
        SufficiencyAction {
            level,
            confidence,
            reason_code: reason_code.to_string(),
            reason_message: None,
        },
    )
}

pub(super) fn rule_set(
    confidence_rules: Vec<ConfidenceRule>,
    sufficiency_rules: Vec<SufficiencyRule>,
) -> RuleSet {
    RuleSet {
        version: "test-1".to_string(),
        confidence_rules,
        sufficiency_rules,
        default_confidence_weight: 0.9,
        default_sufficiency: DefaultSufficiency {
            level: SufficiencyLevel::Medium,
            confidence: 0.7,
        },
    }
}

pub(super) fn leaf(field: &str, operator: ComparisonOperator, value: Value) -> ConditionNode {
    ConditionNode::leaf(field, operator, value)
}

pub(super) fn short_content(length: usize) -> ConditionNode {
    leaf("contentLength", ComparisonOperator::Lt, json!(length))
}

pub(super) fn review(content: &str) -> ReviewContext {
    ReviewContext::new(content, "GOOGLE")
}

pub(super) fn fix_score(pre: u32, post: u32) -> FixScoreContext {
    FixScoreContext::new(pre, post, 3.8, 4.2, 30, 30)
}
