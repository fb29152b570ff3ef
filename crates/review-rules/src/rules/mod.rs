//! Rule DSL: condition trees, the rule executor, static validation and the built-in rule set.

pub mod context;
pub mod defaults;
pub mod domain;
pub mod evaluation;
pub mod validation;

#[cfg(test)]
mod tests;

pub use context::{known_fields, EngagementCounters, FixScoreContext, ReviewContext, RuleContext};
pub use defaults::{default_rule_set, DEFAULT_RULE_SET_VERSION};
pub use domain::{
    ComparisonOperator, CompoundCondition, ConditionNode, ConfidenceAction, ConfidenceRule,
    DefaultSufficiency, LogicOperator, Rule, RuleAction, RuleCategory, RuleCondition, RuleSet,
    SufficiencyAction, SufficiencyLevel, SufficiencyRule,
};
pub use evaluation::{
    ConfidenceOutcome, EvaluationError, Explanation, MatchedCondition, RuleExecutor, RuleMatch,
    SufficiencyOutcome, DEFAULT_CONFIDENCE_REASON, DEFAULT_SUFFICIENCY_REASON,
};
pub use validation::{
    validate_rule_set, validate_rule_set_json, ValidationIssue, ValidationReport,
};
