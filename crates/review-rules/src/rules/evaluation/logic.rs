use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::super::domain::{ComparisonOperator, CompoundCondition, ConditionNode, LogicOperator};
use super::condition::evaluate_condition;
use super::EvaluationError;

/// Leaf condition that held during evaluation, kept for the explain payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedCondition {
    pub field: String,
    pub operator: ComparisonOperator,
    pub expected: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<Value>,
}

/// Evaluates a condition tree, appending every leaf that matched to `matched`.
///
/// Every child is visited so the explain trail is complete and a malformed `NOT` anywhere in
/// the tree fails the evaluation.
pub fn evaluate_node(
    node: &ConditionNode,
    document: &Value,
    matched: &mut Vec<MatchedCondition>,
) -> Result<bool, EvaluationError> {
    match node {
        ConditionNode::Leaf(condition) => {
            let result = evaluate_condition(condition, document);
            if result.matched {
                matched.push(MatchedCondition {
                    field: condition.field.clone(),
                    operator: condition.operator,
                    expected: condition.value.clone(),
                    actual: result.actual,
                });
            }
            Ok(result.matched)
        }
        ConditionNode::Compound(compound) => evaluate_compound(compound, document, matched),
    }
}

fn evaluate_compound(
    compound: &CompoundCondition,
    document: &Value,
    matched: &mut Vec<MatchedCondition>,
) -> Result<bool, EvaluationError> {
    if compound.logic == LogicOperator::Not && compound.conditions.len() != 1 {
        return Err(EvaluationError::ConditionArity {
            found: compound.conditions.len(),
        });
    }

    let mut results = Vec::with_capacity(compound.conditions.len());
    for child in &compound.conditions {
        results.push(evaluate_node(child, document, matched)?);
    }

    let outcome = match compound.logic {
        LogicOperator::And => results.iter().all(|held| *held),
        LogicOperator::Or => results.iter().any(|held| *held),
        LogicOperator::Not => !results[0],
    };
    Ok(outcome)
}
