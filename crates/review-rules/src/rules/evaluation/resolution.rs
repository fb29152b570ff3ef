use serde_json::Value;

use super::super::domain::{Rule, RuleAction};
use super::logic::evaluate_node;
use super::{EvaluationError, RuleMatch};

/// Result of running one category's rules against a context document.
pub(crate) struct RulePass<'a, A> {
    pub rules_evaluated: usize,
    pub matches: Vec<RuleMatch>,
    pub winner: Option<&'a Rule<A>>,
}

/// Orders enabled rules by descending priority, keeping authoring order among equal
/// priorities, and records every rule whose conditions hold. The first match wins.
pub(crate) fn run_rules<'a, A: RuleAction>(
    rules: &'a [Rule<A>],
    document: &Value,
) -> Result<RulePass<'a, A>, EvaluationError> {
    let mut ordered: Vec<&Rule<A>> = rules.iter().filter(|rule| rule.enabled).collect();
    // `sort_by` is stable, which is the only tie-break between equal priorities.
    ordered.sort_by(|a, b| b.priority.cmp(&a.priority));

    let mut matches = Vec::new();
    let mut winner = None;

    for rule in &ordered {
        let mut matched_conditions = Vec::new();
        if !evaluate_node(&rule.conditions, document, &mut matched_conditions)? {
            continue;
        }

        if winner.is_none() {
            winner = Some(*rule);
        }
        matches.push(RuleMatch {
            rule_id: rule.id.clone(),
            rule_name: rule.name.clone(),
            priority: rule.priority,
            reason_code: rule.action.reason_code().to_string(),
            reason: rule.reason(),
            matched_conditions,
        });
    }

    Ok(RulePass {
        rules_evaluated: ordered.len(),
        matches,
        winner,
    })
}
