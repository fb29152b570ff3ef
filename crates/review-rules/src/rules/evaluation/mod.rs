mod condition;
mod logic;
mod resolution;

pub use condition::{evaluate_condition, resolve_path, ConditionResult};
pub use logic::{evaluate_node, MatchedCondition};

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::context::{FixScoreContext, ReviewContext, RuleContext};
use super::domain::{RuleSet, SufficiencyLevel};
use resolution::run_rules;

pub const DEFAULT_CONFIDENCE_REASON: &str = "DEFAULT_CONFIDENCE";
pub const DEFAULT_SUFFICIENCY_REASON: &str = "DEFAULT_SUFFICIENCY";

/// Configuration faults surfaced while evaluating a rule set. These are never transient.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    #[error("NOT condition requires exactly one child condition, found {found}")]
    ConditionArity { found: usize },
    #[error("evaluation context could not be serialized: {0}")]
    Context(String),
}

/// Stateless evaluator bound to one immutable rule set snapshot.
#[derive(Debug, Clone)]
pub struct RuleExecutor {
    rules: Arc<RuleSet>,
}

impl RuleExecutor {
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules: Arc::new(rules),
        }
    }

    pub fn from_shared(rules: Arc<RuleSet>) -> Self {
        Self { rules }
    }

    pub fn rule_set(&self) -> &RuleSet {
        &self.rules
    }

    /// Scores how much a single review should count (`W_confidence`).
    pub fn evaluate_confidence(
        &self,
        context: &ReviewContext,
    ) -> Result<ConfidenceOutcome, EvaluationError> {
        let document = context_document(context)?;
        let pass = run_rules(&self.rules.confidence_rules, &document)?;

        let (score, reason_code) = match pass.winner {
            Some(rule) => (rule.action.weight, rule.action.reason_code.clone()),
            None => (
                self.rules.default_confidence_weight,
                DEFAULT_CONFIDENCE_REASON.to_string(),
            ),
        };
        let explanation = Explanation::new(pass.rules_evaluated, pass.matches);

        debug!(
            rule_set = %self.rules.version,
            score,
            reason_code = %reason_code,
            used_default = explanation.used_default,
            "confidence evaluated"
        );

        Ok(ConfidenceOutcome {
            score,
            reason_code,
            explanation,
        })
    }

    /// Decides whether enough data backs a measured before/after change.
    pub fn evaluate_sufficiency(
        &self,
        context: &FixScoreContext,
    ) -> Result<SufficiencyOutcome, EvaluationError> {
        let document = context_document(context)?;
        let pass = run_rules(&self.rules.sufficiency_rules, &document)?;

        let (level, confidence, reason_code) = match pass.winner {
            Some(rule) => (
                rule.action.level,
                rule.action.confidence,
                rule.action.reason_code.clone(),
            ),
            None => (
                self.rules.default_sufficiency.level,
                self.rules.default_sufficiency.confidence,
                DEFAULT_SUFFICIENCY_REASON.to_string(),
            ),
        };
        let explanation = Explanation::new(pass.rules_evaluated, pass.matches);

        debug!(
            rule_set = %self.rules.version,
            %level,
            confidence,
            reason_code = %reason_code,
            used_default = explanation.used_default,
            "sufficiency evaluated"
        );

        Ok(SufficiencyOutcome {
            level,
            confidence,
            reason_code,
            explanation,
        })
    }
}

fn context_document<C: RuleContext>(context: &C) -> Result<serde_json::Value, EvaluationError> {
    context
        .document()
        .map_err(|err| EvaluationError::Context(err.to_string()))
}

/// A rule whose conditions held, with the leaves that individually matched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleMatch {
    pub rule_id: String,
    pub rule_name: String,
    pub priority: i32,
    pub reason_code: String,
    pub reason: String,
    pub matched_conditions: Vec<MatchedCondition>,
}

/// Explain payload describing which rules were considered and why the result was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Explanation {
    pub rules_evaluated: usize,
    pub matches: Vec<RuleMatch>,
    pub applied_rule: Option<RuleMatch>,
    pub used_default: bool,
}

impl Explanation {
    fn new(rules_evaluated: usize, matches: Vec<RuleMatch>) -> Self {
        let applied_rule = matches.first().cloned();
        Self {
            rules_evaluated,
            used_default: applied_rule.is_none(),
            applied_rule,
            matches,
        }
    }

    pub fn summary(&self) -> String {
        match &self.applied_rule {
            Some(applied) => format!(
                "applied {} ({}) after {} of {} rule(s) matched",
                applied.reason_code,
                applied.rule_id,
                self.matches.len(),
                self.rules_evaluated
            ),
            None => format!(
                "no rule matched out of {}; default applied",
                self.rules_evaluated
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceOutcome {
    pub score: f64,
    pub reason_code: String,
    pub explanation: Explanation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SufficiencyOutcome {
    pub level: SufficiencyLevel,
    pub confidence: f64,
    pub reason_code: String,
    pub explanation: Explanation,
}
