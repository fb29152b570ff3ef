use serde_json::{json, Value};

use super::common::*;
use crate::rules::domain::{
    ComparisonOperator, CompoundCondition, ConditionNode, LogicOperator, SufficiencyLevel,
};
use crate::rules::{
    EngagementCounters, EvaluationError, ReviewContext, RuleContext, RuleExecutor,
    FixScoreContext, DEFAULT_CONFIDENCE_REASON, DEFAULT_SUFFICIENCY_REASON,
};

#[test]
fn short_review_is_weighted_as_vague() {
    let executor = RuleExecutor::new(rule_set(
        vec![confidence_rule("vague", 70, short_content(20), 0.7, "VAGUE_REVIEW")],
        Vec::new(),
    ));

    let outcome = executor
        .evaluate_confidence(&review("Nice!"))
        .expect("confidence evaluates");

    assert_eq!(outcome.score, 0.7);
    assert_eq!(outcome.reason_code, "VAGUE_REVIEW");
    let applied = outcome.explanation.applied_rule.expect("rule applied");
    assert_eq!(applied.reason_code, "VAGUE_REVIEW");
    assert_eq!(applied.matched_conditions[0].actual, Some(json!(5)));
    assert!(!outcome.explanation.used_default);
}

#[test]
fn higher_priority_match_wins() {
    let executor = RuleExecutor::new(rule_set(
        vec![
            confidence_rule("low", 10, short_content(50), 0.8, "LOW"),
            confidence_rule("high", 90, short_content(50), 0.2, "HIGH"),
        ],
        Vec::new(),
    ));

    let outcome = executor
        .evaluate_confidence(&review("tiny"))
        .expect("confidence evaluates");

    assert_eq!(outcome.score, 0.2);
    let ids: Vec<&str> = outcome
        .explanation
        .matches
        .iter()
        .map(|m| m.rule_id.as_str())
        .collect();
    assert_eq!(ids, vec!["high", "low"]);
    assert_eq!(
        outcome.explanation.applied_rule.map(|rule| rule.rule_id),
        Some("high".to_string())
    );
}

#[test]
fn equal_priorities_keep_authoring_order() {
    let executor = RuleExecutor::new(rule_set(
        vec![
            confidence_rule("first", 50, short_content(50), 0.3, "FIRST"),
            confidence_rule("second", 50, short_content(50), 0.6, "SECOND"),
        ],
        Vec::new(),
    ));

    let outcome = executor
        .evaluate_confidence(&review("tiny"))
        .expect("confidence evaluates");

    assert_eq!(outcome.reason_code, "FIRST");
    assert_eq!(outcome.explanation.matches[1].rule_id, "second");
}

#[test]
fn disabled_rules_are_not_considered() {
    let executor = RuleExecutor::new(rule_set(
        vec![
            confidence_rule("off", 100, short_content(50), 0.1, "OFF").disabled(),
            confidence_rule("on", 10, short_content(50), 0.5, "ON"),
            confidence_rule("miss", 5, short_content(1), 0.5, "MISS"),
        ],
        Vec::new(),
    ));

    let outcome = executor
        .evaluate_confidence(&review("tiny"))
        .expect("confidence evaluates");

    assert_eq!(outcome.explanation.rules_evaluated, 2);
    assert!(outcome
        .explanation
        .matches
        .iter()
        .all(|m| m.rule_id != "off"));
    assert_eq!(outcome.reason_code, "ON");
}

#[test]
fn falls_back_to_default_weight_when_nothing_matches() {
    let executor = RuleExecutor::new(rule_set(
        vec![confidence_rule("vague", 70, short_content(20), 0.7, "VAGUE_REVIEW")],
        Vec::new(),
    ));

    let outcome = executor
        .evaluate_confidence(&review(
            "The waiter remembered our order from last week and the pasta was perfect.",
        ))
        .expect("confidence evaluates");

    assert!(outcome.explanation.used_default);
    assert!(outcome.explanation.applied_rule.is_none());
    assert!(outcome.explanation.matches.is_empty());
    assert_eq!(outcome.score, 0.9);
    assert_eq!(outcome.reason_code, DEFAULT_CONFIDENCE_REASON);
}

#[test]
fn uncovered_sample_size_uses_default_sufficiency() {
    let executor = RuleExecutor::new(rule_set(
        Vec::new(),
        vec![
            sufficiency_rule(
                "plenty",
                50,
                leaf("totalReviews", ComparisonOperator::Gte, json!(10)),
                SufficiencyLevel::High,
                0.9,
                "PLENTY",
            ),
            sufficiency_rule(
                "scarce",
                40,
                leaf("totalReviews", ComparisonOperator::Lt, json!(5)),
                SufficiencyLevel::Low,
                0.3,
                "SCARCE",
            ),
        ],
    ));

    let outcome = executor
        .evaluate_sufficiency(&fix_score(3, 4))
        .expect("sufficiency evaluates");

    assert!(outcome.explanation.used_default);
    assert_eq!(outcome.level, SufficiencyLevel::Medium);
    assert_eq!(outcome.confidence, 0.7);
    assert_eq!(outcome.reason_code, DEFAULT_SUFFICIENCY_REASON);
    assert_eq!(outcome.explanation.rules_evaluated, 2);
}

#[test]
fn sufficiency_rule_sets_level_and_confidence() {
    let executor = RuleExecutor::new(rule_set(
        Vec::new(),
        vec![sufficiency_rule(
            "plenty",
            50,
            leaf("totalReviews", ComparisonOperator::Gte, json!(10)),
            SufficiencyLevel::High,
            0.9,
            "PLENTY",
        )],
    ));

    let outcome = executor
        .evaluate_sufficiency(&fix_score(6, 6))
        .expect("sufficiency evaluates");

    assert_eq!(outcome.level, SufficiencyLevel::High);
    assert_eq!(outcome.confidence, 0.9);
    assert_eq!(outcome.reason_code, "PLENTY");
}

#[test]
fn malformed_not_fails_the_evaluation() {
    let broken = ConditionNode::Compound(CompoundCondition {
        logic: LogicOperator::Not,
        conditions: vec![short_content(10), short_content(20)],
    });
    let executor = RuleExecutor::new(rule_set(
        vec![confidence_rule("broken", 10, broken, 0.5, "BROKEN")],
        Vec::new(),
    ));

    let result = executor.evaluate_confidence(&review("tiny"));

    assert_eq!(result, Err(EvaluationError::ConditionArity { found: 2 }));
}

#[test]
fn explanation_lists_leaves_matched_inside_nested_logic() {
    let tree = ConditionNode::all(vec![
        leaf("sourceType", ComparisonOperator::Eq, json!("GOOGLE")),
        ConditionNode::any(vec![
            leaf("engagement.helpfulCount", ComparisonOperator::Gte, json!(2)),
            leaf("rating", ComparisonOperator::In, json!([1, 5])),
        ]),
    ]);
    let executor = RuleExecutor::new(rule_set(
        vec![confidence_rule("nested", 10, tree, 0.8, "NESTED")],
        Vec::new(),
    ));
    let mut context = review("Service was quick").with_rating(5.0);
    context.engagement.helpful_count = 1;

    let outcome = executor
        .evaluate_confidence(&context)
        .expect("confidence evaluates");

    let applied = outcome.explanation.applied_rule.expect("nested rule applies");
    let fields: Vec<&str> = applied
        .matched_conditions
        .iter()
        .map(|condition| condition.field.as_str())
        .collect();
    assert_eq!(fields, vec!["sourceType", "rating"]);
    assert_eq!(applied.matched_conditions[1].actual, Some(json!(5.0)));
}

#[test]
fn summary_mentions_applied_reason() {
    let executor = RuleExecutor::new(rule_set(
        vec![confidence_rule("vague", 70, short_content(20), 0.7, "VAGUE_REVIEW")],
        Vec::new(),
    ));

    let applied = executor
        .evaluate_confidence(&review("ok"))
        .expect("confidence evaluates");
    let fallback = executor
        .evaluate_confidence(&review("A thorough account of a lovely evening out."))
        .expect("confidence evaluates");

    assert!(applied.explanation.summary().contains("VAGUE_REVIEW"));
    assert!(fallback.explanation.summary().contains("default applied"));
}

#[test]
fn context_serialization_stays_within_field_whitelist() {
    let mut context = ReviewContext::new("Great", "GOOGLE")
        .with_rating(4.0)
        .with_duplicate_similarity(0.1)
        .with_language("en");
    context.sentiment_score = Some(0.4);
    context.author_review_count = Some(3);
    context.review_age_days = Some(12);
    context.engagement = EngagementCounters {
        helpful_count: 1,
        report_count: 0,
        photo_count: 2,
    };
    let fix = FixScoreContext::new(4, 6, 3.9, 4.3, 30, 45).with_variances(0.5, 0.7);

    for path in flattened_paths(&context.document().expect("review serializes"), "") {
        assert!(ReviewContext::is_known_field(&path), "unlisted field {path}");
    }
    for path in flattened_paths(&fix.document().expect("fix score serializes"), "") {
        assert!(FixScoreContext::is_known_field(&path), "unlisted field {path}");
    }
}

fn flattened_paths(value: &Value, prefix: &str) -> Vec<String> {
    let mut paths = Vec::new();
    if let Value::Object(map) = value {
        for (key, child) in map {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}.{key}")
            };
            paths.extend(flattened_paths(child, &path));
            paths.push(path);
        }
    }
    paths
}

#[test]
fn huge_window_counts_saturate_the_total() {
    let context = FixScoreContext::new(u32::MAX, 10, 3.0, 4.0, 30, 30);
    assert_eq!(context.total_reviews, u32::MAX);

    let executor = RuleExecutor::new(rule_set(
        Vec::new(),
        vec![sufficiency_rule(
            "large",
            50,
            leaf("totalReviews", ComparisonOperator::Gte, json!(10)),
            SufficiencyLevel::High,
            0.9,
            "LARGE_SAMPLE",
        )],
    ));
    let outcome = executor.evaluate_sufficiency(&context).expect("evaluates");
    assert_eq!(outcome.level, SufficiencyLevel::High);
}
