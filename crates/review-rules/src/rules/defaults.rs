use serde_json::json;

use super::domain::{
    ComparisonOperator as Op, ConditionNode, ConfidenceAction, ConfidenceRule, DefaultSufficiency,
    Rule, RuleSet, SufficiencyAction, SufficiencyLevel, SufficiencyRule,
};

/// Version label of the built-in rule set.
pub const DEFAULT_RULE_SET_VERSION: &str = "builtin-1.0.0";

/// Rule set used when no persisted version exists or a run was pinned to the built-in rules.
pub fn default_rule_set() -> RuleSet {
    RuleSet {
        version: DEFAULT_RULE_SET_VERSION.to_string(),
        confidence_rules: confidence_rules(),
        sufficiency_rules: sufficiency_rules(),
        default_confidence_weight: 0.9,
        default_sufficiency: DefaultSufficiency {
            level: SufficiencyLevel::Medium,
            confidence: 0.6,
        },
    }
}

fn weight(weight: f64, reason_code: &str, reason_message: &str) -> ConfidenceAction {
    ConfidenceAction {
        weight,
        reason_code: reason_code.to_string(),
        reason_message: Some(reason_message.to_string()),
    }
}

fn sufficiency(
    level: SufficiencyLevel,
    confidence: f64,
    reason_code: &str,
    reason_message: &str,
) -> SufficiencyAction {
    SufficiencyAction {
        level,
        confidence,
        reason_code: reason_code.to_string(),
        reason_message: Some(reason_message.to_string()),
    }
}

fn confidence_rules() -> Vec<ConfidenceRule> {
    vec![
        Rule::new(
            "duplicate-content",
            "Near-duplicate content",
            100,
            ConditionNode::leaf("duplicateSimilarity", Op::Gte, json!(0.9)),
            weight(
                0.1,
                "DUPLICATE_CONTENT",
                "Review text is a near-duplicate of another review",
            ),
        ),
        Rule::new(
            "promotional-link",
            "Promotional link",
            90,
            ConditionNode::leaf("content", Op::Matches, json!(r"(https?://|www\.)\S+")),
            weight(0.3, "PROMOTIONAL_LINK", "Review links to an external site"),
        ),
        Rule::new(
            "reported-by-readers",
            "Reported by readers",
            85,
            ConditionNode::leaf("engagement.reportCount", Op::Gte, json!(3)),
            weight(0.4, "REPORTED_REVIEW", "Review was reported by several readers"),
        ),
        Rule::new(
            "extreme-rating-short-text",
            "Extreme rating with little text",
            75,
            ConditionNode::all(vec![
                ConditionNode::leaf("rating", Op::In, json!([1, 5])),
                ConditionNode::leaf("contentLength", Op::Lt, json!(40)),
            ]),
            weight(
                0.6,
                "EXTREME_RATING_SHORT_TEXT",
                "Extreme star rating with little supporting text",
            ),
        ),
        Rule::new(
            "vague-review",
            "Vague review",
            70,
            ConditionNode::leaf("contentLength", Op::Lt, json!(20)),
            weight(0.7, "VAGUE_REVIEW", "Review is too short to be specific"),
        ),
        Rule::new(
            "direct-feedback",
            "Direct customer feedback",
            65,
            ConditionNode::all(vec![
                ConditionNode::leaf("sourceType", Op::Eq, json!("QR_FEEDBACK")),
                ConditionNode::negate(ConditionNode::leaf("contentLength", Op::Lt, json!(20))),
            ]),
            weight(
                1.0,
                "DIRECT_FEEDBACK",
                "Feedback submitted through a verified visit channel",
            ),
        ),
        Rule::new(
            "detailed-review",
            "Detailed review",
            50,
            ConditionNode::all(vec![
                ConditionNode::leaf("contentLength", Op::Gte, json!(200)),
                ConditionNode::any(vec![
                    ConditionNode::leaf("engagement.helpfulCount", Op::Gte, json!(1)),
                    ConditionNode::leaf("engagement.photoCount", Op::Gte, json!(1)),
                ]),
            ]),
            weight(1.0, "DETAILED_REVIEW", "Long review corroborated by readers or photos"),
        ),
    ]
}

fn sufficiency_rules() -> Vec<SufficiencyRule> {
    vec![
        Rule::new(
            "no-post-data",
            "No reviews after the fix",
            100,
            ConditionNode::leaf("reviewCountPost", Op::Lt, json!(1)),
            sufficiency(
                SufficiencyLevel::Insufficient,
                0.0,
                "NO_POST_DATA",
                "No reviews were collected after the change",
            ),
        ),
        Rule::new(
            "tiny-sample",
            "Tiny sample",
            90,
            ConditionNode::leaf("totalReviews", Op::Lt, json!(5)),
            sufficiency(
                SufficiencyLevel::Insufficient,
                0.2,
                "INSUFFICIENT_SAMPLE",
                "Fewer than five reviews across both windows",
            ),
        ),
        Rule::new(
            "short-post-window",
            "Short post window",
            80,
            ConditionNode::leaf("postWindowDays", Op::Lt, json!(14)),
            sufficiency(
                SufficiencyLevel::Low,
                0.4,
                "SHORT_POST_WINDOW",
                "Post-change window is shorter than two weeks",
            ),
        ),
        Rule::new(
            "high-variance",
            "High post variance",
            70,
            ConditionNode::leaf("variancePost", Op::Gt, json!(1.5)),
            sufficiency(
                SufficiencyLevel::Low,
                0.45,
                "HIGH_VARIANCE",
                "Ratings after the change are too spread out",
            ),
        ),
        Rule::new(
            "unbalanced-windows",
            "Unbalanced windows",
            60,
            ConditionNode::any(vec![
                ConditionNode::leaf("reviewCountPre", Op::Lt, json!(5)),
                ConditionNode::leaf("reviewCountPost", Op::Lt, json!(5)),
            ]),
            sufficiency(
                SufficiencyLevel::Low,
                0.5,
                "LOW_SAMPLE",
                "One of the windows has fewer than five reviews",
            ),
        ),
        Rule::new(
            "strong-sample",
            "Strong sample",
            50,
            ConditionNode::all(vec![
                ConditionNode::leaf("reviewCountPre", Op::Gte, json!(15)),
                ConditionNode::leaf("reviewCountPost", Op::Gte, json!(15)),
                ConditionNode::leaf("postWindowDays", Op::Gte, json!(30)),
            ]),
            sufficiency(
                SufficiencyLevel::High,
                0.9,
                "STRONG_SAMPLE",
                "Both windows are well populated over at least a month",
            ),
        ),
        Rule::new(
            "adequate-sample",
            "Adequate sample",
            40,
            ConditionNode::leaf("totalReviews", Op::Gte, json!(10)),
            sufficiency(
                SufficiencyLevel::Medium,
                0.7,
                "ADEQUATE_SAMPLE",
                "At least ten reviews across both windows",
            ),
        ),
    ]
}
