//! Leaf condition evaluation.
//!
//! Comparisons never fail: mismatched operand types, missing fields and malformed patterns all
//! resolve to "no match".

use regex::RegexBuilder;
use serde_json::Value;

use super::super::domain::{ComparisonOperator, RuleCondition};

/// Result of evaluating one leaf against a context document.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionResult {
    pub matched: bool,
    pub actual: Option<Value>,
}

/// Walks a dotted path through nested objects. Any absent or non-object segment yields `None`.
pub fn resolve_path<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }

    path.split('.')
        .try_fold(document, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            _ => None,
        })
}

pub fn evaluate_condition(condition: &RuleCondition, document: &Value) -> ConditionResult {
    let actual = resolve_path(document, &condition.field);
    let matched = compare(actual, condition.operator, &condition.value);

    ConditionResult {
        matched,
        actual: actual.cloned(),
    }
}

fn compare(actual: Option<&Value>, operator: ComparisonOperator, expected: &Value) -> bool {
    match operator {
        ComparisonOperator::Eq => actual.is_some_and(|value| strict_eq(value, expected)),
        ComparisonOperator::Neq => !actual.is_some_and(|value| strict_eq(value, expected)),
        ComparisonOperator::Gt => compare_numbers(actual, expected, |a, b| a > b),
        ComparisonOperator::Gte => compare_numbers(actual, expected, |a, b| a >= b),
        ComparisonOperator::Lt => compare_numbers(actual, expected, |a, b| a < b),
        ComparisonOperator::Lte => compare_numbers(actual, expected, |a, b| a <= b),
        ComparisonOperator::In => match expected {
            Value::Array(candidates) => actual.is_some_and(|value| is_member(value, candidates)),
            _ => false,
        },
        ComparisonOperator::Nin => match expected {
            Value::Array(candidates) => !actual.is_some_and(|value| is_member(value, candidates)),
            _ => false,
        },
        ComparisonOperator::Contains => {
            compare_strings(actual, expected, |haystack, needle| haystack.contains(needle))
        }
        ComparisonOperator::StartsWith => {
            compare_strings(actual, expected, |haystack, prefix| haystack.starts_with(prefix))
        }
        ComparisonOperator::EndsWith => {
            compare_strings(actual, expected, |haystack, suffix| haystack.ends_with(suffix))
        }
        ComparisonOperator::Matches => match (actual, expected) {
            (Some(Value::String(text)), Value::String(pattern)) => {
                match RegexBuilder::new(pattern).case_insensitive(true).build() {
                    Ok(regex) => regex.is_match(text),
                    Err(_) => false,
                }
            }
            _ => false,
        },
    }
}

/// Equality without coercion. Numbers compare by value so `5` and `5.0` are equal.
fn strict_eq(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(af), Some(bf)) => af == bf,
            _ => a == b,
        },
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| strict_eq(x, y))
        }
        _ => actual == expected,
    }
}

fn is_member(value: &Value, candidates: &[Value]) -> bool {
    candidates
        .iter()
        .any(|candidate| strict_eq(value, candidate))
}

fn compare_numbers(actual: Option<&Value>, expected: &Value, cmp: fn(f64, f64) -> bool) -> bool {
    match (actual.and_then(Value::as_f64), expected.as_f64()) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => false,
    }
}

fn compare_strings(
    actual: Option<&Value>,
    expected: &Value,
    cmp: fn(&str, &str) -> bool,
) -> bool {
    match (actual, expected) {
        (Some(Value::String(a)), Value::String(b)) => cmp(&a.to_lowercase(), &b.to_lowercase()),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn check(document: &Value, field: &str, operator: ComparisonOperator, value: Value) -> bool {
        evaluate_condition(&RuleCondition::new(field, operator, value), document).matched
    }

    #[test]
    fn resolves_nested_paths() {
        let doc = json!({"engagement": {"helpfulCount": 4}, "content": "ok"});

        assert_eq!(resolve_path(&doc, "engagement.helpfulCount"), Some(&json!(4)));
        assert_eq!(resolve_path(&doc, "engagement.missing"), None);
        assert_eq!(resolve_path(&doc, "content.length"), None);
        assert_eq!(resolve_path(&doc, ""), None);
    }

    #[test]
    fn equality_does_not_coerce_types() {
        let doc = json!({"rating": 5, "sourceType": "GOOGLE"});

        assert!(check(&doc, "rating", ComparisonOperator::Eq, json!(5)));
        assert!(check(&doc, "rating", ComparisonOperator::Eq, json!(5.0)));
        assert!(!check(&doc, "rating", ComparisonOperator::Eq, json!("5")));
        assert!(check(&doc, "sourceType", ComparisonOperator::Neq, json!("google")));
    }

    #[test]
    fn missing_fields_never_equal_anything() {
        let doc = json!({"content": "fine"});

        assert!(!check(&doc, "rating", ComparisonOperator::Eq, json!(null)));
        assert!(check(&doc, "rating", ComparisonOperator::Neq, json!(3)));
        assert!(!check(&doc, "rating", ComparisonOperator::Gt, json!(0)));
    }

    #[test]
    fn ordering_requires_numeric_operands() {
        let doc = json!({"contentLength": 12, "content": "12"});

        assert!(check(&doc, "contentLength", ComparisonOperator::Lt, json!(20)));
        assert!(check(&doc, "contentLength", ComparisonOperator::Lte, json!(12)));
        assert!(check(&doc, "contentLength", ComparisonOperator::Gte, json!(12.0)));
        assert!(!check(&doc, "contentLength", ComparisonOperator::Gt, json!(12)));
        assert!(!check(&doc, "content", ComparisonOperator::Gt, json!(1)));
        assert!(!check(&doc, "contentLength", ComparisonOperator::Gt, json!("1")));
    }

    #[test]
    fn membership_requires_array_value() {
        let doc = json!({"detectedLanguage": "en"});

        assert!(check(&doc, "detectedLanguage", ComparisonOperator::In, json!(["en", "af"])));
        assert!(!check(&doc, "detectedLanguage", ComparisonOperator::Nin, json!(["en"])));
        assert!(check(&doc, "detectedLanguage", ComparisonOperator::Nin, json!(["fr"])));
        assert!(!check(&doc, "detectedLanguage", ComparisonOperator::In, json!("en")));
        assert!(!check(&doc, "detectedLanguage", ComparisonOperator::Nin, json!("fr")));
        assert!(check(&doc, "rating", ComparisonOperator::Nin, json!([1, 2])));
    }

    #[test]
    fn string_operators_ignore_case() {
        let doc = json!({"content": "Great Service, terrible parking"});

        assert!(check(&doc, "content", ComparisonOperator::Contains, json!("SERVICE")));
        assert!(check(&doc, "content", ComparisonOperator::StartsWith, json!("great")));
        assert!(check(&doc, "content", ComparisonOperator::EndsWith, json!("Parking")));
        assert!(!check(&doc, "content", ComparisonOperator::Contains, json!(5)));
    }

    #[test]
    fn invalid_patterns_do_not_match() {
        let doc = json!({"content": "Visit www.example.com for DEALS"});

        assert!(check(&doc, "content", ComparisonOperator::Matches, json!("deals$")));
        assert!(!check(&doc, "content", ComparisonOperator::Matches, json!("(unclosed")));
        assert!(!check(&doc, "content", ComparisonOperator::Matches, json!(42)));
    }

    #[test]
    fn reports_actual_value() {
        let doc = json!({"contentLength": 5});
        let result = evaluate_condition(
            &RuleCondition::new("contentLength", ComparisonOperator::Lt, json!(20)),
            &doc,
        );

        assert!(result.matched);
        assert_eq!(result.actual, Some(json!(5)));
    }
}
