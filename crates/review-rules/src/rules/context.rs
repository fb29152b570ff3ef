use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::domain::RuleCategory;

/// Input document a rule category is evaluated against.
///
/// Conditions address the camelCase serialized form of the context by dotted path. `FIELDS`
/// lists every addressable path so rule sets referencing anything else are rejected before
/// they can silently never match.
pub trait RuleContext: Serialize {
    const CATEGORY: RuleCategory;
    const FIELDS: &'static [&'static str];

    fn document(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn is_known_field(path: &str) -> bool {
        Self::FIELDS.contains(&path)
    }
}

/// Returns the whitelisted field paths for a rule category.
pub fn known_fields(category: RuleCategory) -> &'static [&'static str] {
    match category {
        RuleCategory::Confidence => ReviewContext::FIELDS,
        RuleCategory::Sufficiency => FixScoreContext::FIELDS,
    }
}

/// Engagement counters the ingestion pipeline records per review.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementCounters {
    pub helpful_count: u32,
    pub report_count: u32,
    pub photo_count: u32,
}

/// Per-review facts consumed by confidence rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewContext {
    pub content: String,
    pub content_length: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    pub source_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicate_similarity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_review_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_age_days: Option<u32>,
    #[serde(default)]
    pub has_owner_response: bool,
    #[serde(default)]
    pub engagement: EngagementCounters,
}

impl ReviewContext {
    /// Builds a context whose `contentLength` is the character count of `content`.
    pub fn new(content: impl Into<String>, source_type: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            content_length: content.chars().count(),
            content,
            rating: None,
            source_type: source_type.into(),
            duplicate_similarity: None,
            detected_language: None,
            sentiment_score: None,
            author_review_count: None,
            review_age_days: None,
            has_owner_response: false,
            engagement: EngagementCounters::default(),
        }
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn with_duplicate_similarity(mut self, similarity: f64) -> Self {
        self.duplicate_similarity = Some(similarity);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.detected_language = Some(language.into());
        self
    }
}

impl RuleContext for ReviewContext {
    const CATEGORY: RuleCategory = RuleCategory::Confidence;
    const FIELDS: &'static [&'static str] = &[
        "content",
        "contentLength",
        "rating",
        "sourceType",
        "duplicateSimilarity",
        "detectedLanguage",
        "sentimentScore",
        "authorReviewCount",
        "reviewAgeDays",
        "hasOwnerResponse",
        "engagement",
        "engagement.helpfulCount",
        "engagement.reportCount",
        "engagement.photoCount",
    ];
}

/// Before/after aggregates consumed by sufficiency rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixScoreContext {
    pub review_count_pre: u32,
    pub review_count_post: u32,
    pub total_reviews: u32,
    pub score_before: f64,
    pub score_after: f64,
    pub delta_s: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variance_pre: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variance_post: Option<f64>,
    pub pre_window_days: u32,
    pub post_window_days: u32,
}

impl FixScoreContext {
    /// Derives `totalReviews` and `deltaS` from the two measurement windows.
    pub fn new(
        review_count_pre: u32,
        review_count_post: u32,
        score_before: f64,
        score_after: f64,
        pre_window_days: u32,
        post_window_days: u32,
    ) -> Self {
        Self {
            review_count_pre,
            review_count_post,
            total_reviews: review_count_pre.saturating_add(review_count_post),
            score_before,
            score_after,
            delta_s: score_after - score_before,
            variance_pre: None,
            variance_post: None,
            pre_window_days,
            post_window_days,
        }
    }

    pub fn with_variances(mut self, variance_pre: f64, variance_post: f64) -> Self {
        self.variance_pre = Some(variance_pre);
        self.variance_post = Some(variance_post);
        self
    }
}

impl RuleContext for FixScoreContext {
    const CATEGORY: RuleCategory = RuleCategory::Sufficiency;
    const FIELDS: &'static [&'static str] = &[
        "reviewCountPre",
        "reviewCountPost",
        "totalReviews",
        "scoreBefore",
        "scoreAfter",
        "deltaS",
        "variancePre",
        "variancePost",
        "preWindowDays",
        "postWindowDays",
    ];
}
