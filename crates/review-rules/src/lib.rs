//! Versioned rule engine deciding how much a review counts (confidence) and whether a
//! before/after score change is backed by enough data (sufficiency).

pub mod config;
pub mod error;
pub mod rules;
pub mod telemetry;
pub mod versioning;

pub use config::{AppConfig, AppEnvironment, ConfigError, StoreConfig, TelemetryConfig};
pub use error::AppError;
pub use rules::{
    default_rule_set, validate_rule_set, validate_rule_set_json, ConfidenceOutcome,
    FixScoreContext, ReviewContext, RuleExecutor, RuleSet, SufficiencyOutcome, ValidationReport,
};
pub use versioning::{
    JsonFileRuleSetStore, RuleSetId, RunId, VersionId, VersionService, VersionServiceError,
};
