use std::env;
use std::fmt;
use std::path::PathBuf;

use crate::versioning::RuleSetId;

/// Distinguishes runtime behavior for different stages of the tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the rule engine tooling.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub store: StoreConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let path = non_empty("RULES_STORE_PATH", "data/rule-sets.json")?;
        let rule_set_id = non_empty("RULES_RULE_SET_ID", "review-scoring")?;
        let actor = non_empty("RULES_ACTOR", "system")?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            store: StoreConfig {
                path: PathBuf::from(path),
                rule_set_id: RuleSetId(rule_set_id),
                actor,
            },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

fn non_empty(key: &'static str, default: &str) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(value) if value.trim().is_empty() => Err(ConfigError::EmptyValue { key }),
        Ok(value) => Ok(value.trim().to_string()),
        Err(env::VarError::NotPresent) => Ok(default.to_string()),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::NotUnicode { key }),
    }
}

/// Where rule set versions live and who the tooling acts as.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub path: PathBuf,
    pub rule_set_id: RuleSetId,
    /// Recorded as `createdById` / `activatedById` on lifecycle operations.
    pub actor: String,
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    EmptyValue { key: &'static str },
    NotUnicode { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyValue { key } => write!(f, "{key} must not be empty when set"),
            ConfigError::NotUnicode { key } => write!(f, "{key} must be valid unicode"),
        }
    }
}

impl std::error::Error for ConfigError {}
