use std::fs;
use std::path::Path;
use std::sync::Arc;

use review_rules::versioning::TracingAuditSink;
use review_rules::{AppError, JsonFileRuleSetStore, StoreConfig, VersionService};
use serde::Serialize;
use serde_json::Value;

pub(crate) type FileVersionService =
    VersionService<JsonFileRuleSetStore, JsonFileRuleSetStore, TracingAuditSink>;

/// Version service over the configured JSON store, plus the actor recorded on changes.
pub(crate) struct RuleTooling {
    pub(crate) service: FileVersionService,
    pub(crate) actor: String,
}

impl RuleTooling {
    pub(crate) fn open(config: &StoreConfig) -> Result<Self, AppError> {
        // Versions and run pins share one file, so both roles use the same store handle.
        let store = Arc::new(JsonFileRuleSetStore::open(&config.path)?);
        let service = VersionService::new(
            config.rule_set_id.clone(),
            store.clone(),
            store,
            Arc::new(TracingAuditSink),
        );

        Ok(Self {
            service,
            actor: config.actor.clone(),
        })
    }
}

pub(crate) fn read_json(path: &Path) -> Result<Value, AppError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
