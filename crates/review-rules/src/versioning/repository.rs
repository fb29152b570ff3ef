use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{
    Activation, ActivationReceipt, DraftVersion, RuleSetId, RuleSetVersion, RunId, RunPin,
    VersionId, VersionStatus,
};

/// Storage abstraction for rule set versions.
///
/// `activate` must archive the currently active versions and activate the target as one
/// atomic unit so that at most one version per rule set is ever observed as ACTIVE.
pub trait RuleSetVersionRepository: Send + Sync {
    /// Persists a draft, assigning the next version number within its rule set.
    fn insert_draft(&self, draft: DraftVersion) -> Result<RuleSetVersion, RepositoryError>;
    fn fetch(&self, id: &VersionId) -> Result<Option<RuleSetVersion>, RepositoryError>;
    fn active(&self, rule_set_id: &RuleSetId) -> Result<Option<RuleSetVersion>, RepositoryError>;
    /// Versions of a rule set, newest first.
    fn list(
        &self,
        rule_set_id: &RuleSetId,
        status: Option<VersionStatus>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<RuleSetVersion>, RepositoryError>;
    /// Fails with `NotFound` when the version does not belong to `rule_set_id` and with
    /// `Conflict` when it is already active.
    fn activate(
        &self,
        rule_set_id: &RuleSetId,
        id: &VersionId,
        activation: Activation,
    ) -> Result<ActivationReceipt, RepositoryError>;
}

/// Access to the rule set column of score run records owned by the scoring pipeline.
pub trait ScoreRunRepository: Send + Sync {
    /// Writes the column; `None` records that the built-in default rules were used.
    fn pin_rule_set_version(
        &self,
        run_id: &RunId,
        version_id: Option<&VersionId>,
    ) -> Result<(), RepositoryError>;
    fn rule_set_pin(&self, run_id: &RunId) -> Result<RunPin, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record conflicts with its current state")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    #[error("stored data is corrupt: {0}")]
    Corrupt(String),
}

/// Outbound hook receiving version lifecycle events (audit log tables, webhooks, ...).
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent) -> Result<(), AuditError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    VersionCreated,
    VersionActivated,
    VersionArchived,
    RunPinned,
}

/// Audit payload describing one lifecycle change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub action: AuditAction,
    pub rule_set_id: RuleSetId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_id: Option<VersionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub details: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("audit transport unavailable: {0}")]
    Transport(String),
}

/// Audit sink that writes events to the tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) -> Result<(), AuditError> {
        info!(
            target: "audit",
            action = ?event.action,
            rule_set = %event.rule_set_id,
            version = ?event.version_id.as_ref().map(|id| id.0.as_str()),
            actor = ?event.actor_id,
            details = ?event.details,
            "rule set audit event"
        );
        Ok(())
    }
}
