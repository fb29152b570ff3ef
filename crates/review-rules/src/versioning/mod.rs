//! Rule set versioning: immutable snapshots, single-active activation, run pinning and storage.

pub mod domain;
pub mod file;
pub mod memory;
pub mod repository;
pub mod service;
mod state;

#[cfg(test)]
mod tests;

pub use domain::{
    Activation, ActivationReceipt, DraftVersion, RuleSetId, RuleSetVersion, RunId, RunPin,
    VersionId, VersionStatus,
};
pub use file::JsonFileRuleSetStore;
pub use memory::InMemoryRuleSetStore;
pub use repository::{
    AuditAction, AuditError, AuditEvent, AuditSink, RepositoryError, RuleSetVersionRepository,
    ScoreRunRepository, TracingAuditSink,
};
pub use service::{BoundExecutor, ExecutorSource, SeedOutcome, VersionService, VersionServiceError};
