use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{
    Activation, DraftVersion, RuleSetId, RuleSetVersion, RunId, RunPin, VersionId, VersionStatus,
};
use super::repository::{
    AuditAction, AuditEvent, AuditSink, RepositoryError, RuleSetVersionRepository,
    ScoreRunRepository,
};
use crate::rules::{default_rule_set, validate_rule_set, RuleExecutor, RuleSet, ValidationReport};

const SEED_VERSION_NAME: &str = "Built-in defaults";

/// Service owning the rule set version lifecycle and run-to-rules binding for one rule set.
pub struct VersionService<V, P, A> {
    rule_set_id: RuleSetId,
    versions: Arc<V>,
    runs: Arc<P>,
    audit: Arc<A>,
}

/// Where the rules bound to a run came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutorSource {
    PinnedVersion,
    PinnedDefault,
    ActiveVersion,
    BuiltInDefault,
}

/// Executor together with the version it was built from; `version_id` is `None` for the
/// built-in rules.
#[derive(Debug, Clone)]
pub struct BoundExecutor {
    pub executor: RuleExecutor,
    pub version_id: Option<VersionId>,
    pub source: ExecutorSource,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeedOutcome {
    pub version: RuleSetVersion,
    pub created: bool,
}

impl<V, P, A> VersionService<V, P, A>
where
    V: RuleSetVersionRepository + 'static,
    P: ScoreRunRepository + 'static,
    A: AuditSink + 'static,
{
    pub fn new(rule_set_id: RuleSetId, versions: Arc<V>, runs: Arc<P>, audit: Arc<A>) -> Self {
        Self {
            rule_set_id,
            versions,
            runs,
            audit,
        }
    }

    pub fn rule_set_id(&self) -> &RuleSetId {
        &self.rule_set_id
    }

    /// Validate and persist a new DRAFT version.
    pub fn create_version(
        &self,
        rules: RuleSet,
        name: Option<String>,
        description: Option<String>,
        created_by_id: &str,
    ) -> Result<RuleSetVersion, VersionServiceError> {
        let report = validate_rule_set(&rules);
        if !report.valid {
            return Err(VersionServiceError::Validation(report));
        }
        for warning in &report.warnings {
            warn!(rule_set = %self.rule_set_id, %warning, "rule set validation warning");
        }

        let draft = DraftVersion {
            version_id: VersionId::generate(),
            rule_set_id: self.rule_set_id.clone(),
            name,
            description,
            rules,
            created_by_id: created_by_id.to_string(),
            created_at: Utc::now(),
        };
        let version = self.versions.insert_draft(draft)?;

        info!(
            rule_set = %self.rule_set_id,
            version = %version.version_id,
            number = version.version_number,
            "rule set version created"
        );
        let mut details = BTreeMap::new();
        details.insert(
            "versionNumber".to_string(),
            version.version_number.to_string(),
        );
        details.insert("rulesVersion".to_string(), version.rules.version.clone());
        self.audit(
            AuditAction::VersionCreated,
            Some(&version.version_id),
            Some(created_by_id),
            details,
        );

        Ok(version)
    }

    /// Make a version the single ACTIVE one of its rule set, archiving the previous one.
    pub fn activate_version(
        &self,
        version_id: &VersionId,
        activated_by_id: &str,
    ) -> Result<RuleSetVersion, VersionServiceError> {
        let activation = Activation {
            activated_by_id: activated_by_id.to_string(),
            activated_at: Utc::now(),
        };
        let receipt = self
            .versions
            .activate(&self.rule_set_id, version_id, activation)
            .map_err(|err| match err {
                RepositoryError::NotFound => {
                    VersionServiceError::VersionNotFound(version_id.clone())
                }
                RepositoryError::Conflict => {
                    VersionServiceError::AlreadyActive(version_id.clone())
                }
                other => VersionServiceError::Repository(other),
            })?;

        info!(
            rule_set = %self.rule_set_id,
            version = %version_id,
            archived = receipt.archived.len(),
            "rule set version activated"
        );
        for archived in &receipt.archived {
            let mut details = BTreeMap::new();
            details.insert("replacedBy".to_string(), version_id.to_string());
            self.audit(
                AuditAction::VersionArchived,
                Some(archived),
                Some(activated_by_id),
                details,
            );
        }
        self.audit(
            AuditAction::VersionActivated,
            Some(version_id),
            Some(activated_by_id),
            BTreeMap::new(),
        );

        Ok(receipt.activated)
    }

    pub fn get_active_version(&self) -> Result<Option<RuleSetVersion>, VersionServiceError> {
        Ok(self.versions.active(&self.rule_set_id)?)
    }

    pub fn get_version(
        &self,
        version_id: &VersionId,
    ) -> Result<RuleSetVersion, VersionServiceError> {
        self.scoped_version(version_id)?
            .ok_or_else(|| VersionServiceError::VersionNotFound(version_id.clone()))
    }

    /// Versions of this rule set, newest first.
    pub fn list_versions(
        &self,
        status: Option<VersionStatus>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<RuleSetVersion>, VersionServiceError> {
        Ok(self
            .versions
            .list(&self.rule_set_id, status, limit, offset)?)
    }

    /// Record on a run exactly which rules it is computed with. `None` records the built-in
    /// default rules.
    pub fn pin_version_to_run(
        &self,
        run_id: &RunId,
        version_id: Option<&VersionId>,
    ) -> Result<RunPin, VersionServiceError> {
        if let Some(version_id) = version_id {
            if self.scoped_version(version_id)?.is_none() {
                return Err(VersionServiceError::VersionNotFound(version_id.clone()));
            }
        }

        self.runs.pin_rule_set_version(run_id, version_id)?;

        let pin = match version_id {
            Some(version_id) => RunPin::Version(version_id.clone()),
            None => RunPin::BuiltInDefault,
        };
        info!(rule_set = %self.rule_set_id, run = %run_id, ?pin, "run pinned to rule set");

        let mut details = BTreeMap::new();
        details.insert("runId".to_string(), run_id.to_string());
        self.audit(AuditAction::RunPinned, version_id, None, details);

        Ok(pin)
    }

    /// Resolve the rules a run is computed with: its pinned version, the built-in rules when it
    /// was pinned to them, the active version, or finally the built-in rules.
    pub fn get_executor_for_run(
        &self,
        run_id: &RunId,
    ) -> Result<BoundExecutor, VersionServiceError> {
        match self.runs.rule_set_pin(run_id)? {
            RunPin::Version(version_id) => match self.versions.fetch(&version_id)? {
                Some(version) => {
                    return Ok(BoundExecutor {
                        executor: RuleExecutor::new(version.rules),
                        version_id: Some(version.version_id),
                        source: ExecutorSource::PinnedVersion,
                    })
                }
                None => warn!(
                    run = %run_id,
                    version = %version_id,
                    "pinned rule set version is missing; falling back"
                ),
            },
            RunPin::BuiltInDefault => {
                return Ok(BoundExecutor {
                    executor: RuleExecutor::new(default_rule_set()),
                    version_id: None,
                    source: ExecutorSource::PinnedDefault,
                })
            }
            RunPin::Unset => {}
        }

        if let Some(version) = self.versions.active(&self.rule_set_id)? {
            return Ok(BoundExecutor {
                executor: RuleExecutor::new(version.rules),
                version_id: Some(version.version_id),
                source: ExecutorSource::ActiveVersion,
            });
        }

        Ok(BoundExecutor {
            executor: RuleExecutor::new(default_rule_set()),
            version_id: None,
            source: ExecutorSource::BuiltInDefault,
        })
    }

    /// Persist and activate the built-in rules when the rule set has no versions yet.
    pub fn seed_initial_rule_set(
        &self,
        created_by_id: &str,
    ) -> Result<SeedOutcome, VersionServiceError> {
        if let Some(active) = self.versions.active(&self.rule_set_id)? {
            return Ok(SeedOutcome {
                version: active,
                created: false,
            });
        }
        if let Some(latest) = self
            .versions
            .list(&self.rule_set_id, None, 1, 0)?
            .into_iter()
            .next()
        {
            return Ok(SeedOutcome {
                version: latest,
                created: false,
            });
        }

        let draft = self.create_version(
            default_rule_set(),
            Some(SEED_VERSION_NAME.to_string()),
            Some("Seeded from the built-in rule set".to_string()),
            created_by_id,
        )?;
        let version = self.activate_version(&draft.version_id, created_by_id)?;

        Ok(SeedOutcome {
            version,
            created: true,
        })
    }

    fn scoped_version(
        &self,
        version_id: &VersionId,
    ) -> Result<Option<RuleSetVersion>, RepositoryError> {
        Ok(self
            .versions
            .fetch(version_id)?
            .filter(|version| version.rule_set_id == self.rule_set_id))
    }

    fn audit(
        &self,
        action: AuditAction,
        version_id: Option<&VersionId>,
        actor_id: Option<&str>,
        details: BTreeMap<String, String>,
    ) {
        let event = AuditEvent {
            action,
            rule_set_id: self.rule_set_id.clone(),
            version_id: version_id.cloned(),
            actor_id: actor_id.map(str::to_string),
            occurred_at: Utc::now(),
            details,
        };
        if let Err(err) = self.audit.record(event) {
            warn!(rule_set = %self.rule_set_id, ?action, error = %err, "audit event dropped");
        }
    }
}

/// Error raised by the version service.
#[derive(Debug, thiserror::Error)]
pub enum VersionServiceError {
    #[error("rule set failed validation: {0}")]
    Validation(ValidationReport),
    #[error("rule set version {0} not found")]
    VersionNotFound(VersionId),
    #[error("rule set version {0} is already active")]
    AlreadyActive(VersionId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
