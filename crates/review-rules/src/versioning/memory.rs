use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{
    Activation, ActivationReceipt, DraftVersion, RuleSetId, RuleSetVersion, RunId, RunPin,
    VersionId, VersionStatus,
};
use super::repository::{RepositoryError, RuleSetVersionRepository, ScoreRunRepository};
use super::state::StoreState;

/// Process-local store for embedding and tests. Every operation holds the store mutex for its
/// whole duration, so activation is a single critical section.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRuleSetStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryRuleSetStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("rule set store mutex poisoned".to_string()))
    }
}

impl RuleSetVersionRepository for InMemoryRuleSetStore {
    fn insert_draft(&self, draft: DraftVersion) -> Result<RuleSetVersion, RepositoryError> {
        self.lock()?.insert_draft(draft)
    }

    fn fetch(&self, id: &VersionId) -> Result<Option<RuleSetVersion>, RepositoryError> {
        Ok(self.lock()?.fetch(id))
    }

    fn active(&self, rule_set_id: &RuleSetId) -> Result<Option<RuleSetVersion>, RepositoryError> {
        Ok(self.lock()?.active(rule_set_id))
    }

    fn list(
        &self,
        rule_set_id: &RuleSetId,
        status: Option<VersionStatus>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<RuleSetVersion>, RepositoryError> {
        Ok(self.lock()?.list(rule_set_id, status, limit, offset))
    }

    fn activate(
        &self,
        rule_set_id: &RuleSetId,
        id: &VersionId,
        activation: Activation,
    ) -> Result<ActivationReceipt, RepositoryError> {
        self.lock()?.activate(rule_set_id, id, activation)
    }
}

impl ScoreRunRepository for InMemoryRuleSetStore {
    fn pin_rule_set_version(
        &self,
        run_id: &RunId,
        version_id: Option<&VersionId>,
    ) -> Result<(), RepositoryError> {
        self.lock()?.pin_run(run_id, version_id);
        Ok(())
    }

    fn rule_set_pin(&self, run_id: &RunId) -> Result<RunPin, RepositoryError> {
        Ok(self.lock()?.run_pin(run_id))
    }
}
