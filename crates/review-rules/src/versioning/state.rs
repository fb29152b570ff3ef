use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{
    Activation, ActivationReceipt, DraftVersion, RuleSetId, RuleSetVersion, RunId, RunPin,
    VersionId, VersionStatus,
};
use super::repository::RepositoryError;

/// Complete contents of a rule set store. Mutations run against one exclusively borrowed
/// state, which is what makes them transactions for the stores wrapping it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct StoreState {
    #[serde(default)]
    versions: Vec<RuleSetVersion>,
    /// Run id to the run's rule set column; an explicit `null` means the built-in default.
    #[serde(default)]
    runs: BTreeMap<RunId, Option<VersionId>>,
}

impl StoreState {
    pub(crate) fn insert_draft(
        &mut self,
        draft: DraftVersion,
    ) -> Result<RuleSetVersion, RepositoryError> {
        if self.position(&draft.version_id).is_some() {
            return Err(RepositoryError::Conflict);
        }

        let next_number = self
            .versions
            .iter()
            .filter(|version| version.rule_set_id == draft.rule_set_id)
            .map(|version| version.version_number)
            .max()
            .unwrap_or(0)
            + 1;

        let version = draft.into_version(next_number);
        self.versions.push(version.clone());
        Ok(version)
    }

    pub(crate) fn fetch(&self, id: &VersionId) -> Option<RuleSetVersion> {
        self.position(id).map(|index| self.versions[index].clone())
    }

    pub(crate) fn active(&self, rule_set_id: &RuleSetId) -> Option<RuleSetVersion> {
        self.versions
            .iter()
            .find(|version| {
                &version.rule_set_id == rule_set_id && version.status == VersionStatus::Active
            })
            .cloned()
    }

    pub(crate) fn list(
        &self,
        rule_set_id: &RuleSetId,
        status: Option<VersionStatus>,
        limit: usize,
        offset: usize,
    ) -> Vec<RuleSetVersion> {
        let mut versions: Vec<&RuleSetVersion> = self
            .versions
            .iter()
            .filter(|version| &version.rule_set_id == rule_set_id)
            .filter(|version| status.map_or(true, |status| version.status == status))
            .collect();
        versions.sort_by(|a, b| b.version_number.cmp(&a.version_number));

        versions
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect()
    }

    pub(crate) fn activate(
        &mut self,
        rule_set_id: &RuleSetId,
        id: &VersionId,
        activation: Activation,
    ) -> Result<ActivationReceipt, RepositoryError> {
        let target = self
            .position(id)
            .filter(|index| &self.versions[*index].rule_set_id == rule_set_id)
            .ok_or(RepositoryError::NotFound)?;

        if self.versions[target].status == VersionStatus::Active {
            return Err(RepositoryError::Conflict);
        }

        let mut archived = Vec::new();
        for version in self
            .versions
            .iter_mut()
            .filter(|version| &version.rule_set_id == rule_set_id)
        {
            if version.status == VersionStatus::Active {
                version.status = VersionStatus::Archived;
                archived.push(version.version_id.clone());
            }
        }

        let version = &mut self.versions[target];
        version.status = VersionStatus::Active;
        version.activated_at = Some(activation.activated_at);
        version.activated_by_id = Some(activation.activated_by_id);

        Ok(ActivationReceipt {
            activated: version.clone(),
            archived,
        })
    }

    pub(crate) fn pin_run(&mut self, run_id: &RunId, version_id: Option<&VersionId>) {
        self.runs.insert(run_id.clone(), version_id.cloned());
    }

    pub(crate) fn run_pin(&self, run_id: &RunId) -> RunPin {
        RunPin::from_column(self.runs.get(run_id).cloned())
    }

    fn position(&self, id: &VersionId) -> Option<usize> {
        self.versions
            .iter()
            .position(|version| &version.version_id == id)
    }
}
