use std::sync::{Arc, Mutex};

use serde_json::json;

use crate::rules::{
    ComparisonOperator, ConditionNode, ConfidenceAction, DefaultSufficiency, Rule, RuleSet,
    SufficiencyLevel,
};
use crate::versioning::domain::{
    Activation, ActivationReceipt, DraftVersion, RuleSetId, RuleSetVersion, RunId, RunPin,
    VersionId, VersionStatus,
};
use crate::versioning::memory::InMemoryRuleSetStore;
use crate::versioning::repository::{
    AuditAction, AuditError, AuditEvent, AuditSink, RepositoryError, RuleSetVersionRepository,
    ScoreRunRepository,
};
use crate::versioning::service::VersionService;

pub(super) const ACTOR: &str = "analyst-7";

pub(super) type MemoryService =
    VersionService<InMemoryRuleSetStore, InMemoryRuleSetStore, MemoryAudit>;

pub(super) fn rule_set_id() -> RuleSetId {
    RuleSetId("review-scoring".to_string())
}

pub(super) fn build_service() -> (MemoryService, InMemoryRuleSetStore, Arc<MemoryAudit>) {
    let store = InMemoryRuleSetStore::new();
    let audit = Arc::new(MemoryAudit::default());
    let service = VersionService::new(
        rule_set_id(),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        audit.clone(),
    );
    (service, store, audit)
}

/// One confidence rule flagging reviews shorter than 20 characters with `weight`.
pub(super) fn custom_rules(version: &str, weight: f64) -> RuleSet {
    RuleSet {
        version: version.to_string(),
        confidence_rules: vec![Rule::new(
            "short",
            "Short review",
            10,
            ConditionNode::leaf("contentLength", ComparisonOperator::Lt, json!(20)),
            ConfidenceAction {
                weight,
                reason_code: "SHORT".to_string(),
                reason_message: None,
            },
        )],
        sufficiency_rules: Vec::new(),
        default_confidence_weight: 0.8,
        default_sufficiency: DefaultSufficiency {
            level: SufficiencyLevel::Medium,
            confidence: 0.6,
        },
    }
}

pub(super) fn run(id: &str) -> RunId {
    RunId(id.to_string())
}

#[derive(Default)]
pub(super) struct MemoryAudit {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAudit {
    pub(super) fn actions(&self) -> Vec<AuditAction> {
        self.events
            .lock()
            .expect("audit lock")
            .iter()
            .map(|event| event.action)
            .collect()
    }

    pub(super) fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().expect("audit lock").clone()
    }
}

impl AuditSink for MemoryAudit {
    fn record(&self, event: AuditEvent) -> Result<(), AuditError> {
        self.events.lock().expect("audit lock").push(event);
        Ok(())
    }
}

pub(super) struct FailingAudit;

impl AuditSink for FailingAudit {
    fn record(&self, _event: AuditEvent) -> Result<(), AuditError> {
        Err(AuditError::Transport("audit table offline".to_string()))
    }
}

pub(super) struct UnavailableRepository;

impl RuleSetVersionRepository for UnavailableRepository {
    fn insert_draft(&self, _draft: DraftVersion) -> Result<RuleSetVersion, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &VersionId) -> Result<Option<RuleSetVersion>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn active(&self, _rule_set_id: &RuleSetId) -> Result<Option<RuleSetVersion>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(
        &self,
        _rule_set_id: &RuleSetId,
        _status: Option<VersionStatus>,
        _limit: usize,
        _offset: usize,
    ) -> Result<Vec<RuleSetVersion>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn activate(
        &self,
        _rule_set_id: &RuleSetId,
        _id: &VersionId,
        _activation: Activation,
    ) -> Result<ActivationReceipt, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

impl ScoreRunRepository for UnavailableRepository {
    fn pin_rule_set_version(
        &self,
        _run_id: &RunId,
        _version_id: Option<&VersionId>,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn rule_set_pin(&self, _run_id: &RunId) -> Result<RunPin, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}
