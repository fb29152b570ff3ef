use chrono::Utc;

use super::common::*;
use crate::rules::default_rule_set;
use crate::versioning::domain::{
    Activation, DraftVersion, RunPin, VersionId, VersionStatus,
};
use crate::versioning::memory::InMemoryRuleSetStore;
use crate::versioning::repository::{
    RepositoryError, RuleSetVersionRepository, ScoreRunRepository,
};

fn draft(id: &str) -> DraftVersion {
    DraftVersion {
        version_id: VersionId(id.to_string()),
        rule_set_id: rule_set_id(),
        name: None,
        description: None,
        rules: default_rule_set(),
        created_by_id: ACTOR.to_string(),
        created_at: Utc::now(),
    }
}

fn activation() -> Activation {
    Activation {
        activated_by_id: ACTOR.to_string(),
        activated_at: Utc::now(),
    }
}

#[test]
fn duplicate_version_id_conflicts() {
    let store = InMemoryRuleSetStore::new();
    store.insert_draft(draft("v-1")).expect("insert");

    assert_eq!(
        store.insert_draft(draft("v-1")),
        Err(RepositoryError::Conflict)
    );
}

#[test]
fn activation_receipt_lists_archived_versions() {
    let store = InMemoryRuleSetStore::new();
    store.insert_draft(draft("v-1")).expect("v-1");
    store.insert_draft(draft("v-2")).expect("v-2");

    let first = store
        .activate(&rule_set_id(), &VersionId("v-1".to_string()), activation())
        .expect("activate v-1");
    assert!(first.archived.is_empty());

    let second = store
        .activate(&rule_set_id(), &VersionId("v-2".to_string()), activation())
        .expect("activate v-2");
    assert_eq!(second.archived, vec![VersionId("v-1".to_string())]);
    assert_eq!(second.activated.status, VersionStatus::Active);

    let archived = store
        .fetch(&VersionId("v-1".to_string()))
        .expect("fetch")
        .expect("present");
    assert_eq!(archived.status, VersionStatus::Archived);
    assert!(archived.activated_at.is_some());
}

#[test]
fn run_column_distinguishes_unset_from_built_in_default() {
    let store = InMemoryRuleSetStore::new();

    assert_eq!(store.rule_set_pin(&run("run-1")).expect("unset"), RunPin::Unset);

    store.pin_rule_set_version(&run("run-1"), None).expect("pin");
    assert_eq!(
        store.rule_set_pin(&run("run-1")).expect("default"),
        RunPin::BuiltInDefault
    );
}

#[test]
fn run_pin_serializes_with_kind_tag() {
    let pinned = serde_json::to_value(RunPin::Version(VersionId("v-9".to_string())))
        .expect("serialize");
    assert_eq!(
        pinned,
        serde_json::json!({ "kind": "VERSION", "versionId": "v-9" })
    );
    let default = serde_json::to_value(RunPin::BuiltInDefault).expect("serialize");
    assert_eq!(default, serde_json::json!({ "kind": "BUILT_IN_DEFAULT" }));
}
