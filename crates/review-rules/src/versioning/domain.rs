use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::rules::RuleSet;

/// Identifier of one persisted rule set version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VersionId(pub String);

impl VersionId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of the underlying rule set a chain of versions belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RuleSetId(pub String);

impl fmt::Display for RuleSetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of an external score computation run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RunId(pub String);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle of a version: DRAFT → ACTIVE → ARCHIVED, and ARCHIVED → ACTIVE on reactivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VersionStatus {
    Draft,
    Active,
    Archived,
}

impl VersionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            VersionStatus::Draft => "DRAFT",
            VersionStatus::Active => "ACTIVE",
            VersionStatus::Archived => "ARCHIVED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "DRAFT" => Some(Self::Draft),
            "ACTIVE" => Some(Self::Active),
            "ARCHIVED" => Some(Self::Archived),
            _ => None,
        }
    }
}

impl fmt::Display for VersionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Persisted, immutable rule set snapshot. Only the status and activation metadata change
/// after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSetVersion {
    pub version_id: VersionId,
    pub rule_set_id: RuleSetId,
    pub version_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub rules: RuleSet,
    pub status: VersionStatus,
    pub created_by_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activated_by_id: Option<String>,
}

impl RuleSetVersion {
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("v{} ({name})", self.version_number),
            None => format!("v{}", self.version_number),
        }
    }
}

/// Version payload handed to a repository; the repository assigns the version number.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftVersion {
    pub version_id: VersionId,
    pub rule_set_id: RuleSetId,
    pub name: Option<String>,
    pub description: Option<String>,
    pub rules: RuleSet,
    pub created_by_id: String,
    pub created_at: DateTime<Utc>,
}

impl DraftVersion {
    pub(crate) fn into_version(self, version_number: u32) -> RuleSetVersion {
        RuleSetVersion {
            version_id: self.version_id,
            rule_set_id: self.rule_set_id,
            version_number,
            name: self.name,
            description: self.description,
            rules: self.rules,
            status: VersionStatus::Draft,
            created_by_id: self.created_by_id,
            created_at: self.created_at,
            activated_at: None,
            activated_by_id: None,
        }
    }
}

/// Who activated a version and when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    pub activated_by_id: String,
    pub activated_at: DateTime<Utc>,
}

/// Result of an archive-then-activate transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationReceipt {
    pub activated: RuleSetVersion,
    pub archived: Vec<VersionId>,
}

/// State of a run record's rule set column.
///
/// `BuiltInDefault` is the explicit null written when a run used the built-in rules; `Unset`
/// means the column was never written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "versionId", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunPin {
    Unset,
    BuiltInDefault,
    Version(VersionId),
}

impl RunPin {
    /// Maps a stored column, where an absent row/column is `None` and an explicit null is
    /// `Some(None)`.
    pub fn from_column(column: Option<Option<VersionId>>) -> Self {
        match column {
            None => RunPin::Unset,
            Some(None) => RunPin::BuiltInDefault,
            Some(Some(version_id)) => RunPin::Version(version_id),
        }
    }
}
