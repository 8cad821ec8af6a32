use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ValueSet;

/// Notebook as stored by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotebookRecord {
    pub id: String,
    pub project: String,
    pub name: String,
    pub owner: String,
    pub created_at: DateTime<Utc>,
}

/// Snapshot of a notebook's content at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: String,
    pub notebook_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub path: String,
    #[serde(default, skip_serializing_if = "ValueSet::is_empty")]
    pub tags: ValueSet,
    pub created_at: DateTime<Utc>,
}

/// Options for uploading a new checkpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCheckpoint {
    /// When `None` the service names the checkpoint after its creation time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "ValueSet::is_empty")]
    pub tags: ValueSet,
}

impl NewCheckpoint {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_tags(mut self, tags: impl Into<ValueSet>) -> Self {
        self.tags = tags.into();
        self
    }
}
