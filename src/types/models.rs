use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An authenticated identity resolved from a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    /// SHA-256 hex digest of the raw token.
    #[serde(skip)]
    pub key: String,
    /// Owning account id.
    pub belong: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Identity {
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at < now)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: String,
    pub account: String,
    pub created: DateTime<Utc>,
    pub update: DateTime<Utc>,
    pub organization: String,
    pub project: String,
    pub version: String,
    /// URL of the raw README.
    pub readme: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Canonical source URL.
    pub repository: String,
    pub entry: String,
    pub author: String,
    pub tags: Vec<String>,
}

/// Denormalized projection of a [`Repository`] stored in the search index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchDocument {
    pub id: String,
    pub url: String,
    pub organization: String,
    pub project: String,
    pub readme: String,
    pub content: String,
    pub author: String,
    pub tags: Vec<String>,
}

impl SearchDocument {
    #[must_use]
    pub fn from_repository(repo: &Repository, content: String) -> Self {
        Self {
            id: repo.id.clone(),
            url: repo.repository.clone(),
            organization: repo.organization.clone(),
            project: repo.project.clone(),
            readme: repo.readme.clone(),
            content,
            author: repo.author.clone(),
            tags: repo.tags.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchOperation {
    Upload,
    Update,
}

impl SearchOperation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            SearchOperation::Upload => "upload",
            SearchOperation::Update => "update",
        }
    }
}

impl fmt::Display for SearchOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchOperation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upload" => Ok(SearchOperation::Upload),
            "update" => Ok(SearchOperation::Update),
            other => Err(format!("unknown search operation: {other}")),
        }
    }
}

/// A search index write that failed after the repository store accepted it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncTask {
    pub id: i64,
    pub repository_id: String,
    pub operation: SearchOperation,
    pub document: SearchDocument,
    /// `update` of the stored record the document was built from.
    pub revision: DateTime<Utc>,
    pub attempts: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
}
