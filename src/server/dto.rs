use serde::{Deserialize, Serialize};

use crate::reconcile::Submission;
use crate::types::Repository;

/// Body of a repository submission. A client-supplied `update` timestamp is
/// accepted and ignored; the server sets its own.
#[derive(Debug, Deserialize)]
pub struct SubmitRepositoryRequest {
    pub organization: String,
    pub project: String,
    pub version: String,
    pub readme: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub repository: String,
    pub entry: String,
    pub author: String,
    pub tags: Vec<String>,
}

impl From<SubmitRepositoryRequest> for Submission {
    fn from(req: SubmitRepositoryRequest) -> Self {
        Submission {
            organization: req.organization,
            project: req.project,
            version: req.version,
            readme: req.readme,
            kind: req.kind,
            repository: req.repository,
            entry: req.entry,
            author: req.author,
            tags: req.tags,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ReadRepositoryParams {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RepositoryList {
    pub repository: Vec<Repository>,
}
