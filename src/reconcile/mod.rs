//! Create-or-update of submitted repositories, kept in step across the
//! repository store and the search index.
//!
//! A submission runs in a fixed order: search credentials are checked, the
//! store is read for records with the same organization/project, the README
//! is fetched, the store is written, and finally the search index is written.
//! A failed index write after a successful store write is queued in the
//! search outbox (see [`outbox`]) and reported as [`Error::PartialWrite`].

pub mod outbox;

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{CrossAccountPolicy, SearchConfig};
use crate::error::{Error, Result};
use crate::search::{SearchClient, fetch_readme, index_content};
use crate::store::Store;
use crate::types::{Repository, SearchDocument, SearchOperation};

/// Descriptive fields of a submitted repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub organization: String,
    pub project: String,
    pub version: String,
    pub readme: String,
    pub kind: String,
    pub repository: String,
    pub entry: String,
    pub author: String,
    pub tags: Vec<String>,
}

impl Submission {
    fn create(self, account: &str, now: DateTime<Utc>) -> Repository {
        Repository {
            id: Uuid::new_v4().to_string(),
            account: account.to_string(),
            created: now,
            update: now,
            organization: self.organization,
            project: self.project,
            version: self.version,
            readme: self.readme,
            kind: self.kind,
            repository: self.repository,
            entry: self.entry,
            author: self.author,
            tags: self.tags,
        }
    }

    fn overwrite(self, current: &Repository, now: DateTime<Utc>) -> Repository {
        // `update` must move forward even if the clock did not.
        let update = if now > current.update {
            now
        } else {
            current.update + Duration::nanoseconds(1)
        };

        Repository {
            id: current.id.clone(),
            account: current.account.clone(),
            created: current.created,
            update,
            organization: self.organization,
            project: self.project,
            version: self.version,
            readme: self.readme,
            kind: self.kind,
            repository: self.repository,
            entry: self.entry,
            author: self.author,
            tags: self.tags,
        }
    }
}

/// Decision taken for a submission given the records that share its
/// organization/project pair.
#[derive(Debug, PartialEq, Eq)]
pub enum Plan<'a> {
    /// The caller already owns a record for the pair.
    Conflict,
    Create,
    Update(&'a Repository),
}

#[must_use]
pub fn plan<'a>(
    existing: &'a [Repository],
    account: &str,
    policy: CrossAccountPolicy,
) -> Plan<'a> {
    if existing.iter().any(|repo| repo.account == account) {
        return Plan::Conflict;
    }

    match (existing.first(), policy) {
        (None, _) => Plan::Create,
        (Some(_), CrossAccountPolicy::Independent) => Plan::Create,
        (Some(first), CrossAccountPolicy::Overwrite) => Plan::Update(first),
    }
}

pub struct Reconciler<'a> {
    store: &'a dyn Store,
    http: &'a Client,
    search: &'a SearchConfig,
    policy: CrossAccountPolicy,
}

impl<'a> Reconciler<'a> {
    #[must_use]
    pub fn new(
        store: &'a dyn Store,
        http: &'a Client,
        search: &'a SearchConfig,
        policy: CrossAccountPolicy,
    ) -> Self {
        Self {
            store,
            http,
            search,
            policy,
        }
    }

    /// Returns the record as persisted.
    pub async fn submit(&self, account: &str, submission: Submission) -> Result<Repository> {
        let search = SearchClient::from_config(self.http.clone(), self.search)?;

        let existing = self
            .store
            .list_repositories_by_project(&submission.organization, &submission.project)?;

        let current = match plan(&existing, account, self.policy) {
            Plan::Conflict => return Err(Error::AlreadyExists),
            Plan::Create => None,
            Plan::Update(current) => Some(current),
        };

        let raw = fetch_readme(self.http, &submission.readme).await?;
        let content = index_content(&raw);

        let now = Utc::now();
        let (repository, operation) = match current {
            Some(current) => {
                let repo = submission.overwrite(current, now);
                self.store.update_repository(&repo)?;
                info!(
                    id = %repo.id,
                    account = %account,
                    "updated repository {}/{}",
                    repo.organization,
                    repo.project
                );
                (repo, SearchOperation::Update)
            }
            None => {
                let repo = submission.create(account, now);
                self.store.create_repository(&repo)?;
                info!(
                    id = %repo.id,
                    account = %account,
                    "created repository {}/{}",
                    repo.organization,
                    repo.project
                );
                (repo, SearchOperation::Upload)
            }
        };

        let document = SearchDocument::from_repository(&repository, content);
        self.index(&search, operation, &document, repository.update).await?;

        Ok(repository)
    }

    async fn index(
        &self,
        search: &SearchClient,
        operation: SearchOperation,
        document: &SearchDocument,
        revision: DateTime<Utc>,
    ) -> Result<()> {
        match search.apply(operation, document).await {
            Ok(()) => {
                if let Err(e) = self.store.discard_sync_tasks(&document.id) {
                    warn!("Failed to discard stale sync tasks for {}: {e}", document.id);
                }
                Ok(())
            }
            Err(e) => {
                let reason = e.to_string();
                warn!(
                    id = %document.id,
                    operation = %operation,
                    "search index write failed, queueing retry: {reason}"
                );
                self.store.enqueue_sync_task(operation, document, revision, &reason)?;
                Err(Error::PartialWrite {
                    repository_id: document.id.clone(),
                    reason,
                })
            }
        }
    }
}
