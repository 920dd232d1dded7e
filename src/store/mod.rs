mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Identity operations (credential store)
    fn create_identity(&self, identity: &Identity) -> Result<()>;
    fn get_identity(&self, key: &str) -> Result<Option<Identity>>;

    // Repository operations
    fn create_repository(&self, repo: &Repository) -> Result<()>;
    fn get_repository(&self, id: &str) -> Result<Option<Repository>>;
    fn list_recent_repositories(&self, limit: i32) -> Result<Vec<Repository>>;
    fn list_repositories_by_project(
        &self,
        organization: &str,
        project: &str,
    ) -> Result<Vec<Repository>>;
    /// Replaces every column of the record with the given id.
    fn update_repository(&self, repo: &Repository) -> Result<()>;

    // Search outbox operations
    /// Queues a search write, replacing any pending one for the same repository.
    fn enqueue_sync_task(
        &self,
        operation: SearchOperation,
        document: &SearchDocument,
        revision: DateTime<Utc>,
        error: &str,
    ) -> Result<()>;
    fn get_sync_task(&self, id: i64) -> Result<Option<SyncTask>>;
    fn list_sync_tasks(&self, limit: i32) -> Result<Vec<SyncTask>>;
    fn complete_sync_task(&self, id: i64) -> Result<bool>;
    /// Records a failed delivery. Returns false when the task no longer exists.
    fn fail_sync_task(&self, id: i64, error: &str) -> Result<bool>;
    fn discard_sync_tasks(&self, repository_id: &str) -> Result<usize>;
}
