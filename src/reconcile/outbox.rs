//! Retries search index writes that failed after the repository store
//! accepted them.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::search::{SearchClient, fetch_readme, index_content};
use crate::server::AppState;
use crate::store::Store;
use crate::types::{Repository, SearchDocument, SyncTask};

const DRAIN_BATCH: i32 = 100;
const MAX_REFRESHES: usize = 3;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    pub delivered: usize,
    pub failed: usize,
}

enum Delivery {
    Delivered,
    /// An inline write removed or replaced the task.
    Superseded,
}

/// Delivers pending sync tasks in queue order. Delivered tasks are removed;
/// failed ones keep their place with an incremented attempt count.
///
/// The index ends up matching the stored record even when an inline write
/// for the same repository lands while a task is in flight.
pub async fn drain(
    store: &dyn Store,
    http: &Client,
    search: &SearchClient,
) -> Result<DrainReport> {
    let tasks = store.list_sync_tasks(DRAIN_BATCH)?;
    let mut report = DrainReport::default();

    for task in tasks {
        match deliver(store, http, search, &task).await {
            Ok(Delivery::Delivered) => {
                store.complete_sync_task(task.id)?;
                report.delivered += 1;
            }
            Ok(Delivery::Superseded) => {
                debug!(repository = %task.repository_id, "sync task superseded");
            }
            Err(e) => {
                warn!(
                    repository = %task.repository_id,
                    attempts = task.attempts + 1,
                    "search sync retry failed: {e}"
                );
                if store.fail_sync_task(task.id, &e.to_string())? {
                    report.failed += 1;
                }
            }
        }
    }

    Ok(report)
}

async fn deliver(
    store: &dyn Store,
    http: &Client,
    search: &SearchClient,
    task: &SyncTask,
) -> Result<Delivery> {
    if store.get_sync_task(task.id)?.is_none() {
        return Ok(Delivery::Superseded);
    }
    let Some(mut current) = store.get_repository(&task.repository_id)? else {
        return Ok(Delivery::Superseded);
    };

    if current.update == task.revision {
        search.apply(task.operation, &task.document).await?;
    } else {
        upload_record(http, search, &current).await?;
    }

    // A newer store write may have reached the index while ours was in flight.
    for _ in 0..MAX_REFRESHES {
        match store.get_repository(&task.repository_id)? {
            Some(latest) if latest.update != current.update => {
                upload_record(http, search, &latest).await?;
                current = latest;
            }
            _ => return Ok(Delivery::Delivered),
        }
    }

    Err(Error::Search(format!(
        "repository {} kept changing during sync",
        task.repository_id
    )))
}

/// Rebuilds the search document from the stored record.
async fn upload_record(http: &Client, search: &SearchClient, repo: &Repository) -> Result<()> {
    let raw = fetch_readme(http, &repo.readme).await?;
    let document = SearchDocument::from_repository(repo, index_content(&raw));
    search.upload(&document).await
}

/// Drains the outbox once using the state's search configuration.
pub async fn drain_state(state: &AppState) -> Result<DrainReport> {
    let search = SearchClient::from_config(state.http.clone(), &state.search)?;
    drain(state.store.as_ref(), &state.http, &search).await
}

/// Periodically drains the outbox until the runtime shuts down.
pub fn spawn_sync_worker(state: Arc<AppState>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            match drain_state(&state).await {
                Ok(report) if report == DrainReport::default() => {}
                Ok(report) => info!(
                    delivered = report.delivered,
                    failed = report.failed,
                    "search outbox drained"
                ),
                Err(Error::Config(msg)) => debug!("search sync skipped: {msg}"),
                Err(e) => warn!("search sync failed: {e}"),
            }
        }
    })
}
