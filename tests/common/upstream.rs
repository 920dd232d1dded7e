//! In-process stand-ins for the README host and the Algolia REST API.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
};
use serde_json::Value;

pub const APPLICATION_ID: &str = "test-app";
pub const API_KEY: &str = "test-key";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexCall {
    pub operation: &'static str,
    pub index: String,
    pub id: String,
}

#[derive(Default)]
pub struct Upstream {
    readmes: Mutex<HashMap<String, String>>,
    documents: Mutex<HashMap<String, Value>>,
    calls: Mutex<Vec<IndexCall>>,
    fail_index: AtomicBool,
    index_delay: Mutex<Option<Duration>>,
}

impl Upstream {
    pub fn set_readme(&self, name: &str, content: &str) {
        self.readmes
            .lock()
            .unwrap()
            .insert(name.to_string(), content.to_string());
    }

    pub fn document(&self, id: &str) -> Option<Value> {
        self.documents.lock().unwrap().get(id).cloned()
    }

    pub fn document_count(&self) -> usize {
        self.documents.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<IndexCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn set_index_failing(&self, failing: bool) {
        self.fail_index.store(failing, Ordering::SeqCst);
    }

    /// Holds the next index write for `delay` before applying it.
    pub fn delay_next_index(&self, delay: Duration) {
        *self.index_delay.lock().unwrap() = Some(delay);
    }

    async fn pause(&self) {
        let delay = self.index_delay.lock().unwrap().take();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

pub fn router(upstream: Arc<Upstream>) -> Router {
    Router::new()
        .route("/readme/{name}", get(readme))
        .route("/1/indexes/{index}/{id}", put(upload))
        .route("/1/indexes/{index}/{id}/partial", post(partial_update))
        .with_state(upstream)
}

async fn readme(
    State(upstream): State<Arc<Upstream>>,
    Path(name): Path<String>,
) -> Result<String, StatusCode> {
    upstream
        .readmes
        .lock()
        .unwrap()
        .get(&name)
        .cloned()
        .ok_or(StatusCode::NOT_FOUND)
}

fn check(upstream: &Upstream, headers: &HeaderMap) -> Result<(), StatusCode> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    if header("x-algolia-application-id") != Some(APPLICATION_ID)
        || header("x-algolia-api-key") != Some(API_KEY)
    {
        return Err(StatusCode::FORBIDDEN);
    }
    if upstream.fail_index.load(Ordering::SeqCst) {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }
    Ok(())
}

fn record(upstream: &Upstream, operation: &'static str, index: String, id: String, body: Value) {
    upstream.calls.lock().unwrap().push(IndexCall {
        operation,
        index,
        id: id.clone(),
    });

    let mut documents = upstream.documents.lock().unwrap();
    let merged = operation == "update"
        && match (documents.get_mut(&id), &body) {
            (Some(Value::Object(existing)), Value::Object(fields)) => {
                existing.extend(fields.clone());
                true
            }
            _ => false,
        };
    if !merged {
        documents.insert(id, body);
    }
}

async fn upload(
    State(upstream): State<Arc<Upstream>>,
    Path((index, id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    upstream.pause().await;
    check(&upstream, &headers)?;
    record(&upstream, "upload", index, id.clone(), body);
    Ok(Json(serde_json::json!({ "objectID": id })))
}

async fn partial_update(
    State(upstream): State<Arc<Upstream>>,
    Path((index, id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    upstream.pause().await;
    check(&upstream, &headers)?;
    record(&upstream, "update", index, id.clone(), body);
    Ok(Json(serde_json::json!({ "objectID": id })))
}
