use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{Router, routing::get};

use super::repository::{method_not_match, read_repositories, submit_repository};
use crate::config::{CrossAccountPolicy, SearchConfig, ServerConfig};
use crate::error::{Error, Result};
use crate::reconcile::Reconciler;
use crate::store::Store;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

pub struct AppState {
    pub store: Arc<dyn Store>,
    /// Shared client for README fetches and search index calls.
    pub http: reqwest::Client,
    pub search: SearchConfig,
    pub cross_account_policy: CrossAccountPolicy,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: &ServerConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(concat!("ebpfhub/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("failed to build http client: {e}")))?;

        Ok(Self {
            store,
            http,
            search: config.search.clone(),
            cross_account_policy: config.cross_account_policy,
        })
    }

    #[must_use]
    pub fn reconciler(&self) -> Reconciler<'_> {
        Reconciler::new(
            self.store.as_ref(),
            &self.http,
            &self.search,
            self.cross_account_policy,
        )
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/repository",
            get(read_repositories)
                .post(submit_repository)
                .fallback(method_not_match),
        )
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
