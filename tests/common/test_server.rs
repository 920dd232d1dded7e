use std::sync::Arc;

use chrono::Utc;
use reqwest::StatusCode;
use serde_json::{Value, json};
use tempfile::TempDir;

use ebpfhub::auth::TokenGenerator;
use ebpfhub::config::ServerConfig;
use ebpfhub::server::{AppState, create_router};
use ebpfhub::store::{SqliteStore, Store};
use ebpfhub::types::Identity;

use super::upstream::{self, API_KEY, APPLICATION_ID, Upstream};

pub struct TestServer {
    pub temp_dir: TempDir,
    pub base_url: String,
    pub upstream_url: String,
    pub store: Arc<SqliteStore>,
    pub state: Arc<AppState>,
    pub upstream: Arc<Upstream>,
    client: reqwest::Client,
}

async fn serve(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    format!("http://{addr}")
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    /// Starts the app against fresh fake upstreams. `configure` runs after the
    /// search settings point at the fake Algolia API.
    pub async fn start_with<F>(configure: F) -> Self
    where
        F: FnOnce(&mut ServerConfig),
    {
        let temp_dir = TempDir::new().expect("create temp dir");

        let upstream = Arc::new(Upstream::default());
        let upstream_url = serve(upstream::router(upstream.clone())).await;

        let mut config = ServerConfig {
            data_dir: temp_dir.path().to_path_buf(),
            ..ServerConfig::default()
        };
        config.search.application_id = Some(APPLICATION_ID.to_string());
        config.search.api_key = Some(API_KEY.to_string());
        config.search.host = Some(upstream_url.clone());
        configure(&mut config);

        let store = Arc::new(SqliteStore::new(config.db_path()).expect("open store"));
        store.initialize().expect("initialize store");

        let state = Arc::new(AppState::new(store.clone(), &config).expect("build state"));
        let base_url = serve(create_router(state.clone())).await;

        Self {
            temp_dir,
            base_url,
            upstream_url,
            store,
            state,
            upstream,
            client: reqwest::Client::new(),
        }
    }

    pub fn issue_token(&self, account: &str) -> String {
        let (raw_token, key) = TokenGenerator::new().generate();
        self.store
            .create_identity(&Identity {
                key,
                belong: account.to_string(),
                created_at: Utc::now(),
                expires_at: None,
            })
            .expect("create identity");
        raw_token
    }

    /// Serves `content` from the fake README host and returns its URL.
    pub fn readme(&self, name: &str, content: &str) -> String {
        self.upstream.set_readme(name, content);
        format!("{}/readme/{}", self.upstream_url, name)
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/repository", self.base_url)
    }

    pub async fn submit(&self, token: Option<&str>, body: &Value) -> (StatusCode, Value) {
        let mut request = self.client.post(self.endpoint()).json(body);
        if let Some(token) = token {
            request = request.header("Authorization", token);
        }
        let resp = request.send().await.expect("submit");
        let status = resp.status();
        (status, resp.json().await.expect("parse submit response"))
    }

    pub async fn read(&self, id: Option<&str>) -> (StatusCode, Value) {
        let mut request = self.client.get(self.endpoint());
        if let Some(id) = id {
            request = request.query(&[("id", id)]);
        }
        let resp = request.send().await.expect("read");
        let status = resp.status();
        (status, resp.json().await.expect("parse read response"))
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

pub fn submission(organization: &str, project: &str, readme: &str) -> Value {
    json!({
        "update": "1690000000000",
        "organization": organization,
        "project": project,
        "version": "0.1.0",
        "readme": readme,
        "type": "tracing",
        "repository": format!("https://github.com/{organization}/{project}"),
        "entry": "main.bpf.c",
        "author": "someone",
        "tags": ["xdp", "network"],
    })
}
