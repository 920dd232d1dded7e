use reqwest::{Client, RequestBuilder};
use tracing::debug;

use crate::config::{SearchConfig, SearchCredentials};
use crate::error::{Error, Result};
use crate::types::{SearchDocument, SearchOperation};

const APPLICATION_ID_HEADER: &str = "X-Algolia-Application-Id";
const API_KEY_HEADER: &str = "X-Algolia-API-Key";

/// Client for one Algolia index, keyed by repository id.
pub struct SearchClient {
    client: Client,
    base_url: String,
    index_name: String,
    credentials: SearchCredentials,
}

impl SearchClient {
    #[must_use]
    pub fn new(client: Client, config: &SearchConfig, credentials: SearchCredentials) -> Self {
        Self {
            client,
            base_url: config.base_url(&credentials),
            index_name: config.index_name.clone(),
            credentials,
        }
    }

    /// Builds a client from config, failing when either secret is missing.
    pub fn from_config(client: Client, config: &SearchConfig) -> Result<Self> {
        let credentials = config.credentials()?;
        Ok(Self::new(client, config, credentials))
    }

    fn object_url(&self, id: &str) -> String {
        format!("{}/1/indexes/{}/{}", self.base_url, self.index_name, id)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(APPLICATION_ID_HEADER, self.credentials.application_id.as_str())
            .header(API_KEY_HEADER, self.credentials.api_key.as_str())
    }

    /// Adds or replaces the whole document.
    pub async fn upload(&self, document: &SearchDocument) -> Result<()> {
        let url = self.object_url(&document.id);
        debug!(id = %document.id, url = %url, "uploading search document");

        let request = self.authorized(self.client.put(&url)).json(document);
        send(request).await
    }

    /// Overwrites the document's attributes, creating it if absent.
    pub async fn update(&self, document: &SearchDocument) -> Result<()> {
        let url = format!("{}/partial", self.object_url(&document.id));
        debug!(id = %document.id, url = %url, "updating search document");

        let request = self.authorized(self.client.post(&url)).json(document);
        send(request).await
    }

    pub async fn apply(&self, operation: SearchOperation, document: &SearchDocument) -> Result<()> {
        match operation {
            SearchOperation::Upload => self.upload(document).await,
            SearchOperation::Update => self.update(document).await,
        }
    }
}

async fn send(request: RequestBuilder) -> Result<()> {
    let response = request
        .send()
        .await
        .map_err(|e| Error::Search(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Search(format!("{status}: {body}")));
    }

    Ok(())
}
