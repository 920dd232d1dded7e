use std::fmt;

use serde::Deserialize;

use super::server::{API_KEY_ENV, APPLICATION_ID_ENV};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub application_id: Option<String>,
    pub api_key: Option<String>,
    pub index_name: String,
    /// Overrides `https://{application_id}.algolia.net`.
    pub host: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            application_id: None,
            api_key: None,
            index_name: "repository".to_string(),
            host: None,
        }
    }
}

#[derive(Clone)]
pub struct SearchCredentials {
    pub application_id: String,
    pub api_key: String,
}

impl fmt::Debug for SearchCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchCredentials")
            .field("application_id", &self.application_id)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl SearchConfig {
    /// Both secrets are required before any search or store write is attempted.
    pub fn credentials(&self) -> Result<SearchCredentials> {
        let application_id = self
            .application_id
            .clone()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::Config(format!("{APPLICATION_ID_ENV} is not set")))?;
        let api_key = self
            .api_key
            .clone()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::Config(format!("{API_KEY_ENV} is not set")))?;

        Ok(SearchCredentials {
            application_id,
            api_key,
        })
    }

    #[must_use]
    pub fn base_url(&self, credentials: &SearchCredentials) -> String {
        match &self.host {
            Some(host) => host.trim_end_matches('/').to_string(),
            None => format!("https://{}.algolia.net", credentials.application_id),
        }
    }
}
