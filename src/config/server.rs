use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::search::SearchConfig;
use crate::error::{Error, Result};

pub const APPLICATION_ID_ENV: &str = "ALGOLIA_APPLICATION_ID";
pub const API_KEY_ENV: &str = "ALGOLIA_API_KEY";

/// What a submission does when only other accounts hold the same
/// organization/project pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrossAccountPolicy {
    /// Create a separate record owned by the caller.
    #[default]
    Independent,
    /// Overwrite the first matching record, keeping its id, account and creation time.
    Overwrite,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    /// Seconds between search outbox drains. Zero disables the worker.
    pub sync_interval_secs: u64,
    pub cross_account_policy: CrossAccountPolicy,
    pub search: SearchConfig,
}

impl ServerConfig {
    /// Loads the config file if given, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("failed to parse config: {e}")))
    }

    /// Search secrets come from the process environment when present there.
    /// Empty values count as unset.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(application_id) = non_empty(APPLICATION_ID_ENV) {
            self.search.application_id = Some(application_id);
        }
        if let Some(api_key) = non_empty(API_KEY_ENV) {
            self.search.api_key = Some(api_key);
        }
    }

    pub fn socket_addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("ebpfhub.db")
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
            sync_interval_secs: 30,
            cross_account_policy: CrossAccountPolicy::default(),
            search: SearchConfig::default(),
        }
    }
}
