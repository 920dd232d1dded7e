use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("not found")]
    NotFound,

    #[error("already exists")]
    AlreadyExists,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid token")]
    InvalidToken,

    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("search index error: {0}")]
    Search(String),

    /// The repository store accepted the write but the search index did not.
    /// A sync task has been queued for the repository.
    #[error("search index out of sync for repository {repository_id}: {reason}")]
    PartialWrite {
        repository_id: String,
        reason: String,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
