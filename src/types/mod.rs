mod models;

pub use models::{Identity, Repository, SearchDocument, SearchOperation, SyncTask};
