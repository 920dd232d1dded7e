//! # ebpfhub
//!
//! Catalog server for eBPF repositories. Accepts authenticated repository
//! submissions, keeps the SQLite catalog and the Algolia search index in
//! step, and serves the catalog to anonymous readers.
//!
//! ## Library Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ebpfhub::config::ServerConfig;
//! use ebpfhub::server::{AppState, create_router};
//! use ebpfhub::store::{SqliteStore, Store};
//!
//! let config = ServerConfig::load(None)?;
//! let store = SqliteStore::new(config.db_path())?;
//! store.initialize()?;
//!
//! let state = Arc::new(AppState::new(Arc::new(store), &config)?);
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Builds the `ebpfhub` binary. Disable with `default-features = false`.

pub mod auth;
pub mod config;
pub mod error;
pub mod reconcile;
pub mod search;
pub mod server;
pub mod store;
pub mod types;
