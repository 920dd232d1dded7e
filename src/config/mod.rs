mod search;
mod server;

pub use search::{SearchConfig, SearchCredentials};
pub use server::{API_KEY_ENV, APPLICATION_ID_ENV, CrossAccountPolicy, ServerConfig};
