mod helpers;
mod middleware;
mod token;

pub use helpers::resolve_identity;
pub use middleware::{AuthError, INVALID_TOKEN_MESSAGE, RequireAccount};
pub use token::{TokenGenerator, token_key};
