pub mod dto;
mod repository;
pub mod response;
mod router;
pub mod validation;

pub use repository::RECENT_LIMIT;
pub use router::{AppState, create_router};
